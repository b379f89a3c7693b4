// src/pool/coordinator.rs - Shared abort signal and phase barrier for one attempt
// Tree location: ./src/pool/coordinator.rs

//! Attempt coordinator
//!
//! Holds what every worker of an attempt shares besides the graph data: the
//! phase barrier, the abort signal and the first failure recorded.

use std::sync::{Mutex, PoisonError};

use super::barrier::AbortableBarrier;
use crate::algorithms::SolverError;

/// Ordinal of the worker that does the serial work between barriers
pub const LEADER: usize = 0;

/// Barrier, abort flag and first-failure slot shared by a pool
#[derive(Debug)]
pub struct Coordinator {
    barrier: AbortableBarrier,
    failure: Mutex<Option<SolverError>>,
}

impl Coordinator {
    /// Create a coordinator for `threads` workers
    pub fn new(threads: usize) -> Self {
        Self {
            barrier: AbortableBarrier::new(threads),
            failure: Mutex::new(None),
        }
    }

    /// Number of workers taking part
    pub fn threads(&self) -> usize {
        self.barrier.parties()
    }

    /// Whether `worker` is the leader
    #[inline]
    pub fn is_leader(&self, worker: usize) -> bool {
        worker == LEADER
    }

    /// Wait for every worker to reach this point
    pub fn barrier(&self) -> Result<(), SolverError> {
        self.barrier.wait()
    }

    /// Record `err` (if nothing failed yet) and release every waiting worker
    pub fn abort(&self, err: SolverError) {
        {
            let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
            if failure.is_none() {
                tracing::warn!("Aborting mining attempt: {}", err);
                *failure = Some(err);
            }
        }
        self.barrier.abort();
    }

    /// Whether the attempt has been aborted
    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.barrier.is_aborted()
    }

    /// Take the first recorded failure, if any
    pub fn take_failure(&self) -> Option<SolverError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_failure_wins() {
        let coordinator = Coordinator::new(2);
        assert!(!coordinator.is_aborted());

        coordinator.abort(SolverError::Overloaded { load: 95 });
        coordinator.abort(SolverError::Aborted);

        assert!(coordinator.is_aborted());
        assert!(matches!(coordinator.barrier(), Err(SolverError::Aborted)));
        assert!(matches!(
            coordinator.take_failure(),
            Some(SolverError::Overloaded { load: 95 })
        ));
        assert!(coordinator.take_failure().is_none());
    }

    #[test]
    fn test_leader_is_worker_zero() {
        let coordinator = Coordinator::new(0);
        assert_eq!(coordinator.threads(), 1);
        assert!(coordinator.is_leader(0));
        assert!(!coordinator.is_leader(1));
        assert!(coordinator.barrier().is_ok());
    }
}
