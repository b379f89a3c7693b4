// src/pool/barrier.rs - Generation-counted barrier that can be called off
// Tree location: ./src/pool/barrier.rs

//! Abortable barrier
//!
//! `std::sync::Barrier` cannot be interrupted, so a worker that fails between
//! two rendezvous points would leave its peers blocked forever. This barrier
//! counts arrivals per generation and lets any thread abort it, releasing all
//! current and future waiters with [`SolverError::Aborted`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::algorithms::SolverError;

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
}

/// Reusable rendezvous point for a fixed number of parties
#[derive(Debug)]
pub struct AbortableBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
    aborted: AtomicBool,
}

impl AbortableBarrier {
    /// Create a barrier for `parties` threads
    pub fn new(parties: usize) -> Self {
        Self {
            parties: parties.max(1),
            state: Mutex::new(BarrierState::default()),
            released: Condvar::new(),
            aborted: AtomicBool::new(false),
        }
    }

    /// Number of threads that must arrive before any is released
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Block until every party has arrived, or the barrier is aborted
    pub fn wait(&self) -> Result<(), SolverError> {
        if self.is_aborted() {
            return Err(SolverError::Aborted);
        }

        let mut state = self.lock();
        let generation = state.generation;
        state.arrived += 1;

        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.released.notify_all();
            return Ok(());
        }

        while state.generation == generation && !self.is_aborted() {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.generation == generation {
            Err(SolverError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Release every waiter with an error; later waits fail immediately
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        // Taking the lock orders the flag against waiters about to sleep
        let _state = self.lock();
        self.released.notify_all();
    }

    /// Whether [`abort`](Self::abort) has been called
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
