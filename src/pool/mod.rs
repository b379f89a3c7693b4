// src/pool/mod.rs - Fixed-size scoped worker pool
// Tree location: ./src/pool/mod.rs

//! Worker pool
//!
//! Runs one job per worker ordinal on named scoped threads and collects the
//! results. Any failure, panic or spawn error trips the [`Coordinator`] so
//! that workers parked at a barrier are released instead of hanging.

pub mod barrier;
pub mod coordinator;

use std::thread;

pub use barrier::AbortableBarrier;
pub use coordinator::{Coordinator, LEADER};

use crate::algorithms::SolverError;

/// Aborts the attempt if the owning worker unwinds
struct PanicGuard<'a> {
    coordinator: &'a Coordinator,
    worker: usize,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.coordinator
                .abort(SolverError::WorkerPanicked { worker: self.worker });
        }
    }
}

/// Fixed number of OS threads for one mining attempt
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    threads: usize,
}

impl WorkerPool {
    /// Create a pool of `threads` workers (at least one)
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    /// Number of workers
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `job(worker)` on every worker and wait for all of them.
    ///
    /// Returns the per-worker results in ordinal order, or the first failure
    /// recorded by `coordinator`.
    pub fn run<T, F>(&self, coordinator: &Coordinator, job: F) -> Result<Vec<T>, SolverError>
    where
        T: Send,
        F: Fn(usize) -> Result<T, SolverError> + Sync,
    {
        let job = &job;
        let results = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.threads);
            for worker in 0..self.threads {
                let spawned = thread::Builder::new()
                    .name(format!("cuckoo-worker-{}", worker))
                    .spawn_scoped(scope, move || {
                        let _guard = PanicGuard {
                            coordinator,
                            worker,
                        };
                        match job(worker) {
                            Ok(value) => Some(value),
                            Err(err) => {
                                coordinator.abort(err);
                                None
                            }
                        }
                    });

                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(err) => {
                        coordinator.abort(SolverError::Spawn(err));
                        break;
                    }
                }
            }

            let mut results = Vec::with_capacity(handles.len());
            for (worker, handle) in handles {
                match handle.join() {
                    Ok(Some(value)) => results.push(value),
                    Ok(None) => {}
                    Err(_) => coordinator.abort(SolverError::WorkerPanicked { worker }),
                }
            }
            results
        });

        match coordinator.take_failure() {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }
}
