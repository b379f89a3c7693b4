// src/miner/stats.rs - Per-attempt search statistics
// Tree location: ./src/miner/stats.rs

use std::time::Duration;

use crate::algorithms::solver::WorkerStats;
use crate::algorithms::Variant;

/// What one mining attempt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStats {
    /// Variant that ran
    pub variant: Variant,
    /// Counters of each worker, in ordinal order
    pub workers: Vec<WorkerStats>,
    /// Edges left after trimming (trim variant only)
    pub alive_edges: Option<u64>,
    /// Wall-clock time of the attempt
    pub elapsed: Duration,
}

impl SearchStats {
    /// Edges fed to the cycle engine by all workers
    pub fn edges(&self) -> u64 {
        self.workers.iter().map(|w| w.edges).sum()
    }

    /// Duplicate edges skipped by all workers
    pub fn duplicates(&self) -> u64 {
        self.workers.iter().map(|w| w.duplicates).sum()
    }

    /// Cycles closed by all workers, of any length
    pub fn cycles(&self) -> u64 {
        self.workers.iter().map(|w| w.cycles).sum()
    }

    /// Edges processed per second
    pub fn edge_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.edges() as f64 / secs
        } else {
            0.0
        }
    }
}
