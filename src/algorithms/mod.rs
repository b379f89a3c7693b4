// src/algorithms/mod.rs - Cuckoo Cycle graph search
// Tree location: ./src/algorithms/mod.rs

//! Cuckoo Cycle algorithms
//!
//! Everything needed to turn an edge oracle into verified cycle proofs:
//! the parent-pointer forest, the cycle engine, solution recovery, the
//! optional edge-trimming pre-pass and the proof verifier.

pub mod bitset;
pub mod context;
pub mod forest;
pub mod oracle;
pub mod siphash;
pub mod solution;
pub mod solver;
pub mod trimmer;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use context::MiningContext;
pub use forest::{Forest, PathError, MAX_PATH_LEN};
pub use oracle::{EdgeOracle, Side};
pub use siphash::{SipHasher, SipOracle};
pub use solution::SolutionBuffer;
pub use solver::{CycleFinder, EdgeOutcome, PlainFinder};
pub use trimmer::TrimFinder;
pub use verify::{verify, VerifyError};

/// Required cycle length
pub const PROOF_SIZE: usize = 42;

/// Default number of edges derived ahead of the cycle engine
pub const PRESIP: usize = 1024;

/// How the nonce space is searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Feed every nonce straight into the cycle engine
    #[default]
    Plain,
    /// Trim leaf edges first, then search what survives
    Trim,
}

impl Variant {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Plain => "plain",
            Variant::Trim => "trim",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Variant::Plain),
            "trim" | "trimmed" => Ok(Variant::Trim),
            other => Err(format!("unknown variant '{}' (expected plain or trim)", other)),
        }
    }
}

/// A cycle proof: `N` increasing nonces whose edges form one `N`-cycle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Solution<const N: usize = PROOF_SIZE> {
    /// Proof nonces in increasing order
    pub nonces: [u64; N],
}

impl<const N: usize> Solution<N> {
    /// Wrap a nonce set
    pub fn new(nonces: [u64; N]) -> Self {
        Self { nonces }
    }

    /// Check this proof against `oracle`
    pub fn verify<O: EdgeOracle + ?Sized>(
        &self,
        oracle: &O,
        easiness: u64,
    ) -> Result<(), VerifyError> {
        verify(oracle, &self.nonces, easiness)
    }
}

impl<const N: usize> fmt::Display for Solution<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, nonce) in self.nonces.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:x}", nonce)?;
        }
        Ok(())
    }
}

/// Errors that end a mining attempt
#[derive(Error, Debug)]
pub enum SolverError {
    /// A root walk failed; the forest is unusable
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// Too many edges survived trimming to search safely
    #[error("overloaded: {load}% of nodes still carry edges after trimming")]
    Overloaded {
        /// Final load percentage
        load: u64,
    },

    /// Another worker failed and the attempt was called off
    #[error("mining attempt aborted")]
    Aborted,

    /// A worker thread panicked
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Worker ordinal
        worker: usize,
    },

    /// The OS refused to start a worker thread
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A parameter is out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
