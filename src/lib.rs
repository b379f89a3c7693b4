// src/lib.rs - Main library file for the Cuckoo Cycle miner
// Tree location: ./src/lib.rs

//! cuckoo-miner - Multithreaded Cuckoo Cycle proof-of-work miner
//!
//! Finds fixed-length cycles in the pseudorandom bipartite graph that a
//! header keys through SipHash-2-4. Two search variants are available: a
//! plain streaming search over every edge, and a search preceded by rounds
//! of lock-step edge trimming across all worker threads.
//!
//! # Version History
//! - 0.1.0: Plain and trimming cycle search on a shared worker pool
//!
//! ```no_run
//! use cuckoo_miner::{CuckooMiner, MinerConfig};
//!
//! let miner: CuckooMiner = CuckooMiner::new(MinerConfig::default())?;
//! let outcome = miner.mine_header(b"block header")?;
//! for solution in &outcome.solutions {
//!     println!("{}", solution);
//! }
//! # Ok::<(), cuckoo_miner::CuckooError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod algorithms;
/// Configuration module for miner settings
pub mod config;
/// Mining attempt orchestration
pub mod miner;
/// Worker threads and phase barriers
pub mod pool;

// Re-export main types for convenience
pub use algorithms::{
    verify, EdgeOracle, SipOracle, Solution, SolverError, Variant, VerifyError, PROOF_SIZE,
};
pub use config::MinerConfig;
pub use miner::{CuckooMiner, MiningOutcome, SearchStats};

use hex::FromHexError;
use thiserror::Error;

/// Main error type for the miner
#[derive(Error, Debug)]
pub enum CuckooError {
    /// Mining attempt failures
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// Proof verification failures
    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO operation errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Hex decode errors
    #[error("Hex decode error: {0}")]
    Hex(#[from] FromHexError),
}

/// Result type alias for miner operations
pub type Result<T> = std::result::Result<T, CuckooError>;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Application description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize logging; the filter comes from `RUST_LOG`
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .map_err(|e| CuckooError::Config(format!("Failed to initialize logging: {}", e)))?;

    tracing::info!("{} v{} - {}", NAME, VERSION, DESCRIPTION);
    Ok(())
}
