//! Miner configuration

/// Settings struct, defaults and JSON loading
pub mod settings;

pub use settings::MinerConfig;
