// src/config/settings.rs - Miner settings with JSON loading and validation
// Tree location: ./src/config/settings.rs

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::algorithms::siphash::{MAX_NODE_BITS, MIN_NODE_BITS};
use crate::algorithms::trimmer::default_trim_rounds;
use crate::algorithms::{SolverError, Variant, MAX_PATH_LEN, PRESIP};
use crate::Result;

/// Default node-space shift (2^20 nodes)
pub const DEFAULT_NODE_BITS: u32 = 20;
/// Default easiness as a percentage of the node count
pub const DEFAULT_EASINESS_PCT: u64 = 50;
/// Default solution buffer capacity
pub const DEFAULT_MAX_SOLUTIONS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Parameters of a mining attempt
pub struct MinerConfig {
    /// Total node-space shift: the graph has `2^node_bits` nodes
    pub node_bits: u32,
    /// Number of nonces (edges) searched
    pub easiness: u64,
    /// Worker threads
    pub threads: usize,
    /// Plain search or trimming pre-pass
    pub variant: Variant,
    /// Trimming rounds; derived from `part_bits` when unset
    pub trim_rounds: Option<u32>,
    /// Node space is trimmed in `2^part_bits` parts
    pub part_bits: u32,
    /// Capacity of the solution buffer
    pub max_solutions: usize,
    /// Hop cap for root walks
    pub max_path_len: usize,
    /// Edges derived per cycle-engine batch
    pub presip: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            node_bits: DEFAULT_NODE_BITS,
            easiness: DEFAULT_EASINESS_PCT * (1u64 << DEFAULT_NODE_BITS) / 100,
            threads: 1,
            variant: Variant::Plain,
            trim_rounds: None,
            part_bits: 0,
            max_solutions: DEFAULT_MAX_SOLUTIONS,
            max_path_len: MAX_PATH_LEN,
            presip: PRESIP,
        }
    }
}

impl MinerConfig {
    /// Number of nodes in the graph
    pub fn size(&self) -> u64 {
        1u64 << self.node_bits.min(63)
    }

    /// Easiness as a percentage of the node count
    pub fn easiness_pct(&self) -> u64 {
        100 * self.easiness / self.size()
    }

    /// Set the easiness to `pct` percent of the node count
    pub fn set_easiness_pct(&mut self, pct: u64) {
        self.easiness = pct * self.size() / 100;
    }

    /// Effective number of trimming rounds
    pub fn trim_rounds(&self) -> u32 {
        self.trim_rounds
            .unwrap_or_else(|| default_trim_rounds(self.part_bits))
    }

    /// Check every parameter is in range
    pub fn validate(&self) -> std::result::Result<(), SolverError> {
        let invalid = |msg: String| -> std::result::Result<(), SolverError> {
            Err(SolverError::InvalidParameter(msg))
        };

        if !(MIN_NODE_BITS..=MAX_NODE_BITS).contains(&self.node_bits) {
            return invalid(format!(
                "node_bits must be in {}..={}, got {}",
                MIN_NODE_BITS, MAX_NODE_BITS, self.node_bits
            ));
        }
        if self.easiness == 0 || self.easiness > self.size() {
            return invalid(format!(
                "easiness must be in 1..={}, got {}",
                self.size(),
                self.easiness
            ));
        }
        if self.threads == 0 {
            return invalid("threads must be at least 1".to_string());
        }
        if self.part_bits >= self.node_bits - 1 {
            return invalid(format!(
                "part_bits must be below {}, got {}",
                self.node_bits - 1,
                self.part_bits
            ));
        }
        if self.max_solutions == 0 {
            return invalid("max_solutions must be at least 1".to_string());
        }
        if self.max_path_len < 2 {
            return invalid(format!("max_path_len must be at least 2, got {}", self.max_path_len));
        }
        if self.presip == 0 {
            return invalid("presip must be at least 1".to_string());
        }
        Ok(())
    }

    /// Parse and validate settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Pretty JSON rendering of the settings
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
