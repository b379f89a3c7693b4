// src/main.rs - Command-line entry point for the Cuckoo Cycle miner
// Tree location: ./src/main.rs

//! cuckoo-miner main entry point
//!
//! Parses command-line arguments, builds the effective [`MinerConfig`] from an
//! optional JSON file plus flag overrides, and either mines the requested
//! headers or prints the configuration.
//!
//! # Version History
//! - 0.1.0: `mine` and `config` subcommands, header nonce ranges

use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use cuckoo_miner::{init, CuckooError, CuckooMiner, MinerConfig, Result, Variant};

#[derive(Parser)]
#[command(name = "cuckoo-miner")]
#[command(version, about = "Multithreaded Cuckoo Cycle proof-of-work miner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one header, or a range of nonce-extended headers, for cycles
    Mine {
        /// Header to mine
        #[arg(long, default_value = "")]
        header: String,
        /// Treat the header as hex
        #[arg(long)]
        hex: bool,
        /// Append this little-endian 32-bit nonce to the header
        #[arg(short, long)]
        nonce: Option<u32>,
        /// Number of consecutive header nonces to mine
        #[arg(short, long, default_value = "1")]
        range: u32,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Show the effective configuration as JSON
    Config {
        #[command(flatten)]
        tuning: Tuning,
    },
}

/// Settings overrides shared by every subcommand
#[derive(Args)]
struct Tuning {
    /// JSON settings file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Graph has 2^node_bits nodes
    #[arg(long)]
    node_bits: Option<u32>,
    /// Edges as a percentage of nodes
    #[arg(short, long)]
    easiness_pct: Option<u64>,
    /// Worker threads
    #[arg(short, long)]
    threads: Option<usize>,
    /// Trimming rounds
    #[arg(long)]
    trims: Option<u32>,
    /// Search variant (plain, trim)
    #[arg(long)]
    variant: Option<String>,
    /// Stop storing solutions after this many
    #[arg(short, long)]
    max_solutions: Option<usize>,
    /// Trim the node space in 2^part_bits parts
    #[arg(long)]
    part_bits: Option<u32>,
}

impl Tuning {
    fn build(&self) -> Result<MinerConfig> {
        let mut config = match &self.config {
            Some(path) => MinerConfig::from_file(path)?,
            None => MinerConfig::default(),
        };

        // Easiness follows the node count unless given explicitly
        let pct = self.easiness_pct.unwrap_or_else(|| config.easiness_pct());
        if let Some(node_bits) = self.node_bits {
            config.node_bits = node_bits;
        }
        if self.node_bits.is_some() || self.easiness_pct.is_some() {
            if !(1..=100).contains(&pct) {
                return Err(CuckooError::Config(format!(
                    "easiness percentage must be in 1..=100, got {}",
                    pct
                )));
            }
            config.set_easiness_pct(pct);
        }

        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(trims) = self.trims {
            config.trim_rounds = Some(trims);
        }
        if let Some(variant) = &self.variant {
            config.variant = variant.parse::<Variant>().map_err(CuckooError::Config)?;
        }
        if let Some(max_solutions) = self.max_solutions {
            config.max_solutions = max_solutions;
        }
        if let Some(part_bits) = self.part_bits {
            config.part_bits = part_bits;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    init()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Mine {
            header,
            hex,
            nonce,
            range,
            tuning,
        } => {
            let config = tuning.build()?;
            let header = if hex {
                hex::decode(header.trim())?
            } else {
                header.into_bytes()
            };
            mine(config, &header, nonce, range)?;
        }
        Commands::Config { tuning } => {
            show_config(&tuning.build()?)?;
        }
    }

    Ok(())
}

/// Headers to mine: the base header alone, or the base header extended with
/// each nonce of the range
fn headers(base: &[u8], nonce: Option<u32>, range: u32) -> Result<Vec<(Option<u32>, Vec<u8>)>> {
    if nonce.is_none() && range <= 1 {
        return Ok(vec![(None, base.to_vec())]);
    }

    let start = nonce.unwrap_or(0);
    (0..range)
        .map(|i| {
            let n = start.checked_add(i).ok_or_else(|| {
                CuckooError::Config(format!("header nonce range overflows at {} + {}", start, i))
            })?;
            let mut header = base.to_vec();
            header.extend_from_slice(&n.to_le_bytes());
            Ok((Some(n), header))
        })
        .collect()
}

fn mine(config: MinerConfig, base: &[u8], nonce: Option<u32>, range: u32) -> Result<()> {
    let miner: CuckooMiner = CuckooMiner::new(config)?;
    let config = miner.config();

    let timestamp = Local::now().format("%H:%M:%S").to_string();
    println!(
        "{} Looking for {}-cycles on cuckoo{}",
        timestamp,
        cuckoo_miner::PROOF_SIZE,
        config.node_bits
    );
    println!("{} Header: {}", timestamp, hex::encode(base));
    println!(
        "{} Easiness: {} ({}%), threads: {}, variant: {}",
        timestamp,
        config.easiness,
        config.easiness_pct(),
        config.threads,
        config.variant
    );
    if config.variant == Variant::Trim {
        println!(
            "{} Trimming: {} rounds over {} parts",
            timestamp,
            config.trim_rounds(),
            1u32 << config.part_bits
        );
    }

    let mut total = 0usize;
    for (header_nonce, header) in headers(base, nonce, range)? {
        let started = Instant::now();
        let outcome = miner.mine_header(&header)?;
        let elapsed = started.elapsed();

        let timestamp = Local::now().format("%H:%M:%S").to_string();
        let label = header_nonce.map_or_else(|| "header".to_string(), |n| format!("nonce {}", n));
        if let Some(alive) = outcome.stats.alive_edges {
            println!("{} {}: {} edges left after trimming", timestamp, label, alive);
        }
        for solution in &outcome.solutions {
            println!("{} {}: Solution {}", timestamp, label, solution);
        }
        println!(
            "{} {}: {} solutions, {} cycles, {} duplicate edges, {:.2}s ({:.0} edges/s)",
            timestamp,
            label,
            outcome.solutions.len(),
            outcome.stats.cycles(),
            outcome.stats.duplicates(),
            elapsed.as_secs_f64(),
            outcome.stats.edge_rate()
        );
        total += outcome.solutions.len();
    }

    let timestamp = Local::now().format("%H:%M:%S").to_string();
    println!("{} {} total solutions", timestamp, total);
    Ok(())
}

fn show_config(config: &MinerConfig) -> Result<()> {
    println!("{}", config.to_json()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_mine_options() {
        let cli = Cli::try_parse_from([
            "cuckoo-miner",
            "mine",
            "--header",
            "00ff",
            "--hex",
            "--node-bits",
            "16",
            "--variant",
            "trim",
            "-t",
            "4",
            "--nonce",
            "7",
            "--range",
            "3",
        ])
        .unwrap();

        match cli.command {
            Commands::Mine {
                header,
                hex,
                nonce,
                range,
                tuning,
            } => {
                assert_eq!(header, "00ff");
                assert!(hex);
                assert_eq!(nonce, Some(7));
                assert_eq!(range, 3);

                let config = tuning.build().unwrap();
                assert_eq!(config.node_bits, 16);
                assert_eq!(config.easiness, 1 << 15);
                assert_eq!(config.threads, 4);
                assert_eq!(config.variant, Variant::Trim);
            }
            Commands::Config { .. } => panic!("expected mine"),
        }
    }

    #[test]
    fn test_bad_variant_is_config_error() {
        let cli = Cli::try_parse_from(["cuckoo-miner", "config", "--variant", "lean"]).unwrap();
        let Commands::Config { tuning } = cli.command else {
            panic!("expected config");
        };
        assert!(matches!(tuning.build(), Err(CuckooError::Config(_))));
    }

    #[test]
    fn test_header_nonces_are_appended() {
        let list = headers(b"hdr", Some(0x0102), 2).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], (Some(0x0102), b"hdr\x02\x01\x00\x00".to_vec()));
        assert_eq!(list[1], (Some(0x0103), b"hdr\x03\x01\x00\x00".to_vec()));

        assert_eq!(headers(b"hdr", None, 1).unwrap(), vec![(None, b"hdr".to_vec())]);
        assert!(headers(b"hdr", Some(u32::MAX), 2).is_err());
    }
}
