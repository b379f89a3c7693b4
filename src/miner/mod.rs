// src/miner/mod.rs - Mining attempt orchestration
// Tree location: ./src/miner/mod.rs

//! Cuckoo Cycle miner
//!
//! [`CuckooMiner`] turns a validated [`MinerConfig`] into mining attempts.
//! Each attempt builds a fresh [`MiningContext`], picks the cycle finder for
//! the configured variant, runs it on a [`WorkerPool`] and hands back the
//! verified solutions once every worker has joined.

/// Counters collected during an attempt
pub mod stats;

use std::time::Instant;

use tracing::info;

use crate::algorithms::solver::{search_worker, WorkerStats};
use crate::algorithms::{
    CycleFinder, EdgeOracle, MiningContext, PlainFinder, SipOracle, Solution, SolverError,
    TrimFinder, Variant, PROOF_SIZE,
};
use crate::config::MinerConfig;
use crate::pool::WorkerPool;

pub use stats::SearchStats;

/// Result of one mining attempt
#[derive(Debug, Clone)]
pub struct MiningOutcome<const N: usize = PROOF_SIZE> {
    /// Verified solutions, in the order they were stored
    pub solutions: Vec<Solution<N>>,
    /// Counters and timing
    pub stats: SearchStats,
}

/// Multithreaded miner for `N`-cycles
#[derive(Debug, Clone)]
pub struct CuckooMiner<const N: usize = PROOF_SIZE> {
    config: MinerConfig,
}

impl<const N: usize> CuckooMiner<N> {
    /// Create a miner after validating `config`
    pub fn new(config: MinerConfig) -> Result<Self, SolverError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Settings in use
    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Mine the SipHash graph keyed by `header`
    pub fn mine_header(&self, header: &[u8]) -> crate::Result<MiningOutcome<N>> {
        let oracle = SipOracle::new(header, self.config.node_bits)?;
        Ok(self.mine(&oracle)?)
    }

    /// Mine the graph described by `oracle`
    ///
    /// # Arguments
    /// * `oracle` - Edge endpoints of the graph; its half size must be a power of two
    ///
    /// # Returns
    /// * The verified solutions and search counters, or the first failure of
    ///   any worker
    pub fn mine<O: EdgeOracle + ?Sized>(
        &self,
        oracle: &O,
    ) -> Result<MiningOutcome<N>, SolverError> {
        let config = &self.config;
        let half_size = oracle.half_size();
        if !half_size.is_power_of_two() {
            return Err(SolverError::InvalidParameter(format!(
                "oracle half size {} is not a power of two",
                half_size
            )));
        }

        info!(
            "Mining {}-cycles: {} nodes, {} edges, {} threads, {} variant",
            N,
            2 * half_size as u64,
            config.easiness,
            config.threads,
            config.variant
        );
        let start = Instant::now();

        let ctx: MiningContext<'_, O, N> = MiningContext::new(
            oracle,
            config.easiness,
            config.threads,
            config.max_solutions,
            config.max_path_len,
            config.presip,
        );

        let (variant, workers, alive_edges) = match config.variant {
            Variant::Plain => {
                let (variant, workers) = self.search(&PlainFinder, &ctx)?;
                (variant, workers, None)
            }
            Variant::Trim => {
                let finder = TrimFinder::new(
                    config.easiness,
                    half_size,
                    config.threads,
                    config.trim_rounds(),
                    config.part_bits,
                )?;
                let (variant, workers) = self.search(&finder, &ctx)?;
                (variant, workers, Some(finder.alive().count()))
            }
        };

        let solutions = ctx.into_solutions();
        let stats = SearchStats {
            variant,
            workers,
            alive_edges,
            elapsed: start.elapsed(),
        };
        info!(
            "Found {} solutions and {} cycles in {:.2}s",
            solutions.len(),
            stats.cycles(),
            stats.elapsed.as_secs_f64()
        );

        Ok(MiningOutcome { solutions, stats })
    }

    /// Run `finder` on every worker; returns the variant that ran and the
    /// per-worker counters
    fn search<O, F>(
        &self,
        finder: &F,
        ctx: &MiningContext<'_, O, N>,
    ) -> Result<(Variant, Vec<WorkerStats>), SolverError>
    where
        O: EdgeOracle + ?Sized,
        F: CycleFinder,
    {
        let workers = WorkerPool::new(self.config.threads)
            .run(ctx.coordinator(), |worker| search_worker(finder, ctx, worker))?;
        Ok((finder.variant(), workers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::{chain, disjoint_squares, planted_square, TableOracle};
    use crate::algorithms::PathError;

    fn table_config(node_bits: u32, easiness: u64) -> MinerConfig {
        MinerConfig {
            node_bits,
            easiness,
            ..MinerConfig::default()
        }
    }

    #[test]
    fn test_planted_square_plain() {
        let miner = CuckooMiner::<4>::new(table_config(5, 10)).unwrap();
        let outcome = miner.mine(&planted_square()).unwrap();

        assert_eq!(outcome.solutions, vec![Solution::new([1, 3, 6, 8])]);
        assert_eq!(outcome.stats.variant, Variant::Plain);
        assert_eq!(outcome.stats.edges(), 10);
        assert_eq!(outcome.stats.cycles(), 1);
        assert_eq!(outcome.stats.alive_edges, None);
    }

    #[test]
    fn test_planted_square_trimmed() {
        for threads in [1, 4] {
            let config = MinerConfig {
                variant: Variant::Trim,
                trim_rounds: Some(1),
                threads,
                ..table_config(5, 10)
            };
            let miner = CuckooMiner::<4>::new(config).unwrap();
            let outcome = miner.mine(&planted_square()).unwrap();

            // everything outside the square is trimmed, and all of it sits in worker 0's block
            assert_eq!(outcome.solutions, vec![Solution::new([1, 3, 6, 8])]);
            assert_eq!(outcome.stats.alive_edges, Some(4));
            assert_eq!(outcome.stats.edges(), 4);
            assert_eq!(outcome.stats.workers.len(), threads);
            assert_eq!(outcome.stats.variant, Variant::Trim);
        }
    }

    #[test]
    fn test_duplicate_edges_are_counted() {
        let oracle = TableOracle::new(16, vec![(0, 0), (2, 1), (0, 0), (1, 1)]);
        let outcome = CuckooMiner::<4>::new(table_config(5, 4)).unwrap().mine(&oracle).unwrap();

        assert_eq!(outcome.stats.variant, Variant::Plain);
        assert_eq!(outcome.stats.edges(), 4);
        assert_eq!(outcome.stats.duplicates(), 1);
        assert_eq!(outcome.stats.cycles(), 0);
        assert!(outcome.solutions.is_empty());
    }

    #[test]
    fn test_default_trim_rounds_keep_the_square() {
        let config = MinerConfig {
            variant: Variant::Trim,
            ..table_config(5, 10)
        };
        let outcome = CuckooMiner::<4>::new(config).unwrap().mine(&planted_square()).unwrap();
        assert_eq!(outcome.solutions, vec![Solution::new([1, 3, 6, 8])]);
    }

    #[test]
    fn test_path_cap_boundary() {
        let config = MinerConfig {
            max_path_len: 16,
            ..table_config(5, 16)
        };
        let outcome = CuckooMiner::<4>::new(config.clone()).unwrap().mine(&chain(16, 16)).unwrap();
        assert!(outcome.solutions.is_empty());

        let config = MinerConfig { easiness: 17, ..config };
        let err = CuckooMiner::<4>::new(config).unwrap().mine(&chain(17, 16)).unwrap_err();
        assert!(matches!(err, SolverError::Path(PathError::MaxPathLenExceeded)));
    }

    #[test]
    fn test_capacity_single_thread() {
        let oracle = disjoint_squares(20, 64);
        let config = MinerConfig {
            max_solutions: 3,
            ..table_config(7, 80)
        };
        let outcome = CuckooMiner::<4>::new(config).unwrap().mine(&oracle).unwrap();

        assert_eq!(
            outcome.solutions,
            vec![
                Solution::new([0, 1, 2, 3]),
                Solution::new([4, 5, 6, 7]),
                Solution::new([8, 9, 10, 11]),
            ]
        );
        // later squares are still detected, just not stored
        assert_eq!(outcome.stats.cycles(), 20);
    }

    #[test]
    fn test_capacity_under_contention() {
        let oracle = disjoint_squares(20, 64);
        for threads in [2, 3, 8] {
            // 32-nonce blocks keep every square inside one worker's slice,
            // so the workers only compete for buffer slots
            let config = MinerConfig {
                max_solutions: 3,
                threads,
                variant: Variant::Trim,
                ..table_config(7, 80)
            };
            let outcome = CuckooMiner::<4>::new(config).unwrap().mine(&oracle).unwrap();

            assert_eq!(outcome.solutions.len(), 3);
            assert_eq!(outcome.stats.cycles(), 20);
            for solution in &outcome.solutions {
                assert!(solution.verify(&oracle, 80).is_ok());
            }
        }
    }

    #[test]
    fn test_capacity_with_shared_trees() {
        let oracle = disjoint_squares(20, 64);
        for threads in [2, 4, 8] {
            let config = MinerConfig {
                max_solutions: 3,
                threads,
                presip: 1,
                ..table_config(7, 80)
            };
            match CuckooMiner::<4>::new(config).unwrap().mine(&oracle) {
                Ok(outcome) => {
                    assert!(outcome.solutions.len() <= 3);
                    for solution in &outcome.solutions {
                        assert!(solution.verify(&oracle, 80).is_ok());
                    }
                }
                Err(SolverError::Path(_)) => {}
                Err(err) => panic!("unexpected failure: {}", err),
            }
        }
    }

    #[test]
    fn test_overloaded_trim_fails() {
        let config = MinerConfig {
            node_bits: 8,
            easiness: 256,
            variant: Variant::Trim,
            trim_rounds: Some(0),
            threads: 2,
            ..MinerConfig::default()
        };
        let err = CuckooMiner::<42>::new(config).unwrap().mine_header(b"overload").unwrap_err();
        assert!(matches!(
            err,
            crate::CuckooError::Solver(SolverError::Overloaded { load: 100 })
        ));
    }

    #[test]
    fn test_solutions_always_verify_under_stress() {
        for (i, variant) in [Variant::Plain, Variant::Trim].into_iter().enumerate() {
            for seed in 0u32..6 {
                let mut header = b"stress".to_vec();
                header.extend_from_slice(&seed.to_le_bytes());
                let oracle = SipOracle::new(&header, 14).unwrap();
                let config = MinerConfig {
                    node_bits: 14,
                    easiness: 8192 + 2048 * i as u64,
                    threads: 8,
                    variant,
                    max_solutions: 4,
                    ..MinerConfig::default()
                };

                match CuckooMiner::<6>::new(config.clone()).unwrap().mine(&oracle) {
                    Ok(outcome) => {
                        assert!(outcome.solutions.len() <= 4);
                        for solution in &outcome.solutions {
                            assert!(solution.verify(&oracle, config.easiness).is_ok());
                        }
                    }
                    // racing reroots may leave a loop in the forest; that is fatal, not wrong
                    Err(SolverError::Path(_)) => {}
                    Err(err) => panic!("unexpected failure: {}", err),
                }
            }
        }
    }

    #[test]
    fn test_single_thread_is_deterministic() {
        let config = MinerConfig {
            node_bits: 14,
            easiness: 8192,
            ..MinerConfig::default()
        };
        let miner = CuckooMiner::<6>::new(config).unwrap();
        let first = miner.mine_header(b"determinism").unwrap();
        let second = miner.mine_header(b"determinism").unwrap();

        assert_eq!(first.solutions, second.solutions);
        assert_eq!(first.stats.workers, second.stats.workers);

        let oracle = SipOracle::new(b"determinism", 14).unwrap();
        for solution in &first.solutions {
            assert!(solution.verify(&oracle, 8192).is_ok());
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = MinerConfig {
            threads: 0,
            ..MinerConfig::default()
        };
        assert!(matches!(
            CuckooMiner::<42>::new(config),
            Err(SolverError::InvalidParameter(_))
        ));
    }
}
