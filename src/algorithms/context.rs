// src/algorithms/context.rs - Per-attempt state shared by all workers
// Tree location: ./src/algorithms/context.rs

//! Mining context
//!
//! One [`MiningContext`] lives for exactly one mining attempt. It owns the
//! shared forest (allocated lazily, so the trimming variant can defer it until
//! trimming is done), the capped solution buffer and the coordinator the
//! workers synchronise through. Everything is dropped when the attempt ends.

use std::sync::OnceLock;

use super::forest::Forest;
use super::oracle::EdgeOracle;
use super::solution::SolutionBuffer;
use super::Solution;
use crate::pool::Coordinator;

/// Shared state of one mining attempt
pub struct MiningContext<'a, O: ?Sized, const N: usize> {
    oracle: &'a O,
    easiness: u64,
    max_path_len: usize,
    presip: usize,
    coordinator: Coordinator,
    forest: OnceLock<Forest>,
    solutions: SolutionBuffer<N>,
}

impl<'a, O: EdgeOracle + ?Sized, const N: usize> MiningContext<'a, O, N> {
    /// Set up an attempt over nonces `[0, easiness)`
    pub fn new(
        oracle: &'a O,
        easiness: u64,
        threads: usize,
        max_solutions: usize,
        max_path_len: usize,
        presip: usize,
    ) -> Self {
        Self {
            oracle,
            easiness,
            max_path_len,
            presip: presip.max(1),
            coordinator: Coordinator::new(threads),
            forest: OnceLock::new(),
            solutions: SolutionBuffer::new(max_solutions),
        }
    }

    /// Edge oracle for this attempt
    #[inline]
    pub fn oracle(&self) -> &'a O {
        self.oracle
    }

    /// Size of the nonce space
    #[inline]
    pub fn easiness(&self) -> u64 {
        self.easiness
    }

    /// Nodes per side of the graph
    #[inline]
    pub fn half_size(&self) -> u32 {
        self.oracle.half_size()
    }

    /// Number of workers
    pub fn threads(&self) -> usize {
        self.coordinator.threads()
    }

    /// Edges derived per cycle-engine batch
    pub fn presip(&self) -> usize {
        self.presip
    }

    /// Barrier and abort signal shared by the workers
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// The shared forest, allocating it on first use
    pub fn forest(&self) -> &Forest {
        self.forest
            .get_or_init(|| Forest::new(self.oracle.half_size(), self.max_path_len))
    }

    /// Whether the forest has been allocated yet
    pub fn has_forest(&self) -> bool {
        self.forest.get().is_some()
    }

    /// Capped buffer receiving verified solutions
    pub fn solutions(&self) -> &SolutionBuffer<N> {
        &self.solutions
    }

    /// Tear the attempt down and keep only its solutions
    pub fn into_solutions(self) -> Vec<Solution<N>> {
        self.solutions.into_solutions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::planted_square;
    use crate::algorithms::MAX_PATH_LEN;

    #[test]
    fn test_forest_is_allocated_lazily_once() {
        let oracle = planted_square();
        let ctx: MiningContext<'_, _, 4> = MiningContext::new(&oracle, 10, 2, 3, MAX_PATH_LEN, 0);

        assert!(!ctx.has_forest());
        assert_eq!(ctx.presip(), 1);
        assert_eq!(ctx.threads(), 2);
        assert_eq!(ctx.half_size(), 16);

        let first = ctx.forest() as *const Forest;
        assert!(ctx.has_forest());
        assert_eq!(ctx.forest().len(), 33);
        assert_eq!(first, ctx.forest() as *const Forest);

        assert!(ctx.solutions().is_empty());
        assert!(ctx.into_solutions().is_empty());
    }
}
