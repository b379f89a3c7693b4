// src/algorithms/solver.rs - Cycle engine and worker search loop
// Tree location: ./src/algorithms/solver.rs

//! Cycle detection over the shared forest
//!
//! Each worker streams its slice of the nonce space through a
//! [`CycleEngine`]. An edge whose endpoints already share a root closes a
//! cycle; any other edge merges two trees by rerooting the shorter side.
//! Closed cycles of exactly `N` edges are rebuilt, verified and stored.
//!
//! The [`CycleFinder`] trait captures what differs between the plain and the
//! trimming variants: which nonces a worker visits, which of them are still
//! candidates, and what has to happen before the search starts.

use tracing::{debug, warn};

use super::bitset::NONCE_BLOCK;
use super::context::MiningContext;
use super::forest::Forest;
use super::oracle::EdgeOracle;
use super::solution::{cycle_edges, recover_nonces};
use super::{Solution, SolverError, Variant};

/// Per-variant behaviour of a mining attempt
pub trait CycleFinder: Send + Sync {
    /// Which variant this is
    fn variant(&self) -> Variant;

    /// Work done by every worker before the cycle search (may use barriers)
    fn prepare<O, const N: usize>(
        &self,
        ctx: &MiningContext<'_, O, N>,
        worker: usize,
    ) -> Result<(), SolverError>
    where
        O: EdgeOracle + ?Sized;

    /// Nonces `worker` feeds into the cycle engine, in increasing order
    fn schedule(&self, easiness: u64, threads: usize, worker: usize) -> NonceSchedule;

    /// Whether `nonce` is still a candidate edge
    fn is_alive(&self, nonce: u64) -> bool;
}

/// Increasing sequence of nonces owned by one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonceSchedule {
    /// `next, next + step, ...` below `end`
    Strided {
        /// Next nonce to yield
        next: u64,
        /// Exclusive upper bound
        end: u64,
        /// Distance between nonces
        step: u64,
    },
    /// Whole 32-nonce blocks `block, block + stride, ...` below `end`
    Blocked {
        /// Start of the current block
        block: u64,
        /// Position inside the current block
        offset: u64,
        /// Exclusive upper bound
        end: u64,
        /// Distance between block starts
        stride: u64,
    },
}

impl NonceSchedule {
    /// Worker `worker` of `threads` takes every `threads`-th nonce
    pub fn strided(easiness: u64, threads: usize, worker: usize) -> Self {
        NonceSchedule::Strided {
            next: worker as u64,
            end: easiness,
            step: threads.max(1) as u64,
        }
    }

    /// Worker `worker` of `threads` takes every `threads`-th 32-nonce block
    pub fn blocked(easiness: u64, threads: usize, worker: usize) -> Self {
        NonceSchedule::Blocked {
            block: worker as u64 * NONCE_BLOCK,
            offset: 0,
            end: easiness,
            stride: threads.max(1) as u64 * NONCE_BLOCK,
        }
    }
}

impl Iterator for NonceSchedule {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        match self {
            NonceSchedule::Strided { next, end, step } => {
                if *next >= *end {
                    return None;
                }
                let nonce = *next;
                *next += *step;
                Some(nonce)
            }
            NonceSchedule::Blocked {
                block,
                offset,
                end,
                stride,
            } => {
                let nonce = *block + *offset;
                if nonce >= *end {
                    return None;
                }
                *offset += 1;
                if *offset == NONCE_BLOCK {
                    *offset = 0;
                    *block += *stride;
                }
                Some(nonce)
            }
        }
    }
}

/// Cycle search straight over the full nonce space
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFinder;

impl CycleFinder for PlainFinder {
    fn variant(&self) -> Variant {
        Variant::Plain
    }

    fn prepare<O, const N: usize>(
        &self,
        _ctx: &MiningContext<'_, O, N>,
        _worker: usize,
    ) -> Result<(), SolverError>
    where
        O: EdgeOracle + ?Sized,
    {
        Ok(())
    }

    fn schedule(&self, easiness: u64, threads: usize, worker: usize) -> NonceSchedule {
        NonceSchedule::strided(easiness, threads, worker)
    }

    #[inline]
    fn is_alive(&self, _nonce: u64) -> bool {
        true
    }
}

/// What happened to one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Same edge already in the forest
    Duplicate,
    /// Joined two trees
    Merged,
    /// Closed a cycle that was not stored
    Cycle {
        /// Number of edges on the cycle
        len: usize,
    },
    /// Closed a target-length cycle and stored it
    Solution,
}

/// Edge counters of one worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Worker ordinal
    pub worker: usize,
    /// Edges fed to the engine
    pub edges: u64,
    /// Duplicate edges skipped
    pub duplicates: u64,
    /// Cycles closed, of any length
    pub cycles: u64,
    /// Solutions stored
    pub solutions: u64,
}

impl WorkerStats {
    /// Empty counters for `worker`
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            ..Self::default()
        }
    }

    /// Count one edge outcome
    pub fn record(&mut self, outcome: EdgeOutcome) {
        self.edges += 1;
        match outcome {
            EdgeOutcome::Duplicate => self.duplicates += 1,
            EdgeOutcome::Merged => {}
            EdgeOutcome::Cycle { .. } => self.cycles += 1,
            EdgeOutcome::Solution => {
                self.cycles += 1;
                self.solutions += 1;
            }
        }
    }
}

/// One worker's view of the shared forest
pub struct CycleEngine<'a, O: ?Sized, F, const N: usize> {
    ctx: &'a MiningContext<'a, O, N>,
    finder: &'a F,
    forest: &'a Forest,
    worker: usize,
    us: Vec<u32>,
    vs: Vec<u32>,
}

impl<'a, O, F, const N: usize> CycleEngine<'a, O, F, N>
where
    O: EdgeOracle + ?Sized,
    F: CycleFinder,
{
    /// Create an engine for `worker` over the context's forest
    pub fn new(ctx: &'a MiningContext<'a, O, N>, finder: &'a F, worker: usize) -> Self {
        let forest = ctx.forest();
        let max_path_len = forest.max_path_len();
        Self {
            ctx,
            finder,
            forest,
            worker,
            us: Vec::with_capacity(max_path_len),
            vs: Vec::with_capacity(max_path_len),
        }
    }

    /// Add the edge `(u0, v0)` of `nonce` (forest offsets applied)
    pub fn process(&mut self, nonce: u64, u0: u32, v0: u32) -> Result<EdgeOutcome, SolverError> {
        let forest = self.forest;
        let u = forest.parent(u0);
        let v = forest.parent(v0);
        if u == v0 || v == u0 {
            return Ok(EdgeOutcome::Duplicate);
        }

        let mut nu = forest.walk(u0, u, &mut self.us)?;
        let mut nv = forest.walk(v0, v, &mut self.vs)?;

        if self.us[nu] == self.vs[nv] {
            let min = nu.min(nv);
            nu -= min;
            nv -= min;
            while self.us[nu] != self.vs[nv] {
                nu += 1;
                nv += 1;
            }
            let len = nu + nv + 1;
            debug!(
                "{:4}-cycle found at {}:{}%",
                len,
                self.worker,
                nonce.saturating_mul(100) / self.ctx.easiness().max(1)
            );

            if len == N && !self.ctx.solutions().is_full() && self.record_solution(nu, nv) {
                return Ok(EdgeOutcome::Solution);
            }
            return Ok(EdgeOutcome::Cycle { len });
        }

        if nu < nv {
            forest.reroot(&self.us, nu, v0);
        } else {
            forest.reroot(&self.vs, nv, u0);
        }
        Ok(EdgeOutcome::Merged)
    }

    /// Rebuild, verify and store the cycle held in `us[..=nu]`/`vs[..=nv]`
    fn record_solution(&self, nu: usize, nv: usize) -> bool {
        let oracle = self.ctx.oracle();
        let easiness = self.ctx.easiness();
        let cycle = cycle_edges(&self.us, nu, &self.vs, nv);

        let is_alive = |nonce| self.finder.is_alive(nonce);
        let Some(nonces) = recover_nonces::<_, _, N>(oracle, easiness, is_alive, cycle) else {
            warn!("Worker {} could not recover the nonces of a {}-cycle", self.worker, N);
            return false;
        };

        let solution = Solution::new(nonces);
        if let Err(err) = solution.verify(oracle, easiness) {
            warn!("Worker {} dropped a recovered cycle: {}", self.worker, err);
            return false;
        }
        self.ctx.solutions().push(solution)
    }
}

/// Full per-worker attempt: variant preparation, then the cycle search over
/// this worker's nonces.
pub fn search_worker<O, F, const N: usize>(
    finder: &F,
    ctx: &MiningContext<'_, O, N>,
    worker: usize,
) -> Result<WorkerStats, SolverError>
where
    O: EdgeOracle + ?Sized,
    F: CycleFinder,
{
    finder.prepare(ctx, worker)?;

    let oracle = ctx.oracle();
    let presip = ctx.presip();
    let mut engine = CycleEngine::new(ctx, finder, worker);
    let mut stats = WorkerStats::new(worker);
    let mut schedule = finder
        .schedule(ctx.easiness(), ctx.threads(), worker)
        .filter(|&nonce| finder.is_alive(nonce));
    let mut batch = Vec::with_capacity(presip);

    loop {
        if ctx.coordinator().is_aborted() {
            return Err(SolverError::Aborted);
        }

        batch.clear();
        batch.extend(schedule.by_ref().take(presip).map(|nonce| {
            let (u0, v0) = oracle.forest_edge(nonce);
            (nonce, u0, v0)
        }));
        if batch.is_empty() {
            break;
        }

        for &(nonce, u0, v0) in &batch {
            stats.record(engine.process(nonce, u0, v0)?);
        }
    }

    debug!(
        "Worker {} done: {} edges, {} duplicates, {} cycles, {} solutions",
        worker, stats.edges, stats.duplicates, stats.cycles, stats.solutions
    );
    Ok(stats)
}
