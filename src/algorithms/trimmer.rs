// src/algorithms/trimmer.rs - Multithreaded leaf-edge trimming
// Tree location: ./src/algorithms/trimmer.rs

//! Edge trimming
//!
//! An edge with an endpoint of degree one can never be on a cycle. Each round
//! visits both sides of the graph; per side, a mark pass counts how often each
//! node is hit by alive edges and a kill pass drops every edge whose node was
//! hit only once. The node space is optionally split into `2^part_bits`
//! parts so the occupancy counter only covers one part at a time.
//!
//! Workers scan disjoint 32-nonce blocks of the alive set and move in lock
//! step: the leader clears the counter between sides, and barriers separate
//! the mark pass from the kill pass.
//!
//! Node hits are staged in small per-bucket buffers keyed by the high bits of
//! the node, so that the counter updates of a flush land close together.

use tracing::info;

use super::bitset::{AliveSet, TwiceSet, NONCE_BLOCK};
use super::context::MiningContext;
use super::oracle::{EdgeOracle, Side};
use super::solver::{CycleFinder, NonceSchedule};
use super::{SolverError, Variant};

/// Upper bound on log2 of the number of staging buckets
pub const LOG_NBUCKETS: u32 = 12;
/// Entries per staging bucket
pub const BUCKET_SIZE: usize = 16;
/// Load at or above which the cycle search is refused
pub const OVERLOAD_PCT: u64 = 90;

/// Rounds used when none are configured
pub fn default_trim_rounds(part_bits: u32) -> u32 {
    1 + (part_bits + 3) * (part_bits + 4) / 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Mark,
    Kill,
}

/// Per-worker staging area of `(node, nonce)` pairs
struct Buckets {
    entries: Vec<(u32, u64)>,
    sizes: Vec<usize>,
}

impl Buckets {
    fn new(nbuckets: usize) -> Self {
        Self {
            entries: vec![(0, 0); nbuckets * BUCKET_SIZE],
            sizes: vec![0; nbuckets],
        }
    }

    fn nbuckets(&self) -> usize {
        self.sizes.len()
    }

    fn clear(&mut self) {
        self.sizes.iter_mut().for_each(|size| *size = 0);
    }

    /// Stage an entry; `true` once the bucket is full
    #[inline]
    fn push(&mut self, bucket: usize, node: u32, nonce: u64) -> bool {
        let size = &mut self.sizes[bucket];
        self.entries[bucket * BUCKET_SIZE + *size] = (node, nonce);
        *size += 1;
        *size == BUCKET_SIZE
    }

    /// Empty a bucket, returning what it held
    #[inline]
    fn take(&mut self, bucket: usize) -> &[(u32, u64)] {
        let len = std::mem::replace(&mut self.sizes[bucket], 0);
        let start = bucket * BUCKET_SIZE;
        &self.entries[start..start + len]
    }
}

/// Trimming pre-pass followed by a cycle search over the surviving edges
///
/// Trimming cuts the work of the cycle search, not its memory: the forest
/// allocated afterwards is still the full node-indexed array.
pub struct TrimFinder {
    easiness: u64,
    size: u64,
    threads: usize,
    rounds: u32,
    part_bits: u32,
    part_mask: u32,
    bucket_shift: u32,
    nbuckets: usize,
    alive: AliveSet,
    nonleaf: TwiceSet,
}

impl TrimFinder {
    /// Set up trimming of `[0, easiness)` over a graph with `half_size`
    /// nodes per side
    ///
    /// # Arguments
    /// * `easiness` - Number of candidate edges
    /// * `half_size` - Nodes per side; a power of two of at least 2
    /// * `threads` - Workers that will call [`TrimFinder::trim_round`] together
    /// * `rounds` - Trimming rounds run before the cycle search
    /// * `part_bits` - log2 of the number of node-space parts, below log2 `half_size`
    ///
    /// # Returns
    /// The finder, or `InvalidParameter` if the sizes do not fit
    pub fn new(
        easiness: u64,
        half_size: u32,
        threads: usize,
        rounds: u32,
        part_bits: u32,
    ) -> Result<Self, SolverError> {
        if !half_size.is_power_of_two() || half_size < 2 {
            return Err(SolverError::InvalidParameter(format!(
                "half size must be a power of two of at least 2, got {}",
                half_size
            )));
        }
        let half_bits = half_size.trailing_zeros();
        if part_bits >= half_bits {
            return Err(SolverError::InvalidParameter(format!(
                "part bits must be below {}, got {}",
                half_bits, part_bits
            )));
        }

        let threads = threads.max(1);
        let log_nbuckets = LOG_NBUCKETS.min(half_bits);
        Ok(Self {
            easiness,
            size: 2 * half_size as u64,
            threads,
            rounds,
            part_bits,
            part_mask: (1u32 << part_bits) - 1,
            bucket_shift: half_bits - log_nbuckets,
            nbuckets: 1usize << log_nbuckets,
            alive: AliveSet::new(easiness, threads),
            nonleaf: TwiceSet::new((half_size >> part_bits) as usize),
        })
    }

    /// Edges that survived so far
    pub fn alive(&self) -> &AliveSet {
        &self.alive
    }

    /// Alive edges as a percentage of the node count
    pub fn load(&self) -> u64 {
        100 * self.alive.count() / self.size
    }

    /// Run one full round (every part, both sides) as `worker`
    pub fn trim_round<O, const N: usize>(
        &self,
        ctx: &MiningContext<'_, O, N>,
        worker: usize,
    ) -> Result<(), SolverError>
    where
        O: EdgeOracle + ?Sized,
    {
        let coordinator = ctx.coordinator();
        let mut buckets = Buckets::new(self.nbuckets);

        for part in 0..=self.part_mask {
            for side in Side::BOTH {
                if coordinator.is_leader(worker) {
                    self.nonleaf.reset();
                }
                coordinator.barrier()?;

                for pass in [Pass::Mark, Pass::Kill] {
                    self.scan(ctx.oracle(), side, part, pass, worker, &mut buckets);
                    coordinator.barrier()?;
                }
            }
        }
        Ok(())
    }

    /// One pass over this worker's blocks for `side` and `part`
    fn scan<O>(
        &self,
        oracle: &O,
        side: Side,
        part: u32,
        pass: Pass,
        worker: usize,
        buckets: &mut Buckets,
    )
    where
        O: EdgeOracle + ?Sized,
    {
        buckets.clear();

        let stride = self.threads as u64 * NONCE_BLOCK;
        let mut block = worker as u64 * NONCE_BLOCK;
        while block < self.easiness {
            let mut alive32 = self.alive.block(block);
            let mut nonce = block;
            while alive32 != 0 {
                if alive32 & 1 == 1 {
                    let node = oracle.node(nonce, side);
                    if node & self.part_mask == part {
                        let bucket = (node >> self.bucket_shift) as usize;
                        if buckets.push(bucket, node >> self.part_bits, nonce) {
                            self.flush(buckets.take(bucket), pass, worker);
                        }
                    }
                }
                alive32 >>= 1;
                nonce += 1;
            }
            block += stride;
        }

        for bucket in 0..buckets.nbuckets() {
            self.flush(buckets.take(bucket), pass, worker);
        }
    }

    #[inline]
    fn flush(&self, entries: &[(u32, u64)], pass: Pass, worker: usize) {
        for &(node, nonce) in entries {
            match pass {
                Pass::Mark => self.nonleaf.set(node),
                Pass::Kill => {
                    if !self.nonleaf.test(node) {
                        self.alive.reset(nonce, worker);
                    }
                }
            }
        }
    }
}

impl CycleFinder for TrimFinder {
    fn variant(&self) -> Variant {
        Variant::Trim
    }

    /// Trim, check the load, then have the leader allocate the forest
    fn prepare<O, const N: usize>(
        &self,
        ctx: &MiningContext<'_, O, N>,
        worker: usize,
    ) -> Result<(), SolverError>
    where
        O: EdgeOracle + ?Sized,
    {
        let coordinator = ctx.coordinator();
        let leader = coordinator.is_leader(worker);
        if leader {
            info!("Initial load {}%", 100 * self.easiness / self.size);
        }

        for round in 1..=self.rounds {
            self.trim_round(ctx, worker)?;
            if leader {
                info!("{} trims: load {}%", round, self.load());
            }
        }

        if leader {
            let load = self.load();
            if load >= OVERLOAD_PCT {
                coordinator.abort(SolverError::Overloaded { load });
                return Err(SolverError::Overloaded { load });
            }
            ctx.forest();
        }
        coordinator.barrier()
    }

    fn schedule(&self, easiness: u64, threads: usize, worker: usize) -> NonceSchedule {
        NonceSchedule::blocked(easiness, threads, worker)
    }

    #[inline]
    fn is_alive(&self, nonce: u64) -> bool {
        self.alive.test(nonce)
    }
}

impl std::fmt::Debug for TrimFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrimFinder")
            .field("easiness", &self.easiness)
            .field("threads", &self.threads)
            .field("rounds", &self.rounds)
            .field("part_bits", &self.part_bits)
            .field("alive", &self.alive.count())
            .finish()
    }
}
