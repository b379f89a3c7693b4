// src/algorithms/solution.rs - Cycle reconstruction and the capped solution buffer
// Tree location: ./src/algorithms/solution.rs

//! Solution builder
//!
//! The forest stores nodes only, so a detected cycle is first rebuilt as a set
//! of forest edges from the two meeting paths, then a second pass over the
//! nonce space re-derives edges and picks out the nonces that produce them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use hashbrown::HashSet;

use super::oracle::EdgeOracle;
use super::Solution;

/// Forest edges of the cycle closed by the meeting paths `us[0..=nu]` and
/// `vs[0..=nv]`.
///
/// `us` holds U nodes at even positions and `vs` holds them at odd ones; the
/// closing edge is `(us[0], vs[0])`.
pub fn cycle_edges(us: &[u32], nu: usize, vs: &[u32], nv: usize) -> HashSet<(u32, u32)> {
    let mut cycle = HashSet::with_capacity(nu + nv + 1);
    cycle.insert((us[0], vs[0]));
    for i in 0..nu {
        cycle.insert((us[(i + 1) & !1], us[i | 1]));
    }
    for i in 0..nv {
        cycle.insert((vs[i | 1], vs[(i + 1) & !1]));
    }
    cycle
}

/// Scan the alive nonces below `easiness` and collect the ones whose edges
/// are in `cycle`, in increasing order.
///
/// Each matched edge leaves the set, so duplicate nonces are not picked twice.
///
/// # Arguments
/// * `oracle` - Edge endpoints of the graph
/// * `easiness` - Exclusive upper bound of the scan
/// * `is_alive` - Filter for nonces still in play (trimmed edges are skipped)
/// * `cycle` - Forest-offset `(u, v)` edges of the cycle, from [`cycle_edges`]
///
/// # Returns
/// The `N` nonces in increasing order, or `None` if fewer are found
pub fn recover_nonces<O, F, const N: usize>(
    oracle: &O,
    easiness: u64,
    is_alive: F,
    mut cycle: HashSet<(u32, u32)>,
) -> Option<[u64; N]>
where
    O: EdgeOracle + ?Sized,
    F: Fn(u64) -> bool,
{
    let mut nonces = [0u64; N];
    let mut found = 0;
    for nonce in (0..easiness).filter(|&nonce| is_alive(nonce)) {
        if found == N || cycle.is_empty() {
            break;
        }
        if cycle.remove(&oracle.forest_edge(nonce)) {
            nonces[found] = nonce;
            found += 1;
        }
    }
    (found == N).then_some(nonces)
}

/// Fixed-capacity buffer filled concurrently by the workers
///
/// Slots are claimed with a bounded atomic increment, so the count can never
/// pass the capacity however many workers race for the last slot.
pub struct SolutionBuffer<const N: usize> {
    slots: Box<[OnceLock<Solution<N>>]>,
    count: AtomicUsize,
}

impl<const N: usize> SolutionBuffer<N> {
    /// Create a buffer with room for `capacity` solutions
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            count: AtomicUsize::new(0),
        }
    }

    /// Maximum number of solutions
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots claimed so far
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Whether no slot has been claimed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every slot has been claimed
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Claim the next free slot, if any remain
    pub fn try_reserve(&self) -> Option<usize> {
        let capacity = self.capacity();
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < capacity).then_some(n + 1)
            })
            .ok()
    }

    /// Store `solution` in a fresh slot; `false` if the buffer is full
    pub fn push(&self, solution: Solution<N>) -> bool {
        match self.try_reserve() {
            Some(slot) => self.slots[slot].set(solution).is_ok(),
            None => false,
        }
    }

    /// Filled slots in reservation order
    pub fn into_solutions(self) -> Vec<Solution<N>> {
        self.slots
            .into_vec()
            .into_iter()
            .filter_map(OnceLock::into_inner)
            .collect()
    }
}

impl<const N: usize> std::fmt::Debug for SolutionBuffer<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolutionBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
