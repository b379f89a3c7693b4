// src/algorithms/forest.rs - Shared parent-pointer forest for cycle detection
// Tree location: ./src/algorithms/forest.rs

//! Parent-pointer forest
//!
//! Every node of the graph owns one slot holding its parent, or 0 for a root.
//! Accepted edges merge two trees by reversing the shorter root path, so the
//! structure never needs adjacency lists or per-node rank data. Nonces are not
//! stored anywhere; the solution builder re-derives them in a second pass.
//!
//! All workers read and write the same slots without locking. Slots are
//! `AtomicU32` accessed with `Ordering::Relaxed`: a worker may act on a
//! slightly stale view, which can cost a missed cycle but never an unverified
//! solution, since every recovered cycle is checked before it is recorded.

use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

/// Default cap on the number of hops a root walk may take
pub const MAX_PATH_LEN: usize = 8192;

/// Fatal conditions met while walking to a root
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    /// The walk hit the cap without revisiting a node
    #[error("maximum path length exceeded")]
    MaxPathLenExceeded,

    /// The walk revisited a node: the forest contains a loop
    #[error("illegal {len}-cycle in forest")]
    IllegalCycle {
        /// Number of nodes on the loop
        len: usize,
    },
}

/// Array-backed node -> parent mapping
pub struct Forest {
    parents: Box<[AtomicU32]>,
    max_path_len: usize,
}

impl Forest {
    /// Allocate a forest for `2 * half_size` nodes plus the root marker
    pub fn new(half_size: u32, max_path_len: usize) -> Self {
        let slots = 1 + 2 * half_size as usize;
        let parents = (0..slots).map(|_| AtomicU32::new(0)).collect();
        tracing::debug!("Allocated forest with {} slots", slots);
        Self {
            parents,
            max_path_len,
        }
    }

    /// Number of slots, including the reserved slot 0
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether the forest has no slots at all
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Hop cap applied to every walk
    pub fn max_path_len(&self) -> usize {
        self.max_path_len
    }

    /// Current parent of `node` (0 for a root)
    #[inline]
    pub fn parent(&self, node: u32) -> u32 {
        self.parents[node as usize].load(Ordering::Relaxed)
    }

    /// Point `node` at `parent`
    #[inline]
    pub fn set_parent(&self, node: u32, parent: u32) {
        self.parents[node as usize].store(parent, Ordering::Relaxed);
    }

    /// Walk from `start` to its root, given the already-read parent `first`.
    ///
    /// # Arguments
    /// * `start` - Node the walk begins at
    /// * `first` - Parent of `start` as read by the caller (0 if `start` is a root)
    /// * `path` - Buffer that receives the visited nodes; cleared first
    ///
    /// # Returns
    /// The hop count `n`, with `path[0] == start` and `path[n]` the root.
    /// Reaching `max_path_len` hops is an error: `IllegalCycle` if the walk
    /// revisited a node, `MaxPathLenExceeded` otherwise.
    pub fn walk(&self, start: u32, first: u32, path: &mut Vec<u32>) -> Result<usize, PathError> {
        path.clear();
        path.push(start);

        let mut node = first;
        let mut hops = 0usize;
        while node != 0 {
            hops += 1;
            if hops >= self.max_path_len {
                return Err(match path.iter().rposition(|&seen| seen == node) {
                    Some(pos) => PathError::IllegalCycle { len: hops - pos },
                    None => PathError::MaxPathLenExceeded,
                });
            }
            path.push(node);
            node = self.parent(node);
        }
        Ok(hops)
    }

    /// Walk from `start` to its root
    pub fn path_to_root(&self, start: u32, path: &mut Vec<u32>) -> Result<usize, PathError> {
        self.walk(start, self.parent(start), path)
    }

    /// Reverse the pointers along `path[0..=n]` and hang `path[0]` off `target`.
    ///
    /// After this the old root points back down the path and the whole tree
    /// is reachable from `target`.
    pub fn reroot(&self, path: &[u32], n: usize, target: u32) {
        for i in (0..n).rev() {
            self.set_parent(path[i + 1], path[i]);
        }
        self.set_parent(path[0], target);
    }

    /// Check that every node reaches a root within the hop cap
    pub fn check_invariant(&self) -> Result<(), PathError> {
        let mut path = Vec::with_capacity(self.max_path_len);
        for node in 1..self.parents.len() as u32 {
            self.path_to_root(node, &mut path)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Forest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forest")
            .field("slots", &self.parents.len())
            .field("max_path_len", &self.max_path_len)
            .finish()
    }
}
