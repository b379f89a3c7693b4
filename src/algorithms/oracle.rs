// src/algorithms/oracle.rs - Edge oracle contract consumed by the solvers
// Tree location: ./src/algorithms/oracle.rs

//! Edge oracle interface
//!
//! The solvers never look inside the edge generator. All they need is the
//! size of each half of the node space and a way to turn a nonce into the
//! node it touches on either side of the bipartite graph.

/// Side of the bipartite graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// U side (even hash inputs)
    U = 0,
    /// V side (odd hash inputs)
    V = 1,
}

impl Side {
    /// Both sides, in the order the trimmer visits them
    pub const BOTH: [Side; 2] = [Side::U, Side::V];

    /// Flag mixed into the hash input for this side
    #[inline]
    pub fn flag(self) -> u64 {
        self as u64
    }
}

/// Deterministic nonce to edge mapping
///
/// Implementations must be pure: the same nonce and side always give the same
/// node, whatever thread asks.
pub trait EdgeOracle: Send + Sync {
    /// Number of nodes on each side (a power of two)
    fn half_size(&self) -> u32;

    /// Node on `side` for `nonce`, in `[0, half_size)`
    fn node(&self, nonce: u64, side: Side) -> u32;

    /// Both raw endpoints of the edge for `nonce`
    #[inline]
    fn edge(&self, nonce: u64) -> (u32, u32) {
        (self.node(nonce, Side::U), self.node(nonce, Side::V))
    }

    /// Edge with side offsets applied, as stored in the forest.
    ///
    /// U nodes land in `[1, half]` and V nodes in `[half + 1, 2 * half]`,
    /// leaving 0 free as the root marker.
    #[inline]
    fn forest_edge(&self, nonce: u64) -> (u32, u32) {
        let (u, v) = self.edge(nonce);
        (1 + u, 1 + self.half_size() + v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::TableOracle;

    #[test]
    fn test_side_flags() {
        assert_eq!(Side::U.flag(), 0);
        assert_eq!(Side::V.flag(), 1);
        assert_eq!(Side::BOTH, [Side::U, Side::V]);
    }

    #[test]
    fn test_forest_edge_offsets() {
        let oracle = TableOracle::new(8, vec![(0, 0), (7, 7), (3, 5)]);

        assert_eq!(oracle.forest_edge(0), (1, 9));
        assert_eq!(oracle.forest_edge(1), (8, 16));
        assert_eq!(oracle.forest_edge(2), (4, 14));

        // U and V ranges never overlap and never touch the root marker
        for nonce in 0..3 {
            let (u, v) = oracle.forest_edge(nonce);
            assert!(u >= 1 && u <= 8);
            assert!(v >= 9 && v <= 16);
        }
    }
}
