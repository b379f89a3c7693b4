// src/algorithms/verify.rs - Proof verification
// Tree location: ./src/algorithms/verify.rs

//! Proof verification
//!
//! A proof is `N` strictly increasing nonces below the easiness whose edges
//! form one cycle: starting from the first edge, alternately hop to the unique
//! other edge sharing its V node, then the unique other edge sharing its U
//! node, and arrive back at the first edge after exactly `N` edges.

use thiserror::Error;

use super::oracle::EdgeOracle;

/// Reasons a nonce set is not a valid proof
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// A nonce is outside `[0, easiness)`
    #[error("nonce {nonce} not below easiness {easiness}")]
    TooBig {
        /// Offending nonce
        nonce: u64,
        /// Easiness the proof was checked against
        easiness: u64,
    },

    /// Nonces are not strictly increasing
    #[error("nonces not strictly increasing at position {index}")]
    TooSmall {
        /// Position of the first out-of-order nonce
        index: usize,
    },

    /// A node is shared by more than two proof edges
    #[error("branch in cycle")]
    Branch,

    /// A node is touched by only one proof edge
    #[error("cycle dead-ends")]
    DeadEnd,

    /// The edges close a cycle shorter than the proof
    #[error("cycle too short")]
    ShortCycle,
}

/// Check that `nonces` is a valid cycle proof for `oracle`
pub fn verify<O, const N: usize>(
    oracle: &O,
    nonces: &[u64; N],
    easiness: u64,
) -> Result<(), VerifyError>
where
    O: EdgeOracle + ?Sized,
{
    let mut us = [0u32; N];
    let mut vs = [0u32; N];

    for (index, &nonce) in nonces.iter().enumerate() {
        if nonce >= easiness {
            return Err(VerifyError::TooBig { nonce, easiness });
        }
        if index > 0 && nonce <= nonces[index - 1] {
            return Err(VerifyError::TooSmall { index });
        }
        (us[index], vs[index]) = oracle.edge(nonce);
    }

    // Follow the cycle until we are back at edge 0; `remaining` edges left to visit
    let mut remaining = N;
    let mut i = 0usize;
    while remaining > 0 {
        let j = unique_partner(&vs, i)?;
        i = unique_partner(&us, j)?;
        remaining = remaining.saturating_sub(2);
        if i == 0 {
            break;
        }
    }

    if remaining == 0 {
        Ok(())
    } else {
        Err(VerifyError::ShortCycle)
    }
}

/// The one edge other than `i` sharing its node in `nodes`
fn unique_partner(nodes: &[u32], i: usize) -> Result<usize, VerifyError> {
    let mut partner = None;
    for (k, &node) in nodes.iter().enumerate() {
        if k != i && node == nodes[i] {
            if partner.is_some() {
                return Err(VerifyError::Branch);
            }
            partner = Some(k);
        }
    }
    partner.ok_or(VerifyError::DeadEnd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::TableOracle;

    fn squares() -> TableOracle {
        // nonces 0..4: square on U{0,1} x V{0,1}; nonces 4..8: 4-path; 8..: extra
        TableOracle::new(
            16,
            vec![
                (0, 0),
                (1, 0),
                (1, 1),
                (0, 1),
                (2, 2),
                (3, 2),
                (3, 3),
                (4, 3),
                (0, 2),
                (5, 5),
                (5, 5),
            ],
        )
    }

    #[test]
    fn test_valid_square() {
        let oracle = squares();
        assert_eq!(verify(&oracle, &[0, 1, 2, 3], 11), Ok(()));
    }

    #[test]
    fn test_out_of_range_nonce() {
        let oracle = squares();
        assert_eq!(
            verify(&oracle, &[0, 1, 2, 3], 3),
            Err(VerifyError::TooBig { nonce: 3, easiness: 3 })
        );
    }

    #[test]
    fn test_unsorted_nonces() {
        let oracle = squares();
        assert_eq!(
            verify(&oracle, &[0, 2, 1, 3], 11),
            Err(VerifyError::TooSmall { index: 2 })
        );
        assert_eq!(
            verify(&oracle, &[0, 1, 1, 3], 11),
            Err(VerifyError::TooSmall { index: 2 })
        );
    }

    #[test]
    fn test_open_path_dead_ends() {
        let oracle = squares();
        assert_eq!(verify(&oracle, &[4, 5, 6, 7], 11), Err(VerifyError::DeadEnd));
    }

    #[test]
    fn test_branching_edges() {
        // V node 0 is shared by three proof edges
        let oracle = TableOracle::new(16, vec![(0, 0), (1, 0), (2, 0), (3, 1)]);
        assert_eq!(verify(&oracle, &[0, 1, 2, 3], 4), Err(VerifyError::Branch));
    }

    #[test]
    fn test_unconnected_duplicates_dead_end() {
        let oracle = squares();
        assert_eq!(
            verify(&oracle, &[0, 1, 9, 10], 11),
            Err(VerifyError::DeadEnd)
        );
    }

    #[test]
    fn test_two_squares_are_short_cycles() {
        let oracle = TableOracle::new(
            16,
            vec![
                (0, 0),
                (1, 0),
                (1, 1),
                (0, 1),
                (2, 2),
                (3, 2),
                (3, 3),
                (2, 3),
            ],
        );
        assert_eq!(
            verify(&oracle, &[0, 1, 2, 3, 4, 5, 6, 7], 8),
            Err(VerifyError::ShortCycle)
        );
    }
}
