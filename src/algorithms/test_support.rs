//! Synthetic oracles shared by the unit tests

use super::oracle::{EdgeOracle, Side};

/// Oracle backed by an explicit edge list; nonce `i` is `edges[i]`
#[derive(Debug, Clone)]
pub struct TableOracle {
    half_size: u32,
    edges: Vec<(u32, u32)>,
}

impl TableOracle {
    pub fn new(half_size: u32, edges: Vec<(u32, u32)>) -> Self {
        assert!(half_size.is_power_of_two());
        assert!(edges.iter().all(|&(u, v)| u < half_size && v < half_size));
        Self { half_size, edges }
    }
}

impl EdgeOracle for TableOracle {
    fn half_size(&self) -> u32 {
        self.half_size
    }

    fn node(&self, nonce: u64, side: Side) -> u32 {
        let (u, v) = self.edges[nonce as usize];
        match side {
            Side::U => u,
            Side::V => v,
        }
    }
}

/// One 4-cycle on nonces {1, 3, 6, 8} hidden among a 4-path and two loose edges
pub fn planted_square() -> TableOracle {
    TableOracle::new(
        16,
        vec![
            (2, 2),
            (0, 0),
            (3, 2),
            (1, 0),
            (3, 3),
            (10, 10),
            (1, 1),
            (4, 3),
            (0, 1),
            (11, 11),
        ],
    )
}

/// A path where edge `k` joins the tree `k` hops away from its new endpoint
pub fn chain(edges: u32, half_size: u32) -> TableOracle {
    let edges = (0..edges)
        .map(|k| if k % 2 == 0 { (k / 2, k / 2) } else { ((k + 1) / 2, (k - 1) / 2) })
        .collect();
    TableOracle::new(half_size, edges)
}

/// `count` vertex-disjoint 4-cycles, square `k` on nonces `4k..4k+4`
pub fn disjoint_squares(count: u32, half_size: u32) -> TableOracle {
    let edges = (0..count)
        .flat_map(|k| {
            let a = 2 * k;
            [(a, a), (a + 1, a), (a + 1, a + 1), (a, a + 1)]
        })
        .collect();
    TableOracle::new(half_size, edges)
}
