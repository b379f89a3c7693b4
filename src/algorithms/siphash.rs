//! SipHash edge oracle
//!
//! Cuckoo Cycle graphs are generated with the single-word SipHash-2-4 variant:
//! the node for a nonce on side `s` is `siphash24(2 * nonce + s)` masked to the
//! half size. The 128-bit SipHash key is derived from the header with BLAKE2b.

use blake2::{Blake2b512, Digest};
use byteorder::{ByteOrder, LittleEndian};

use super::oracle::{EdgeOracle, Side};
use super::SolverError;

/// Smallest supported node-space shift
pub const MIN_NODE_BITS: u32 = 2;
/// Largest supported node-space shift (node ids must fit `u32` after offsets)
pub const MAX_NODE_BITS: u32 = 31;

/// SipHash-2-4 keyed from a header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SipHasher {
    k0: u64,
    k1: u64,
}

impl SipHasher {
    /// Derive the SipHash key from the first 16 bytes of BLAKE2b-512(header)
    pub fn new(header: &[u8]) -> Self {
        let digest = Blake2b512::digest(header);
        let k0 = LittleEndian::read_u64(&digest[0..8]);
        let k1 = LittleEndian::read_u64(&digest[8..16]);
        Self { k0, k1 }
    }

    /// Build a hasher from explicit key words
    pub fn from_keys(k0: u64, k1: u64) -> Self {
        Self { k0, k1 }
    }

    /// Key words `(k0, k1)`
    pub fn keys(&self) -> (u64, u64) {
        (self.k0, self.k1)
    }

    /// Hash a single 64-bit word
    pub fn siphash24(&self, input: u64) -> u64 {
        let mut v0 = 0x736f6d6570736575u64 ^ self.k0;
        let mut v1 = 0x646f72616e646f6du64 ^ self.k1;
        let mut v2 = 0x6c7967656e657261u64 ^ self.k0;
        let mut v3 = 0x7465646279746573u64 ^ self.k1;

        v3 ^= input;
        for _ in 0..2 {
            sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        }
        v0 ^= input;

        v2 ^= 0xff;
        for _ in 0..4 {
            sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        }

        v0 ^ v1 ^ v2 ^ v3
    }
}

/// Single round of SipHash
#[inline]
fn sipround(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
    *v0 = v0.wrapping_add(*v1);
    *v1 = v1.rotate_left(13);
    *v1 ^= *v0;
    *v0 = v0.rotate_left(32);

    *v2 = v2.wrapping_add(*v3);
    *v3 = v3.rotate_left(16);
    *v3 ^= *v2;

    *v0 = v0.wrapping_add(*v3);
    *v3 = v3.rotate_left(21);
    *v3 ^= *v0;

    *v2 = v2.wrapping_add(*v1);
    *v1 = v1.rotate_left(17);
    *v1 ^= *v2;
    *v2 = v2.rotate_left(32);
}

/// Production edge oracle for a `2^node_bits` node graph
#[derive(Clone, Debug)]
pub struct SipOracle {
    hasher: SipHasher,
    node_bits: u32,
    node_mask: u32,
}

impl SipOracle {
    /// Create an oracle for `header` over `2^node_bits` nodes
    pub fn new(header: &[u8], node_bits: u32) -> Result<Self, SolverError> {
        Self::with_hasher(SipHasher::new(header), node_bits)
    }

    /// Create an oracle around an existing hasher
    pub fn with_hasher(hasher: SipHasher, node_bits: u32) -> Result<Self, SolverError> {
        if !(MIN_NODE_BITS..=MAX_NODE_BITS).contains(&node_bits) {
            return Err(SolverError::InvalidParameter(format!(
                "node bits must be in {}..={}, got {}",
                MIN_NODE_BITS, MAX_NODE_BITS, node_bits
            )));
        }
        Ok(Self {
            hasher,
            node_bits,
            node_mask: (1u32 << (node_bits - 1)) - 1,
        })
    }

    /// Total node-space shift
    pub fn node_bits(&self) -> u32 {
        self.node_bits
    }

    /// Underlying keyed hasher
    pub fn hasher(&self) -> &SipHasher {
        &self.hasher
    }
}

impl EdgeOracle for SipOracle {
    #[inline]
    fn half_size(&self) -> u32 {
        1u32 << (self.node_bits - 1)
    }

    #[inline]
    fn node(&self, nonce: u64, side: Side) -> u32 {
        let hash = self.hasher.siphash24(nonce.wrapping_mul(2) | side.flag());
        (hash as u32) & self.node_mask
    }
}
