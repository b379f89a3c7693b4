//! Word-packed atomic sets used by the trimming variant
//!
//! - [`AliveSet`]: one bit per nonce, starts full and only ever loses members.
//! - [`TwiceSet`]: two bits per node counting sightings as 0, 1 or "2 or more".

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Nonces per alive-set word; also the block size the trimmer scans
pub const NONCE_BLOCK: u64 = 32;

/// Shrinking membership set over `[0, capacity)`
pub struct AliveSet {
    words: Box<[AtomicU32]>,
    removed: Box<[AtomicU64]>,
    capacity: u64,
}

impl AliveSet {
    /// Create a full set of `capacity` nonces with one removal counter per worker
    pub fn new(capacity: u64, workers: usize) -> Self {
        let nwords = capacity.div_ceil(NONCE_BLOCK) as usize;
        let words = (0..nwords)
            .map(|w| {
                let remaining = capacity - w as u64 * NONCE_BLOCK;
                let bits = if remaining >= NONCE_BLOCK {
                    u32::MAX
                } else {
                    (1u32 << remaining) - 1
                };
                AtomicU32::new(bits)
            })
            .collect();
        let removed = (0..workers.max(1)).map(|_| AtomicU64::new(0)).collect();

        Self {
            words,
            removed,
            capacity,
        }
    }

    /// Number of nonces the set started with
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Whether `nonce` is still alive
    #[inline]
    pub fn test(&self, nonce: u64) -> bool {
        if nonce >= self.capacity {
            return false;
        }
        let word = self.words[(nonce / NONCE_BLOCK) as usize].load(Ordering::Relaxed);
        (word >> (nonce % NONCE_BLOCK)) & 1 == 1
    }

    /// Membership bits for the 32 nonces starting at `block` (a multiple of 32)
    #[inline]
    pub fn block(&self, block: u64) -> u32 {
        self.words[(block / NONCE_BLOCK) as usize].load(Ordering::Relaxed)
    }

    /// Remove `nonce`, charging the removal to `worker`
    #[inline]
    pub fn reset(&self, nonce: u64, worker: usize) {
        let mask = 1u32 << (nonce % NONCE_BLOCK);
        let prev = self.words[(nonce / NONCE_BLOCK) as usize].fetch_and(!mask, Ordering::Relaxed);
        if prev & mask != 0 {
            self.removed[worker].fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of nonces still alive
    pub fn count(&self) -> u64 {
        let removed: u64 = self
            .removed
            .iter()
            .map(|r| r.load(Ordering::Relaxed))
            .sum();
        self.capacity - removed
    }

    /// Alive nonces in increasing order
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.capacity).filter(move |&nonce| self.test(nonce))
    }
}

/// Saturating 0/1/2+ occupancy counter over nodes
///
/// The "once" bit is claimed with `fetch_or`, so of two concurrent sightings
/// exactly one sees it already set and raises the "twice" bit.
pub struct TwiceSet {
    words: Box<[AtomicU32]>,
    len: usize,
}

impl TwiceSet {
    /// Create an empty counter over `len` nodes
    pub fn new(len: usize) -> Self {
        let words = (0..len.div_ceil(16)).map(|_| AtomicU32::new(0)).collect();
        Self { words, len }
    }

    /// Number of nodes tracked
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the counter tracks no nodes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Clear every counter
    pub fn reset(&self) {
        for word in self.words.iter() {
            word.store(0, Ordering::Relaxed);
        }
    }

    /// Record one sighting of `node`
    #[inline]
    pub fn set(&self, node: u32) {
        let word = &self.words[(node / 16) as usize];
        let once = 1u32 << (2 * (node % 16));
        let twice = once << 1;
        let old = word.fetch_or(once, Ordering::Relaxed);
        if old & (once | twice) == once {
            word.fetch_or(twice, Ordering::Relaxed);
        }
    }

    /// Whether `node` was seen at least twice
    #[inline]
    pub fn test(&self, node: u32) -> bool {
        let word = self.words[(node / 16) as usize].load(Ordering::Relaxed);
        (word >> (2 * (node % 16))) & 2 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_alive_set_starts_full_with_masked_tail() {
        let alive = AliveSet::new(40, 1);
        assert_eq!(alive.count(), 40);
        assert!(alive.test(0));
        assert!(alive.test(39));
        assert!(!alive.test(40));
        assert_eq!(alive.block(0), u32::MAX);
        assert_eq!(alive.block(32), 0xff);
    }

    #[test]
    fn test_alive_set_reset_is_counted_once() {
        let alive = AliveSet::new(64, 2);
        alive.reset(5, 0);
        alive.reset(5, 1);
        alive.reset(63, 1);

        assert!(!alive.test(5));
        assert!(!alive.test(63));
        assert_eq!(alive.count(), 62);
        assert_eq!(alive.iter().count(), 62);
    }

    #[test]
    fn test_alive_set_concurrent_resets() {
        let alive = AliveSet::new(4096, 4);
        thread::scope(|scope| {
            for worker in 0..4 {
                let alive = &alive;
                scope.spawn(move || {
                    // each worker clears even nonces of its own 32-blocks
                    let mut block = worker as u64 * NONCE_BLOCK;
                    while block < 4096 {
                        for nonce in (block..block + NONCE_BLOCK).step_by(2) {
                            alive.reset(nonce, worker);
                        }
                        block += 4 * NONCE_BLOCK;
                    }
                });
            }
        });
        assert_eq!(alive.count(), 2048);
        assert!(alive.iter().all(|nonce| nonce % 2 == 1));
    }

    #[test]
    fn test_twice_set_saturates() {
        let counter = TwiceSet::new(100);
        assert!(!counter.test(42));

        counter.set(42);
        assert!(!counter.test(42));

        counter.set(42);
        assert!(counter.test(42));

        counter.set(42);
        assert!(counter.test(42));

        // neighbours sharing the word are unaffected
        assert!(!counter.test(41));
        assert!(!counter.test(43));

        counter.reset();
        assert!(!counter.test(42));
    }
}
