//! Random number generation for the object engine
//!
//! Uses a seeded ChaCha RNG so that placement choices are reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seeded generator owned by a [`crate::World`]
///
/// Serializes as its seed alone, so a restored world replays the stream
/// from the start rather than from where it was saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl From<u64> for GameRng {
    fn from(seed: u64) -> Self {
        GameRng::new(seed)
    }
}

impl From<GameRng> for u64 {
    fn from(rng: GameRng) -> u64 {
        rng.seed
    }
}

impl Default for GameRng {
    fn default() -> Self {
        GameRng::new(0)
    }
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        GameRng {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Generator with a seed drawn from the operating system
    pub fn from_entropy() -> Self {
        GameRng::new(rand::random())
    }

    /// Seed this generator started from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns 0..n-1, or 0 if n is 0.
    pub fn rn2(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.inner.gen_range(0..n)
    }

    /// Uniform index into a collection of `len` elements.
    ///
    /// Returns 0 if len is 0.
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.inner.gen_range(0..len)
    }

    /// Uniformly chosen element of `items`
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let i = self.index(items.len());
        items.get(i)
    }

    /// Swap every element of `arr[begin..end]` with a random element of the same range.
    pub fn permute<T>(&mut self, arr: &mut [T], begin: usize, end: usize) {
        let len = end.saturating_sub(begin);
        if len == 0 {
            return;
        }
        for i in begin..end {
            let j = begin + self.index(len);
            arr.swap(i, j);
        }
    }
}
