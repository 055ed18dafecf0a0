//! Deterministic RNG for simulation runs
//!
//! One `SimRng` is owned by each run and passed by `&mut` into every sampling
//! operation. There is no global generator.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};

/// Seeded random source for one simulation run
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: ChaCha8Rng,
}

impl SimRng {
    /// Create a new RNG from a seed
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Derive an independent child RNG from the current stream
    ///
    /// Used to hand each run of an ensemble its own generator.
    pub fn fork(&mut self) -> Self {
        let seed = self.inner.next_u64();
        Self::new(seed)
    }

    /// Uniform f64 in [0, 1)
    pub fn uniform(&mut self) -> f64 {
        self.inner.random::<f64>()
    }

    /// Uniform index in `0..n`; `n` must be non-zero
    pub fn index_below(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "index_below called with n = 0");
        self.inner.random_range(0..n)
    }

    /// Two distinct uniform indices in `0..n`, `None` if `n < 2`
    ///
    /// The second index is drawn from `n - 1` slots and shifted past the
    /// first, so every ordered pair is equally likely.
    pub fn distinct_pair(&mut self, n: usize) -> Option<(usize, usize)> {
        if n < 2 {
            return None;
        }
        let first = self.index_below(n);
        let mut second = self.index_below(n - 1);
        if second >= first {
            second += 1;
        }
        Some((first, second))
    }

    /// Return true with probability `p`
    ///
    /// Probabilities at or beyond 0 and 1 are decided without consuming a draw.
    pub fn bernoulli(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.uniform() < p
        }
    }

    /// Exponential waiting time with the given rate, `None` unless `rate` is positive and finite
    pub fn exponential(&mut self, rate: f64) -> Option<f64> {
        if !(rate > 0.0 && rate.is_finite()) {
            return None;
        }
        Exp::new(rate).ok().map(|dist| dist.sample(&mut self.inner))
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }
}
