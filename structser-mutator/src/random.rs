use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};

/// The only source of randomness used while mutating.
///
/// Identical seeds and identical call sequences produce identical outputs.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from system entropy. The chosen seed is logged so that a run can be reproduced.
    pub fn from_entropy() -> Self {
        let seed = rand::random::<u64>();
        tracing::info!(seed, "seeding random source from entropy");
        Self::new(seed)
    }

    /// A uniformly distributed integer in `[0, n)`. Returns 0 when `n` is 0.
    pub fn uniform(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// True with probability `p`. Probabilities outside `[0, 1]` saturate.
    pub fn chance(&mut self, p: f64) -> bool {
        if p.is_nan() || p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.rng.gen_bool(p)
    }

    pub fn sample<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }
}
