use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic data generator seeded for reproducible benchmarks.
pub struct DataGenerator {
    rng: StdRng,
}

impl DataGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `count` uniformly distributed values in `0..max`. A `max` of 0 yields all zeros.
    pub fn uniform_u32_below(&mut self, count: usize, max: u32) -> Vec<u32> {
        if max == 0 {
            return vec![0; count];
        }
        (0..count).map(|_| self.rng.gen_range(0..max)).collect()
    }
}
