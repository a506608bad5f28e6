#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Route `log` output through env_logger once per test binary.
pub fn init_logging() {
    env_logger::builder()
        .filter_module("forge_bitonic", log::LevelFilter::Debug)
        .parse_default_env()
        .is_test(true)
        .try_init()
        .ok();
}

/// `n` values in `0..1_000_000`, the range the benchmark draws from.
pub fn random_u32(seed: u64, n: usize) -> Vec<u32> {
    let mut rng = seeded_rng(seed);
    (0..n).map(|_| rng.gen_range(0..1_000_000)).collect()
}

/// Named input orderings that stress different parts of the network.
pub fn input_patterns(seed: u64, n: usize) -> Vec<(&'static str, Vec<u32>)> {
    let mut rng = seeded_rng(seed);
    vec![
        ("random", random_u32(seed, n)),
        ("full_range", (0..n).map(|_| rng.gen()).collect()),
        ("sorted", (0..n as u32).collect()),
        ("reversed", (0..n as u32).rev().collect()),
        ("constant", vec![0xDEAD_BEEF; n]),
        ("few_distinct", (0..n).map(|_| rng.gen_range(0..4)).collect()),
        ("sawtooth", (0..n as u32).map(|i| i % 17).collect()),
    ]
}

/// Check `actual` is the sorted permutation of `original`, reporting the first difference.
pub fn assert_sorted_permutation(original: &[u32], actual: &[u32], context: &str) {
    let mut expected = original.to_vec();
    expected.sort_unstable();
    if let Some(i) = actual.iter().zip(expected.iter()).position(|(a, b)| a != b) {
        panic!(
            "{}: mismatch at index {} (got {}, expected {})",
            context, i, actual[i], expected[i]
        );
    }
    assert_eq!(actual.len(), expected.len(), "{}: length changed", context);
}
