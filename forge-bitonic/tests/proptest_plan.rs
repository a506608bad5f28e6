//! Property-based tests: random sizes, widths and inputs against the CPU reference kernel.

mod common;

use common::assert_sorted_permutation;
use forge_bitonic::{is_local, plan, sort_cpu, Mode};
use proptest::prelude::*;

fn pow2_len() -> impl Strategy<Value = usize> {
    (1u32..=13).prop_map(|e| 1usize << e)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_sorts_any_input(
        (data, w) in pow2_len().prop_flat_map(|n| {
            (prop::collection::vec(any::<u32>(), n), 1usize..=2048)
        })
    ) {
        let mut actual = data.clone();
        sort_cpu(&mut actual, w).unwrap();
        assert_sorted_permutation(&data, &actual, &format!("n={} W={}", data.len(), w));
    }

    #[test]
    fn prop_local_modes_respect_threshold(n in pow2_len(), w in 1usize..=4096) {
        let p = plan(n, w).unwrap();
        let g = p.group_width();
        prop_assert!(g <= w && g <= n / 2 && g.is_power_of_two());
        for d in p.descriptors() {
            let local = matches!(d.mode, Mode::LocalBitonicMerge | Mode::LocalDisperse);
            prop_assert_eq!(local, is_local(d.span, g));
        }
    }

    #[test]
    fn prop_rejects_non_power_of_two(n in 3usize..100_000, w in 1usize..2048) {
        prop_assume!(!n.is_power_of_two());
        prop_assert!(plan(n, w).is_err());
    }
}
