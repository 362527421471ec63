//! Properties of the binary refinement bookkeeping.

use proptest::prelude::*;
use quadrature::{determine_eval_set, inner_index, navigate};

proptest! {
    /// The (level, offset) pair recovered for an outer index names the same
    /// grid point, measured in units of the finest step.
    #[test]
    fn owner_reconstructs_grid_point(depth in 0u32..12, outer in 1u64..20_000) {
        let level = determine_eval_set(outer, depth);
        let inner = inner_index(outer, depth, level) as u64;
        let position = if level == 0 {
            (1 + inner) << depth
        } else {
            (1 + 2 * inner) << (depth - level)
        };
        prop_assert_eq!(position, outer);
    }

    /// Every level is read in order without gaps, which is what lets the
    /// caches append instead of index.
    #[test]
    fn navigate_reads_each_level_in_order(levels in 1usize..9, max_iter in 1u64..4_000) {
        let mut next_expected = vec![0usize; levels];
        for step in navigate(levels, max_iter) {
            prop_assert_eq!(step.inner, next_expected[step.level]);
            next_expected[step.level] += 1;
        }
    }

    /// Odd outer indices always land on the newest level.
    #[test]
    fn odd_samples_are_new(levels in 1usize..9, outer in 0u64..10_000) {
        let outer = 2 * outer + 1;
        let depth = (levels - 1) as u32;
        prop_assert_eq!(determine_eval_set(outer, depth), depth);
    }
}
