//! CPU comparison sorts the bitonic network is measured against.

use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    /// `slice::sort_unstable` on one thread.
    SortUnstable,
    /// rayon `par_sort_unstable`.
    ParSortUnstable,
}

impl Baseline {
    pub const ALL: [Baseline; 2] = [Baseline::SortUnstable, Baseline::ParSortUnstable];

    pub fn name(self) -> &'static str {
        match self {
            Baseline::SortUnstable => "sort_unstable",
            Baseline::ParSortUnstable => "par_sort_unstable",
        }
    }

    pub fn sort(self, data: &mut [u32]) {
        match self {
            Baseline::SortUnstable => data.sort_unstable(),
            Baseline::ParSortUnstable => data.par_sort_unstable(),
        }
    }
}
