//! CPU reference kernel: the four bitonic passes over a `u32` slice.
//!
//! Groups map to rayon tasks. A local pass hands each task its own `2g`-element
//! block, mirroring a work-group resolving its cascade in local storage. Big passes
//! split every span-wide block into its two halves and compare-exchange the pairs
//! in parallel.

use rayon::prelude::*;

use crate::driver::{sort, DispatchKernel};
use crate::error::{KernelError, SortError};
use crate::plan::Mode;

/// Counters for the work a kernel instance has performed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KernelStats {
    pub dispatches: usize,
    pub barriers: usize,
}

/// Rayon-backed implementation of the bitonic passes.
#[derive(Debug, Default)]
pub struct CpuKernel {
    stats: KernelStats,
}

impl CpuKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> KernelStats {
        self.stats
    }
}

#[inline]
fn compare_and_swap(a: &mut u32, b: &mut u32) {
    if *a > *b {
        std::mem::swap(a, b);
    }
}

/// Flip at width `h` over one `h`-element block: element `i` pairs with `h - 1 - i`.
fn flip_block(block: &mut [u32]) {
    let half = block.len() / 2;
    let (lo, hi) = block.split_at_mut(half);
    for (a, b) in lo.iter_mut().zip(hi.iter_mut().rev()) {
        compare_and_swap(a, b);
    }
}

/// Disperse at width `h` over one `h`-element block: element `i` pairs with `i + h/2`.
fn disperse_block(block: &mut [u32]) {
    let half = block.len() / 2;
    let (lo, hi) = block.split_at_mut(half);
    for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
        compare_and_swap(a, b);
    }
}

/// Disperse cascade `h, h/2, ..., 2` over one group's elements.
fn local_disperse(group: &mut [u32], span: usize) {
    let mut h = span;
    while h > 1 {
        group.chunks_exact_mut(h).for_each(disperse_block);
        h /= 2;
    }
}

/// Bitonic build of every width from 2 up to `span` over one group's elements.
fn local_bitonic_merge(group: &mut [u32], span: usize) {
    let mut h = 2;
    while h <= span {
        group.chunks_exact_mut(h).for_each(flip_block);
        local_disperse(group, h / 2);
        h *= 2;
    }
}

/// Blocks narrower than this are compare-exchanged sequentially inside their task.
const PAR_PAIR_THRESHOLD: usize = 1 << 14;

fn big_flip(buffer: &mut [u32], span: usize) {
    buffer.par_chunks_exact_mut(span).for_each(|block| {
        if span < PAR_PAIR_THRESHOLD {
            return flip_block(block);
        }
        let (lo, hi) = block.split_at_mut(span / 2);
        lo.par_iter_mut()
            .zip(hi.par_iter_mut().rev())
            .for_each(|(a, b)| compare_and_swap(a, b));
    });
}

fn big_disperse(buffer: &mut [u32], span: usize) {
    buffer.par_chunks_exact_mut(span).for_each(|block| {
        if span < PAR_PAIR_THRESHOLD {
            return disperse_block(block);
        }
        let (lo, hi) = block.split_at_mut(span / 2);
        lo.par_iter_mut()
            .zip(hi.par_iter_mut())
            .for_each(|(a, b)| compare_and_swap(a, b));
    });
}

impl DispatchKernel for CpuKernel {
    type Buffer = [u32];

    fn invoke(
        &mut self,
        buffer: &mut [u32],
        span: usize,
        mode: Mode,
        group_count: usize,
    ) -> Result<(), KernelError> {
        let len = buffer.len();
        let invalid = || KernelError::InvalidDispatch {
            mode,
            span,
            group_count,
            len,
        };

        if group_count == 0 || len % (2 * group_count) != 0 {
            return Err(invalid());
        }
        let group_elems = len / group_count;
        if span < 2 || !span.is_power_of_two() || span > len {
            return Err(invalid());
        }
        if mode.is_local() && span > group_elems {
            return Err(invalid());
        }

        match mode {
            Mode::LocalBitonicMerge => buffer
                .par_chunks_exact_mut(group_elems)
                .for_each(|group| local_bitonic_merge(group, span)),
            Mode::LocalDisperse => buffer
                .par_chunks_exact_mut(group_elems)
                .for_each(|group| local_disperse(group, span)),
            Mode::BigFlip => big_flip(buffer, span),
            Mode::BigDisperse => big_disperse(buffer, span),
        }

        self.stats.dispatches += 1;
        Ok(())
    }

    fn barrier(&mut self, _buffer: &mut [u32]) -> Result<(), KernelError> {
        // rayon joins every task before a dispatch returns; nothing is in flight.
        self.stats.barriers += 1;
        Ok(())
    }
}

/// Sort `data` in place with the CPU reference kernel.
pub fn sort_cpu(data: &mut [u32], max_group_width: usize) -> Result<KernelStats, SortError> {
    let mut kernel = CpuKernel::new();
    sort(data, max_group_width, &mut kernel)?;
    Ok(kernel.stats())
}
