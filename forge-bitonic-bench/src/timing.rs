//! Wall-clock timing for benchmark measurement.

use std::time::Instant;

/// Simple wall-clock timer.
pub struct BenchTimer {
    start: Instant,
}

impl BenchTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time in milliseconds.
    pub fn stop(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Sort a fresh copy of `input` with `sort_fn` and time only the sort.
///
/// Returns the elapsed milliseconds and the sorted copy.
pub fn time_sort<E>(
    input: &[u32],
    mut sort_fn: impl FnMut(&mut [u32]) -> Result<(), E>,
) -> Result<(f64, Vec<u32>), E> {
    let mut data = input.to_vec();
    let timer = BenchTimer::start();
    sort_fn(&mut data)?;
    Ok((timer.stop(), data))
}
