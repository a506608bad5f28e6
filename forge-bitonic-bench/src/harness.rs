//! Measurement harness: runs the bitonic sort and the CPU baselines through warmup
//! and measured loops at each size and returns structured [`DataPoint`] results.

use serde::Serialize;

use forge_bitonic::{plan, CpuKernel, SortError};

use crate::cpu_baselines::Baseline;
use crate::data_gen::DataGenerator;
use crate::stats::{compute_stats, Stats};
use crate::timing::time_sort;

/// A kernel the harness can drive through a full bitonic sort.
pub trait BitonicBackend {
    fn name(&self) -> &'static str;

    /// Largest group width the backend accepts.
    fn max_group_width(&self) -> usize;

    fn sort(&mut self, data: &mut [u32], max_group_width: usize) -> Result<(), SortError>;
}

impl BitonicBackend for CpuKernel {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn max_group_width(&self) -> usize {
        usize::MAX
    }

    fn sort(&mut self, data: &mut [u32], max_group_width: usize) -> Result<(), SortError> {
        forge_bitonic::sort(data, max_group_width, self)
    }
}

#[cfg(target_os = "macos")]
impl BitonicBackend for forge_bitonic::MetalKernel {
    fn name(&self) -> &'static str {
        "metal"
    }

    fn max_group_width(&self) -> usize {
        forge_bitonic::MetalKernel::max_group_width(self)
    }

    fn sort(&mut self, data: &mut [u32], max_group_width: usize) -> Result<(), SortError> {
        self.sort_u32(data, max_group_width)
    }
}

/// Timings for one sorting method at one size.
#[derive(Debug, Clone, Serialize)]
pub struct SortRun {
    pub method: String,
    /// Whether the validation run produced a non-decreasing result.
    pub sorted: bool,
    pub stats: Stats,
}

/// Shape of the bitonic plan used at one size.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlanSummary {
    pub group_width: usize,
    pub group_count: usize,
    pub dispatches: usize,
    pub barriers: usize,
}

/// A single benchmark data point at one size.
#[derive(Debug, Clone, Serialize)]
pub struct DataPoint {
    pub size: usize,
    pub plan: PlanSummary,
    pub bitonic: SortRun,
    pub baselines: Vec<SortRun>,
    /// `sort_unstable` mean / bitonic mean.
    pub speedup: f64,
}

/// Configuration for a benchmark run.
pub struct BenchConfig {
    pub sizes: Vec<usize>,
    pub runs: u32,
    pub warmup: u32,
    pub max_group_width: usize,
    pub max_value: u32,
    pub seed: u64,
}

impl BenchConfig {
    /// The group width actually requested from `backend`.
    pub fn effective_group_width(&self, backend: &dyn BitonicBackend) -> usize {
        self.max_group_width.min(backend.max_group_width())
    }
}

fn measure<E>(
    config: &BenchConfig,
    input: &[u32],
    mut sort_fn: impl FnMut(&mut [u32]) -> Result<(), E>,
) -> Result<(bool, Stats), E> {
    let (_, validated) = time_sort(input, &mut sort_fn)?;
    let sorted = validated.is_sorted();

    for _ in 0..config.warmup {
        time_sort(input, &mut sort_fn)?;
    }
    let times = (0..config.runs)
        .map(|_| time_sort(input, &mut sort_fn).map(|(ms, _)| ms))
        .collect::<Result<Vec<f64>, E>>()?;
    Ok((sorted, compute_stats(&times)))
}

/// Run the bitonic sort and every CPU baseline at one size.
///
/// For each method:
/// 1. one validation run (sortedness recorded)
/// 2. warmup loop (timings discarded)
/// 3. measured loop -> [`Stats`]
pub fn run_size(
    backend: &mut dyn BitonicBackend,
    config: &BenchConfig,
    size: usize,
    gen: &mut DataGenerator,
    progress_cb: Option<&dyn Fn(&str)>,
) -> Result<DataPoint, SortError> {
    let report = |msg: String| {
        if let Some(cb) = progress_cb {
            cb(&msg);
        }
    };

    let width = config.effective_group_width(backend);
    let p = plan(size, width)?;
    let summary = PlanSummary {
        group_width: p.group_width(),
        group_count: p.group_count(),
        dispatches: p.len(),
        barriers: p.barrier_count(),
    };

    let size_label = format_size(size);
    let input = gen.uniform_u32_below(size, config.max_value);
    log::debug!(
        "{} @ {}: {} dispatches, {} runs after {} warmup",
        backend.name(),
        size_label,
        summary.dispatches,
        config.runs,
        config.warmup
    );

    report(format!("{} @ {}: measuring", backend.name(), size_label));

    let (sorted, stats) = measure(config, &input, |data| backend.sort(data, width))?;
    let bitonic = SortRun {
        method: backend.name().to_string(),
        sorted,
        stats,
    };

    let baselines: Vec<SortRun> = Baseline::ALL
        .iter()
        .map(|&b| -> Result<SortRun, SortError> {
            report(format!("{} @ {}: measuring", b.name(), size_label));
            let (sorted, stats) = measure(config, &input, |data| {
                b.sort(data);
                Ok::<_, SortError>(())
            })?;
            Ok(SortRun {
                method: b.name().to_string(),
                sorted,
                stats,
            })
        })
        .collect::<Result<_, _>>()?;

    let speedup = if bitonic.stats.mean > 0.0 {
        baselines[0].stats.mean / bitonic.stats.mean
    } else {
        0.0
    };

    Ok(DataPoint {
        size,
        plan: summary,
        bitonic,
        baselines,
        speedup,
    })
}

/// Format a size for display (e.g., 1048576 -> "2^20").
pub fn format_size(size: usize) -> String {
    if size.is_power_of_two() && size >= 1024 {
        format!("2^{}", size.trailing_zeros())
    } else {
        format!("{}", size)
    }
}
