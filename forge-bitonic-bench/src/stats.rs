use serde::{Deserialize, Serialize};

/// Descriptive statistics for a set of timing samples, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
    pub cv_percent: f64,
    pub sample_count: usize,
    pub outliers_removed: usize,
}

/// Compute descriptive statistics from timing samples.
///
/// Values outside [Q1 - 1.5*IQR, Q3 + 1.5*IQR] are dropped first, unless that would
/// leave fewer than two samples.
pub fn compute_stats(samples: &[f64]) -> Stats {
    match samples {
        [] => return Stats::default(),
        [only] => {
            return Stats {
                mean: *only,
                median: *only,
                min: *only,
                max: *only,
                sample_count: 1,
                ..Stats::default()
            }
        }
        _ => {}
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let fence = 1.5 * (q3 - q1);
    let filtered: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| (q1 - fence..=q3 + fence).contains(v))
        .collect();
    let data = if filtered.len() >= 2 { &filtered } else { &sorted };

    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    Stats {
        mean,
        median: percentile(data, 50.0),
        min: data[0],
        max: data[data.len() - 1],
        stddev,
        cv_percent: if mean > 0.0 { stddev / mean * 100.0 } else { 0.0 },
        sample_count: data.len(),
        outliers_removed: samples.len() - data.len(),
    }
}

/// Percentile (0-100) of a sorted slice with linear interpolation.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}
