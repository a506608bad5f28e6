//! JSON output for benchmark results.
//!
//! Serializes `Vec<DataPoint>` with a run header (backend, seed, value range).

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::harness::DataPoint;

/// Settings shared by every data point of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunHeader {
    pub backend: String,
    pub max_workgroup_size: usize,
    pub max_value: u32,
    pub seed: u64,
    pub runs: u32,
    pub warmup: u32,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    run: &'a RunHeader,
    timestamp: String,
    results: &'a [DataPoint],
}

/// Write benchmark results to a JSON file, creating parent directories.
pub fn write_json(path: &str, data: &[DataPoint], header: &RunHeader) -> Result<(), String> {
    let report = JsonReport {
        run: header,
        timestamp: chrono::Utc::now().to_rfc3339(),
        results: data,
    };

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("JSON serialization failed: {}", e))?;

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory {}: {}", parent.display(), e))?;
        }
    }

    fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path, e))?;
    log::info!("JSON results written to: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{PlanSummary, SortRun};
    use crate::stats::compute_stats;

    fn header() -> RunHeader {
        RunHeader {
            backend: "cpu".to_string(),
            max_workgroup_size: 1024,
            max_value: 1_000_000,
            seed: 42,
            runs: 3,
            warmup: 1,
        }
    }

    fn point() -> DataPoint {
        let run = |method: &str| SortRun {
            method: method.to_string(),
            sorted: true,
            stats: compute_stats(&[1.0, 2.0, 3.0]),
        };
        DataPoint {
            size: 1 << 20,
            plan: PlanSummary {
                group_width: 1024,
                group_count: 512,
                dispatches: 55,
                barriers: 54,
            },
            bitonic: run("cpu"),
            baselines: vec![run("sort_unstable"), run("par_sort_unstable")],
            speedup: 1.0,
        }
    }

    #[test]
    fn test_write_json_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/results.json");
        let path = path.to_str().unwrap();

        write_json(path, &[point()], &header()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["run"]["backend"], "cpu");
        assert_eq!(value["run"]["seed"], 42);
        assert_eq!(value["results"][0]["size"], 1 << 20);
        assert_eq!(value["results"][0]["plan"]["dispatches"], 55);
        assert_eq!(value["results"][0]["baselines"][1]["method"], "par_sort_unstable");
        assert!(value["timestamp"].is_string());
    }
}
