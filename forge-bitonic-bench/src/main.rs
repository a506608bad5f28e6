mod cli;
mod config;
mod cpu_baselines;
mod data_gen;
mod harness;
mod output;
mod stats;
mod timing;

use clap::Parser;
use cli::{Backend, BitonicArgs};
use config::{get_profile, parse_sizes};
use data_gen::DataGenerator;
use forge_bitonic::{plan, CpuKernel};
use harness::{format_size, run_size, BenchConfig, BitonicBackend, DataPoint};
use output::json::RunHeader;
use output::progress::BenchProgress;

const DEFAULT_RUNS: u32 = 10;
const DEFAULT_WARMUP: u32 = 3;

fn open_backend(backend: Backend) -> Result<Box<dyn BitonicBackend>, String> {
    match backend {
        Backend::Cpu => Ok(Box::new(CpuKernel::new())),
        #[cfg(target_os = "macos")]
        Backend::Metal => forge_bitonic::MetalKernel::new()
            .map(|k| Box::new(k) as Box<dyn BitonicBackend>)
            .map_err(|e| format!("Metal backend unavailable: {}", e)),
        #[cfg(not(target_os = "macos"))]
        Backend::Metal => Err("the metal backend requires macOS; use --backend cpu".to_string()),
    }
}

/// Resolve sizes, runs and warmup: explicit flags, then the profile, then defaults.
fn resolve_config(args: &BitonicArgs) -> Result<BenchConfig, String> {
    let profile = match args.profile.as_deref() {
        Some(name) => Some(get_profile(name).ok_or_else(|| {
            format!("Unknown profile '{}'. Valid: quick, standard, thorough", name)
        })?),
        None => None,
    };
    if let Some(p) = &profile {
        log::info!("profile {}: {} sizes", p.name, p.sizes.len());
    }

    let sizes = match (&args.size, &profile) {
        (Some(raw), _) => parse_sizes(raw)?,
        (None, Some(p)) => p.sizes.clone(),
        (None, None) => vec![1 << 20],
    };
    if args.max_workgroup_size == 0 {
        return Err("--max-workgroup-size must be at least 1".to_string());
    }

    Ok(BenchConfig {
        sizes,
        runs: args
            .runs
            .or(profile.as_ref().map(|p| p.runs))
            .unwrap_or(DEFAULT_RUNS),
        warmup: args
            .warmup
            .or(profile.as_ref().map(|p| p.warmup))
            .unwrap_or(DEFAULT_WARMUP),
        max_group_width: args.max_workgroup_size,
        max_value: args.max_value,
        seed: args.seed,
    })
}

fn report(dp: &DataPoint) {
    println!("sorted: {}", dp.bitonic.sorted);
    println!(
        "{} took {:.3} ms to sort {} elements",
        dp.bitonic.method, dp.bitonic.stats.median, dp.size
    );
    for b in &dp.baselines {
        println!("sorted: {}", b.sorted);
        println!(
            "{} took {:.3} ms to sort {} elements",
            b.method, b.stats.median, dp.size
        );
    }
    println!();
}

fn run(args: &BitonicArgs) -> Result<(), String> {
    let config = resolve_config(args)?;
    let mut backend = open_backend(args.backend())?;
    let width = config.effective_group_width(&*backend);

    println!("forge-bitonic-bench: bitonic sorting network");
    println!("  Backend: {}", backend.name());
    println!("  Sizes: {:?}", config.sizes.iter().map(|&s| format_size(s)).collect::<Vec<_>>());
    println!("  Max workgroup size: {}", width);
    println!("  Values: 0..{}, seed {}", config.max_value, config.seed);
    println!("  Runs: {}, Warmup: {}", config.runs, config.warmup);
    println!();

    let mut gen = DataGenerator::new(config.seed);
    let mut results = Vec::with_capacity(config.sizes.len());
    let progress = BenchProgress::new();
    for &size in &config.sizes {
        if args.show_plan {
            let p = plan(size, width).map_err(|e| e.to_string())?;
            progress.suspend(|| println!("{p}"));
        }
        let cb = progress.callback();
        let dp = run_size(&mut *backend, &config, size, &mut gen, Some(&cb))
            .map_err(|e| e.to_string())?;
        progress.suspend(|| report(&dp));
        results.push(dp);
    }
    progress.finish();

    output::table::render_table(&results);

    if let Some(ref path) = args.json_file {
        let header = RunHeader {
            backend: backend.name().to_string(),
            max_workgroup_size: width,
            max_value: config.max_value,
            seed: config.seed,
            runs: config.runs,
            warmup: config.warmup,
        };
        output::json::write_json(path, &results, &header)?;
    }

    if results
        .iter()
        .any(|dp| !dp.bitonic.sorted || dp.baselines.iter().any(|b| !b.sorted))
    {
        return Err("at least one sort produced unsorted output".to_string());
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = BitonicArgs::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
