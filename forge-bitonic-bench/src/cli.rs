use clap::{Parser, ValueEnum};

/// Which bitonic kernel executes the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Rayon reference kernel
    Cpu,
    /// Metal compute kernel (macOS only)
    Metal,
}

impl Backend {
    /// Metal where it exists, the CPU kernel elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Backend::Metal
        } else {
            Backend::Cpu
        }
    }
}

/// Bitonic sorting network benchmark
#[derive(Parser, Debug)]
#[command(name = "forge-bitonic-bench", version, about)]
pub struct BitonicArgs {
    /// Element counts to sort, powers of two (e.g., 2^20, 64K, 1M, 1048576)
    #[arg(long, value_delimiter = ',')]
    pub size: Option<Vec<String>>,

    /// Maximum invocations per work group
    #[arg(long, default_value_t = forge_bitonic::DEFAULT_MAX_GROUP_WIDTH)]
    pub max_workgroup_size: usize,

    /// Random values are drawn from 0..MAX_VALUE
    #[arg(long, default_value_t = 1_000_000)]
    pub max_value: u32,

    /// Seed for the data generator
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Kernel backend [default: metal on macOS, cpu elsewhere]
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Number of measured runs per size [default: 10, or the profile's]
    #[arg(long)]
    pub runs: Option<u32>,

    /// Number of warmup runs before measurement [default: 3, or the profile's]
    #[arg(long)]
    pub warmup: Option<u32>,

    /// Benchmark profile: quick (2^20/3/1), standard (2^16..2^22/10/3), thorough (2^16..2^24/30/3)
    #[arg(long)]
    pub profile: Option<String>,

    /// Print the dispatch plan for each size before running it
    #[arg(long)]
    pub show_plan: bool,

    /// Write JSON results to file
    #[arg(long)]
    pub json_file: Option<String>,
}

impl BitonicArgs {
    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_else(Backend::platform_default)
    }
}
