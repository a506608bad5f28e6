//! Bitonic sorting network scheduler.
//!
//! [`plan`] turns an element count and a maximum work-group width into the ordered
//! list of kernel dispatches (flip and disperse passes, fused into local passes where
//! a span fits inside one group) and the barriers between them. [`execute`] replays a
//! plan against any [`DispatchKernel`].
//!
//! Two kernels ship with the crate: [`CpuKernel`], a rayon reference implementation,
//! and on macOS [`MetalKernel`], which runs the passes as Metal compute dispatches.
//!
//! ```
//! use forge_bitonic::sort_cpu;
//!
//! let mut data: Vec<u32> = (0..1024).rev().collect();
//! sort_cpu(&mut data, 256).unwrap();
//! assert!(data.windows(2).all(|w| w[0] <= w[1]));
//! ```

pub mod cpu;
pub mod driver;
pub mod error;
pub mod plan;

#[cfg(target_os = "macos")]
pub mod metal;
#[cfg(target_os = "macos")]
mod metal_helpers;

pub use cpu::{sort_cpu, CpuKernel, KernelStats};
pub use driver::{execute, sort, DispatchKernel, ElementBuffer};
pub use error::{KernelError, SortError};
pub use plan::{
    effective_group_width, is_local, plan, DispatchDescriptor, Mode, Plan, PlannedDispatch,
};

#[cfg(target_os = "macos")]
pub use metal::{MetalKernel, SortBuffer};

/// Work-group width used when the caller has no device limit to go by.
pub const DEFAULT_MAX_GROUP_WIDTH: usize = 1024;
