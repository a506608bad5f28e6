//! Error types for planning and driving a bitonic sort.

use crate::plan::Mode;

/// Errors surfaced by [`plan`](crate::plan::plan), [`execute`](crate::driver::execute)
/// and [`sort`](crate::driver::sort).
///
/// Every variant is fatal to the current sort call. Nothing is retried and a run that
/// fails mid-plan leaves the buffer partially sorted.
#[derive(Debug, thiserror::Error)]
pub enum SortError {
    #[error("element count {0} is not a power of two >= 2")]
    InvalidSize(usize),
    #[error("max workgroup size must be at least 1, got {0}")]
    InvalidWorkgroup(usize),
    #[error("buffer holds {actual} elements but the plan was built for {expected}")]
    BufferLength { expected: usize, actual: usize },
    #[error("kernel dispatch failed: {0}")]
    KernelDispatch(#[from] KernelError),
}

/// Errors raised by a [`DispatchKernel`](crate::driver::DispatchKernel) implementation.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("no Metal GPU device found")]
    DeviceNotFound,
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("GPU execution failed: {0}")]
    GpuExecution(String),
    #[error("unknown dispatch mode code {0}")]
    UnknownMode(u32),
    #[error("{mode} dispatch of span {span} over {group_count} groups does not fit a {len}-element buffer")]
    InvalidDispatch {
        mode: Mode,
        span: usize,
        group_count: usize,
        len: usize,
    },
}
