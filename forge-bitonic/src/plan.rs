//! Stage planner: derives the dispatch sequence of a bitonic sorting network.
//!
//! The plan depends only on the element count `n` and the maximum group width `W`,
//! never on the data. Spans that fit inside one group (`span <= 2g`) are resolved by a
//! single local dispatch; wider spans need one globally synchronised dispatch per
//! compare-exchange level.

use std::fmt;

use crate::error::{KernelError, SortError};

/// Kernel pass selector. The discriminants are the codes the shaders receive.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Full bitonic build of every span from 2 up to `span`, inside each group.
    LocalBitonicMerge = 0,
    /// Disperse cascade from `span` down to 2, inside each group.
    LocalDisperse = 1,
    /// One global flip level at `span`.
    BigFlip = 2,
    /// One global disperse level at `span`.
    BigDisperse = 3,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::LocalBitonicMerge,
        Mode::LocalDisperse,
        Mode::BigFlip,
        Mode::BigDisperse,
    ];

    /// Wire code passed to the kernel.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Whether the pass runs entirely in a group's local storage.
    pub fn is_local(self) -> bool {
        matches!(self, Mode::LocalBitonicMerge | Mode::LocalDisperse)
    }
}

impl TryFrom<u32> for Mode {
    type Error = KernelError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Mode::LocalBitonicMerge),
            1 => Ok(Mode::LocalDisperse),
            2 => Ok(Mode::BigFlip),
            3 => Ok(Mode::BigDisperse),
            other => Err(KernelError::UnknownMode(other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::LocalBitonicMerge => "LocalBitonicMerge",
            Mode::LocalDisperse => "LocalDisperse",
            Mode::BigFlip => "BigFlip",
            Mode::BigDisperse => "BigDisperse",
        };
        f.write_str(name)
    }
}

/// One kernel invocation: a span width and the pass to run at that width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchDescriptor {
    pub span: usize,
    pub mode: Mode,
}

impl DispatchDescriptor {
    pub fn new(span: usize, mode: Mode) -> Self {
        Self { span, mode }
    }
}

impl fmt::Display for DispatchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.mode, self.span)
    }
}

/// A descriptor plus whether a global memory barrier must precede it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlannedDispatch {
    pub descriptor: DispatchDescriptor,
    pub barrier: bool,
}

/// The ordered dispatch sequence for one `(n, W)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    element_count: usize,
    group_width: usize,
    steps: Vec<PlannedDispatch>,
}

/// Local/global decision: a span is resolved locally when it fits in one group.
///
/// A group of `group_width` invocations holds `2 * group_width` elements.
pub fn is_local(span: usize, group_width: usize) -> bool {
    span / 2 <= group_width
}

/// Effective pair width of one group for a buffer of `n` elements.
///
/// Clamped to `n / 2` and rounded down to a power of two so every span in the
/// network stays a power of two.
pub fn effective_group_width(n: usize, max_group_width: usize) -> usize {
    let g = max_group_width.min(n / 2).max(1);
    1 << g.ilog2()
}

/// Build the dispatch plan for `n` elements with at most `max_group_width`
/// invocations per group.
pub fn plan(n: usize, max_group_width: usize) -> Result<Plan, SortError> {
    Plan::new(n, max_group_width)
}

impl Plan {
    pub(crate) fn new(n: usize, max_group_width: usize) -> Result<Self, SortError> {
        if n < 2 || !n.is_power_of_two() {
            return Err(SortError::InvalidSize(n));
        }
        if max_group_width < 1 {
            return Err(SortError::InvalidWorkgroup(max_group_width));
        }

        let g = effective_group_width(n, max_group_width);
        let mut steps = Vec::new();

        // Every span up to 2g is built inside the groups in one pass.
        steps.push(PlannedDispatch {
            descriptor: DispatchDescriptor::new(2 * g, Mode::LocalBitonicMerge),
            barrier: false,
        });

        // Spans are walked by exponent; `n` may be the largest power of two a usize holds.
        for log_h in (2 * g).ilog2() + 1..=n.ilog2() {
            let h = 1usize << log_h;
            steps.push(PlannedDispatch {
                descriptor: DispatchDescriptor::new(h, Mode::BigFlip),
                barrier: true,
            });

            let mut hh = h / 2;
            while hh > 1 {
                if is_local(hh, g) {
                    steps.push(PlannedDispatch {
                        descriptor: DispatchDescriptor::new(hh, Mode::LocalDisperse),
                        barrier: true,
                    });
                    break;
                }
                steps.push(PlannedDispatch {
                    descriptor: DispatchDescriptor::new(hh, Mode::BigDisperse),
                    barrier: true,
                });
                hh /= 2;
            }
        }

        Ok(Self {
            element_count: n,
            group_width: g,
            steps,
        })
    }

    /// Number of elements the plan sorts.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Effective invocations per group (`g`).
    pub fn group_width(&self) -> usize {
        self.group_width
    }

    /// Groups per dispatch, constant across the whole plan.
    pub fn group_count(&self) -> usize {
        self.element_count / (2 * self.group_width)
    }

    pub fn steps(&self) -> &[PlannedDispatch] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlannedDispatch> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of global barriers the plan issues.
    pub fn barrier_count(&self) -> usize {
        self.steps.iter().filter(|s| s.barrier).count()
    }

    /// The descriptors alone, in emission order.
    pub fn descriptors(&self) -> impl Iterator<Item = DispatchDescriptor> + '_ {
        self.steps.iter().map(|s| s.descriptor)
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a PlannedDispatch;
    type IntoIter = std::slice::Iter<'a, PlannedDispatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "plan: n={} group_width={} group_count={} dispatches={} barriers={}",
            self.element_count,
            self.group_width,
            self.group_count(),
            self.len(),
            self.barrier_count()
        )?;
        for (i, step) in self.steps.iter().enumerate() {
            let sync = if step.barrier { "barrier" } else { "-" };
            writeln!(f, "  {:>4}  {:<8} {}", i, sync, step.descriptor)?;
        }
        Ok(())
    }
}
