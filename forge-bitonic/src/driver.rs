//! Dispatch driver: replays a [`Plan`] against a kernel and a bound buffer.

use crate::error::{KernelError, SortError};
use crate::plan::{plan, Mode, Plan};

/// Linear storage of `u32` elements that a kernel sorts in place.
pub trait ElementBuffer {
    /// Number of elements in the buffer.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ElementBuffer for [u32] {
    fn len(&self) -> usize {
        <[u32]>::len(self)
    }
}

impl ElementBuffer for Vec<u32> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// A compare-and-swap compute capability able to run the four bitonic passes.
///
/// The driver calls `bind` once, then `barrier`/`invoke` in plan order, then `finish`.
/// Implementations must run local modes as a full sub-cascade per group and big
/// modes as exactly one global compare-exchange level.
pub trait DispatchKernel {
    type Buffer: ElementBuffer + ?Sized;

    /// Attach the buffer before the first dispatch.
    fn bind(&mut self, _buffer: &mut Self::Buffer) -> Result<(), KernelError> {
        Ok(())
    }

    /// Run one pass of the network over `group_count` groups.
    fn invoke(
        &mut self,
        buffer: &mut Self::Buffer,
        span: usize,
        mode: Mode,
        group_count: usize,
    ) -> Result<(), KernelError>;

    /// Make every write of prior dispatches visible to all groups.
    fn barrier(&mut self, buffer: &mut Self::Buffer) -> Result<(), KernelError>;

    /// Complete all outstanding work. Called once after the last dispatch.
    fn finish(&mut self, _buffer: &mut Self::Buffer) -> Result<(), KernelError> {
        Ok(())
    }
}

/// Issue every dispatch of `plan` in order, with the barriers it requires.
///
/// The first kernel error aborts the run and is returned unchanged inside
/// [`SortError::KernelDispatch`].
pub fn execute<K: DispatchKernel>(
    plan: &Plan,
    buffer: &mut K::Buffer,
    kernel: &mut K,
) -> Result<(), SortError> {
    let expected = plan.element_count();
    let actual = buffer.len();
    if actual != expected {
        return Err(SortError::BufferLength { expected, actual });
    }

    let group_count = plan.group_count();
    kernel.bind(buffer)?;

    for (i, step) in plan.iter().enumerate() {
        if step.barrier {
            kernel.barrier(buffer)?;
        }
        log::trace!(
            "dispatch {i}: {} groups={group_count} barrier={}",
            step.descriptor,
            step.barrier
        );
        kernel.invoke(buffer, step.descriptor.span, step.descriptor.mode, group_count)?;
    }

    kernel.finish(buffer)?;
    Ok(())
}

/// Plan and execute a full sort of `buffer` with at most `max_group_width`
/// invocations per group.
pub fn sort<K: DispatchKernel>(
    buffer: &mut K::Buffer,
    max_group_width: usize,
    kernel: &mut K,
) -> Result<(), SortError> {
    let plan = plan(buffer.len(), max_group_width)?;
    log::debug!(
        "bitonic sort: n={} group_width={} dispatches={} barriers={}",
        plan.element_count(),
        plan.group_width(),
        plan.len(),
        plan.barrier_count()
    );
    execute(&plan, buffer, kernel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Event {
        Bind,
        Barrier,
        Invoke(usize, Mode, usize),
        Finish,
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        fail_at: Option<usize>,
    }

    impl DispatchKernel for Recorder {
        type Buffer = [u32];

        fn bind(&mut self, _buffer: &mut [u32]) -> Result<(), KernelError> {
            self.events.push(Event::Bind);
            Ok(())
        }

        fn invoke(
            &mut self,
            _buffer: &mut [u32],
            span: usize,
            mode: Mode,
            group_count: usize,
        ) -> Result<(), KernelError> {
            let invoked = self
                .events
                .iter()
                .filter(|e| matches!(e, Event::Invoke(..)))
                .count();
            if self.fail_at == Some(invoked) {
                return Err(KernelError::GpuExecution("device lost".to_string()));
            }
            self.events.push(Event::Invoke(span, mode, group_count));
            Ok(())
        }

        fn barrier(&mut self, _buffer: &mut [u32]) -> Result<(), KernelError> {
            self.events.push(Event::Barrier);
            Ok(())
        }

        fn finish(&mut self, _buffer: &mut [u32]) -> Result<(), KernelError> {
            self.events.push(Event::Finish);
            Ok(())
        }
    }

    #[test]
    fn test_event_order_n8_w1() {
        use Event::*;
        use Mode::*;
        let mut data = vec![0u32; 8];
        let mut rec = Recorder::default();
        sort(data.as_mut_slice(), 1, &mut rec).unwrap();
        assert_eq!(
            rec.events,
            vec![
                Bind,
                Invoke(2, LocalBitonicMerge, 4),
                Barrier,
                Invoke(4, BigFlip, 4),
                Barrier,
                Invoke(2, LocalDisperse, 4),
                Barrier,
                Invoke(8, BigFlip, 4),
                Barrier,
                Invoke(4, BigDisperse, 4),
                Barrier,
                Invoke(2, LocalDisperse, 4),
                Finish,
            ]
        );
    }

    #[test]
    fn test_failure_aborts_remaining_plan() {
        let mut data = vec![0u32; 8];
        let mut rec = Recorder {
            fail_at: Some(2),
            ..Default::default()
        };
        let err = sort(data.as_mut_slice(), 1, &mut rec).unwrap_err();
        match err {
            SortError::KernelDispatch(KernelError::GpuExecution(msg)) => {
                assert_eq!(msg, "device lost")
            }
            other => panic!("unexpected error: {other}"),
        }
        let invokes = rec.events.iter().filter(|e| matches!(e, Event::Invoke(..))).count();
        assert_eq!(invokes, 2);
        assert!(!rec.events.contains(&Event::Finish));
    }

    #[test]
    fn test_buffer_length_checked_before_dispatch() {
        let p = plan(16, 4).unwrap();
        let mut data = vec![0u32; 8];
        let mut rec = Recorder::default();
        let err = execute(&p, data.as_mut_slice(), &mut rec).unwrap_err();
        assert!(matches!(
            err,
            SortError::BufferLength {
                expected: 16,
                actual: 8
            }
        ));
        assert!(rec.events.is_empty());
    }
}
