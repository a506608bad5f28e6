//! Metal backend: runs the bitonic passes as compute dispatches on Apple GPUs.
//!
//! A whole plan is encoded into one command buffer through a concurrent compute
//! encoder. Each planned barrier becomes `memoryBarrierWithScope(Buffers)`, so
//! dispatches only serialize where the network requires it.

use std::ptr::NonNull;

use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_metal::{
    MTLBarrierScope, MTLBuffer, MTLCommandBuffer, MTLCommandBufferStatus, MTLCommandEncoder,
    MTLCommandQueue, MTLComputeCommandEncoder, MTLComputePipelineState, MTLDevice,
    MTLDispatchType, MTLLibrary, MTLSize,
};

use crate::driver::{sort, DispatchKernel, ElementBuffer};
use crate::error::{KernelError, SortError};
use crate::metal_helpers::{
    alloc_buffer, init_device_and_queue, load_library, PsoCache, MAX_THREADS_PER_TG,
};
use crate::plan::Mode;

const KERNEL_NAME: &str = "bitonic_step";
/// Function constant index of the pass selector in `bitonic.metal`.
const MODE_CONSTANT_INDEX: usize = 0;

#[repr(C)]
#[derive(Clone, Copy)]
struct BitonicParams {
    span: u32,
}

/// A shared-storage Metal buffer of `u32` that can be sorted in place with zero memcpy.
///
/// Created via [`MetalKernel::alloc_sort_buffer`]. CPU reads and writes go directly to
/// the pages the GPU uses.
pub struct SortBuffer {
    buffer: Retained<ProtocolObject<dyn MTLBuffer>>,
    len: usize,
    capacity: usize,
}

impl SortBuffer {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get a slice to read sorted results directly from GPU-visible memory.
    pub fn as_slice(&self) -> &[u32] {
        unsafe { std::slice::from_raw_parts(self.buffer.contents().as_ptr() as *const u32, self.len) }
    }

    /// Mutable view of the valid elements.
    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        unsafe {
            std::slice::from_raw_parts_mut(self.buffer.contents().as_ptr() as *mut u32, self.len)
        }
    }

    /// Copy data into the buffer and set `len`. Panics if `data` exceeds capacity.
    pub fn copy_from_slice(&mut self, data: &[u32]) {
        assert!(
            data.len() <= self.capacity,
            "data len {} exceeds capacity {}",
            data.len(),
            self.capacity
        );
        self.len = data.len();
        self.as_mut_slice().copy_from_slice(data);
    }

    /// Copy the valid elements out to `dest`.
    pub fn copy_to_slice(&self, dest: &mut [u32]) {
        let n = self.len.min(dest.len());
        dest[..n].copy_from_slice(&self.as_slice()[..n]);
    }

    /// Access the underlying Metal buffer.
    pub fn metal_buffer(&self) -> &ProtocolObject<dyn MTLBuffer> {
        &self.buffer
    }
}

impl ElementBuffer for SortBuffer {
    fn len(&self) -> usize {
        self.len
    }
}

/// In-flight command buffer and encoder for one plan execution.
struct Encoding {
    cmd: Retained<ProtocolObject<dyn MTLCommandBuffer>>,
    encoder: Retained<ProtocolObject<dyn MTLComputeCommandEncoder>>,
}

fn not_bound() -> KernelError {
    KernelError::GpuExecution("no buffer bound".to_string())
}

/// [`DispatchKernel`] backed by a Metal compute pipeline.
pub struct MetalKernel {
    device: Retained<ProtocolObject<dyn MTLDevice>>,
    queue: Retained<ProtocolObject<dyn MTLCommandQueue>>,
    library: Retained<ProtocolObject<dyn MTLLibrary>>,
    pso_cache: PsoCache,
    max_group_width: usize,
    encoding: Option<Encoding>,
    staging: Option<SortBuffer>,
}

impl MetalKernel {
    /// Initialize device and queue, load the metallib and compile one PSO per mode.
    pub fn new() -> Result<Self, KernelError> {
        let (device, queue) = init_device_and_queue()?;
        let library = load_library(&device)?;

        let mut pso_cache = PsoCache::new();
        let mut max_group_width = MAX_THREADS_PER_TG;
        for mode in Mode::ALL {
            let pso = pso_cache.get_or_create_specialized(
                &library,
                KERNEL_NAME,
                &[(MODE_CONSTANT_INDEX, mode.code())],
            )?;
            max_group_width = max_group_width.min(pso.maxTotalThreadsPerThreadgroup());
        }
        // Spans must stay powers of two.
        max_group_width = 1 << max_group_width.ilog2();
        log::debug!("metal bitonic kernel ready: max_group_width={max_group_width}");

        Ok(Self {
            device,
            queue,
            library,
            pso_cache,
            max_group_width,
            encoding: None,
            staging: None,
        })
    }

    /// Largest group width every mode's pipeline accepts.
    pub fn max_group_width(&self) -> usize {
        self.max_group_width
    }

    /// Allocate a shared-storage buffer for zero-copy sorting.
    pub fn alloc_sort_buffer(&self, capacity: usize) -> Result<SortBuffer, KernelError> {
        let buffer = alloc_buffer(&self.device, capacity * std::mem::size_of::<u32>())?;
        Ok(SortBuffer {
            buffer,
            len: 0,
            capacity,
        })
    }

    /// Sort a [`SortBuffer`] in place on the GPU. **Zero memcpy.**
    ///
    /// `max_group_width` is capped to what the pipelines support.
    pub fn sort_buffer(
        &mut self,
        buf: &mut SortBuffer,
        max_group_width: usize,
    ) -> Result<(), SortError> {
        let width = self.clamp_group_width(max_group_width);
        sort(buf, width, self)
    }

    /// Sort a `u32` slice on the GPU, staging through an internal shared buffer.
    pub fn sort_u32(&mut self, data: &mut [u32], max_group_width: usize) -> Result<(), SortError> {
        let needs_alloc = self
            .staging
            .as_ref()
            .is_none_or(|s| s.capacity() < data.len());
        if needs_alloc {
            self.staging = Some(self.alloc_sort_buffer(data.len())?);
        }
        let Some(mut staging) = self.staging.take() else {
            return Err(KernelError::GpuExecution("staging buffer missing".to_string()).into());
        };

        staging.copy_from_slice(data);
        let result = self.sort_buffer(&mut staging, max_group_width);
        if result.is_ok() {
            staging.copy_to_slice(data);
        }
        self.staging = Some(staging);
        result
    }

    fn clamp_group_width(&self, requested: usize) -> usize {
        if requested > self.max_group_width {
            log::debug!(
                "max workgroup size {requested} exceeds pipeline limit, using {}",
                self.max_group_width
            );
            return self.max_group_width;
        }
        requested
    }

}

impl DispatchKernel for MetalKernel {
    type Buffer = SortBuffer;

    fn bind(&mut self, buffer: &mut SortBuffer) -> Result<(), KernelError> {
        if u32::try_from(buffer.len()).is_err() {
            return Err(KernelError::GpuExecution(format!(
                "{} elements exceed the 32-bit index range",
                buffer.len()
            )));
        }
        if let Some(stale) = self.encoding.take() {
            stale.encoder.endEncoding();
        }

        let cmd = self.queue.commandBuffer().ok_or_else(|| {
            KernelError::GpuExecution("failed to create command buffer".to_string())
        })?;
        let encoder = cmd
            .computeCommandEncoderWithDispatchType(MTLDispatchType::Concurrent)
            .ok_or_else(|| {
                KernelError::GpuExecution("failed to create compute encoder".to_string())
            })?;
        unsafe {
            encoder.setBuffer_offset_atIndex(Some(buffer.metal_buffer()), 0, 0);
        }
        self.encoding = Some(Encoding { cmd, encoder });
        Ok(())
    }

    fn invoke(
        &mut self,
        buffer: &mut SortBuffer,
        span: usize,
        mode: Mode,
        group_count: usize,
    ) -> Result<(), KernelError> {
        let len = buffer.len();
        let group_width = len / (2 * group_count.max(1));
        if group_count == 0
            || group_width == 0
            || group_width > self.max_group_width
            || group_width * 2 * group_count != len
            || (mode.is_local() && span > 2 * group_width)
        {
            return Err(KernelError::InvalidDispatch {
                mode,
                span,
                group_count,
                len,
            });
        }

        let pso = self.pso_cache.get_or_create_specialized(
            &self.library,
            KERNEL_NAME,
            &[(MODE_CONSTANT_INDEX, mode.code())],
        )?;
        let encoding = self
            .encoding
            .as_ref()
            .ok_or_else(not_bound)?;

        let params = BitonicParams { span: span as u32 };
        encoding.encoder.setComputePipelineState(pso);
        unsafe {
            encoding.encoder.setBytes_length_atIndex(
                NonNull::from(&params).cast(),
                std::mem::size_of::<BitonicParams>(),
                1,
            );
        }
        encoding.encoder.dispatchThreadgroups_threadsPerThreadgroup(
            MTLSize {
                width: group_count,
                height: 1,
                depth: 1,
            },
            MTLSize {
                width: group_width,
                height: 1,
                depth: 1,
            },
        );
        Ok(())
    }

    fn barrier(&mut self, _buffer: &mut SortBuffer) -> Result<(), KernelError> {
        self.encoding
            .as_ref()
            .ok_or_else(not_bound)?
            .encoder
            .memoryBarrierWithScope(MTLBarrierScope::Buffers);
        Ok(())
    }

    fn finish(&mut self, _buffer: &mut SortBuffer) -> Result<(), KernelError> {
        let Encoding { cmd, encoder } = self
            .encoding
            .take()
            .ok_or_else(not_bound)?;
        encoder.endEncoding();
        cmd.commit();
        cmd.waitUntilCompleted();

        if cmd.status() == MTLCommandBufferStatus::Error {
            return Err(KernelError::GpuExecution(format!(
                "command buffer error: {:?}",
                cmd.error()
            )));
        }
        Ok(())
    }
}

impl Drop for MetalKernel {
    fn drop(&mut self) {
        // An aborted run leaves an open encoder; Metal requires it to be ended.
        if let Some(Encoding { encoder, .. }) = self.encoding.take() {
            encoder.endEncoding();
        }
    }
}
