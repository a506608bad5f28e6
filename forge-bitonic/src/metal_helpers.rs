//! Metal device, pipeline and buffer plumbing for the bitonic kernel.

use std::collections::HashMap;
use std::ptr::NonNull;

use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_foundation::NSString;
use objc2_metal::{
    MTLBuffer, MTLCommandQueue, MTLComputePipelineDescriptor, MTLComputePipelineState,
    MTLCreateSystemDefaultDevice, MTLDataType, MTLDevice, MTLFunctionConstantValues, MTLLibrary,
    MTLPipelineOption, MTLResourceOptions,
};

use crate::error::KernelError;

/// Upper bound on invocations per threadgroup; the shader's local array holds
/// twice this many elements.
pub const MAX_THREADS_PER_TG: usize = 1024;

/// Cache of compiled compute pipelines, one per (function, u32 constants) combination.
pub struct PsoCache {
    cache: HashMap<String, Retained<ProtocolObject<dyn MTLComputePipelineState>>>,
}

impl Default for PsoCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PsoCache {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Get or compile a PSO for `function_name` specialized with u32 function constants.
    ///
    /// The cache key is `"fn_name:idx=val:idx=val"` so identical parameters reuse the PSO.
    pub fn get_or_create_specialized(
        &mut self,
        library: &ProtocolObject<dyn MTLLibrary>,
        function_name: &str,
        constants: &[(usize, u32)],
    ) -> Result<&ProtocolObject<dyn MTLComputePipelineState>, KernelError> {
        let key = Self::build_cache_key(function_name, constants);
        if !self.cache.contains_key(&key) {
            let pso = Self::compile_specialized_pso(library, function_name, constants)?;
            self.cache.insert(key.clone(), pso);
        }
        Ok(&self.cache[&key])
    }

    fn build_cache_key(function_name: &str, constants: &[(usize, u32)]) -> String {
        let mut key = function_name.to_string();
        for (idx, val) in constants {
            key.push_str(&format!(":{}={}", idx, val));
        }
        key
    }

    fn compile_specialized_pso(
        library: &ProtocolObject<dyn MTLLibrary>,
        function_name: &str,
        constants: &[(usize, u32)],
    ) -> Result<Retained<ProtocolObject<dyn MTLComputePipelineState>>, KernelError> {
        let constant_values = MTLFunctionConstantValues::new();
        for (idx, val) in constants {
            let ptr = NonNull::from(val).cast::<std::ffi::c_void>();
            unsafe {
                constant_values.setConstantValue_type_atIndex(ptr, MTLDataType::UInt, *idx);
            }
        }

        let fn_name = NSString::from_str(function_name);
        let function = library
            .newFunctionWithName_constantValues_error(&fn_name, &constant_values)
            .map_err(|e| {
                KernelError::ShaderCompilation(format!(
                    "function '{}' with constants {:?}: {:?}",
                    function_name, constants, e
                ))
            })?;

        let descriptor = MTLComputePipelineDescriptor::new();
        descriptor.setComputeFunction(Some(&function));
        descriptor.setMaxTotalThreadsPerThreadgroup(MAX_THREADS_PER_TG);

        let device = library.device();
        device
            .newComputePipelineStateWithDescriptor_options_reflection_error(
                &descriptor,
                MTLPipelineOption::None,
                None,
            )
            .map_err(|e| {
                KernelError::ShaderCompilation(format!(
                    "PSO for '{}': {:?}",
                    function_name, e
                ))
            })
    }

    /// Number of cached PSOs.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Allocate a Metal buffer of `size` bytes with StorageModeShared.
pub fn alloc_buffer(
    device: &ProtocolObject<dyn MTLDevice>,
    size: usize,
) -> Result<Retained<ProtocolObject<dyn MTLBuffer>>, KernelError> {
    device
        .newBufferWithLength_options(size.max(4), MTLResourceOptions::StorageModeShared)
        .ok_or_else(|| KernelError::GpuExecution(format!("failed to allocate {} bytes", size)))
}

/// Initialize the default Metal device and command queue.
pub fn init_device_and_queue() -> Result<
    (
        Retained<ProtocolObject<dyn MTLDevice>>,
        Retained<ProtocolObject<dyn MTLCommandQueue>>,
    ),
    KernelError,
> {
    let device = MTLCreateSystemDefaultDevice().ok_or(KernelError::DeviceNotFound)?;
    let queue = device
        .newCommandQueue()
        .ok_or_else(|| KernelError::GpuExecution("failed to create command queue".to_string()))?;
    Ok((device, queue))
}

/// Load the metallib produced by build.rs.
pub fn load_library(
    device: &ProtocolObject<dyn MTLDevice>,
) -> Result<Retained<ProtocolObject<dyn MTLLibrary>>, KernelError> {
    let path_ns = NSString::from_str(env!("BITONIC_METALLIB_PATH"));
    #[allow(deprecated)]
    device
        .newLibraryWithFile_error(&path_ns)
        .map_err(|e| KernelError::ShaderCompilation(format!("{:?}", e)))
}
