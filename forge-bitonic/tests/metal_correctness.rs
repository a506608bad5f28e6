#![cfg(target_os = "macos")]

mod common;

use common::{assert_sorted_permutation, init_logging, input_patterns, random_u32};
use forge_bitonic::{plan, sort_cpu, DispatchKernel, KernelError, MetalKernel, Mode, SortError};

fn sort_and_verify(n: usize, w: usize) {
    init_logging();
    let mut kernel = MetalKernel::new().unwrap();
    for (name, data) in input_patterns(n as u64, n) {
        let mut actual = data.clone();
        kernel.sort_u32(&mut actual, w).unwrap();
        assert_sorted_permutation(&data, &actual, &format!("metal n={n} W={w} {name}"));
    }
}

#[test] fn test_metal_n2()        { sort_and_verify(2, 1); }
#[test] fn test_metal_n1024_w1()  { sort_and_verify(1024, 1); }
#[test] fn test_metal_n1024_w512(){ sort_and_verify(1024, 512); }
#[test] fn test_metal_1m_w1024()  { sort_and_verify(1 << 20, 1024); }
#[test] fn test_metal_1m_w2()     { sort_and_verify(1 << 20, 2); }

#[test]
fn test_metal_matches_cpu_reference() {
    let data = random_u32(11, 1 << 16);
    let mut kernel = MetalKernel::new().unwrap();
    for w in [1, 32, 256, 1024] {
        let mut gpu = data.clone();
        let mut cpu = data.clone();
        kernel.sort_u32(&mut gpu, w).unwrap();
        sort_cpu(&mut cpu, w).unwrap();
        assert_eq!(gpu, cpu, "W={w}");
    }
}

#[test]
fn test_metal_sort_buffer_reuse() {
    let mut kernel = MetalKernel::new().unwrap();
    let mut buf = kernel.alloc_sort_buffer(1 << 18).unwrap();
    for seed in 0..3 {
        let data = random_u32(seed, 1 << 18);
        buf.copy_from_slice(&data);
        kernel.sort_buffer(&mut buf, 1024).unwrap();
        assert_sorted_permutation(&data, buf.as_slice(), &format!("reuse {seed}"));
    }
}

#[test]
fn test_metal_width_clamped_to_pipeline_limit() {
    let mut kernel = MetalKernel::new().unwrap();
    let limit = kernel.max_group_width();
    let data = random_u32(5, 1 << 14);
    let mut actual = data.clone();
    kernel.sort_u32(&mut actual, 1 << 20).unwrap();
    assert_sorted_permutation(&data, &actual, "clamped");
    assert!(plan(1 << 14, limit).unwrap().group_width() <= limit);
}

#[test]
fn test_metal_rejects_invalid_size() {
    let mut kernel = MetalKernel::new().unwrap();
    let mut data = random_u32(3, 1000);
    assert!(matches!(kernel.sort_u32(&mut data, 1024), Err(SortError::InvalidSize(1000))));
}

#[test]
fn test_metal_calls_without_bind_fail_alike() {
    let mut kernel = MetalKernel::new().unwrap();
    let mut buf = kernel.alloc_sort_buffer(8).unwrap();
    buf.copy_from_slice(&[7, 6, 5, 4, 3, 2, 1, 0]);

    let errors = [
        kernel.invoke(&mut buf, 8, Mode::LocalBitonicMerge, 1).unwrap_err(),
        kernel.barrier(&mut buf).unwrap_err(),
        kernel.finish(&mut buf).unwrap_err(),
    ];
    for err in errors {
        match err {
            KernelError::GpuExecution(msg) => assert_eq!(msg, "no buffer bound"),
            other => panic!("unexpected error: {other}"),
        }
    }

    // A bound run still works afterwards.
    kernel.sort_buffer(&mut buf, 4).unwrap();
    assert_eq!(buf.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7]);
}
