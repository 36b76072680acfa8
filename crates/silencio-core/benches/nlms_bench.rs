//! Criterion benchmarks for the NLMS engine
//!
//! Run with: cargo bench -p silencio-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use silencio_core::{NlmsEngine, pack_frame, params, rms, unpack_frame};

const BLOCK_SIZE: usize = 1024;
const TAP_COUNTS: &[usize] = &[32, 64, 128, 256];

fn generate_test_signal(size: usize) -> Vec<f32> {
    let mut state = 0x1234_5678u32;
    (0..size)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state as i32 as f32) / (i32::MAX as f32) * 0.3
        })
        .collect()
}

fn bench_nlms_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("NlmsEngine");

    let reference = generate_test_signal(BLOCK_SIZE);
    let primary: Vec<f32> = reference.iter().map(|&x| 0.5 * x).collect();

    for &taps in TAP_COUNTS {
        group.bench_with_input(BenchmarkId::new("process_block", taps), &taps, |b, _| {
            let mut engine = NlmsEngine::new(taps, params::MU);
            let mut denoised = vec![0.0f32; BLOCK_SIZE];
            b.iter(|| {
                engine.process_block(
                    black_box(&reference),
                    black_box(&primary),
                    black_box(&mut denoised),
                );
            });
        });
    }

    group.finish();
}

fn bench_frame_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    let frame: Vec<i32> = (0..BLOCK_SIZE * 2).map(|i| (i as i32) << 10).collect();
    let mono = generate_test_signal(BLOCK_SIZE);

    group.bench_function("unpack", |b| {
        let mut left = vec![0.0f32; BLOCK_SIZE];
        let mut right = vec![0.0f32; BLOCK_SIZE];
        b.iter(|| unpack_frame(black_box(&frame), &mut left, &mut right));
    });

    group.bench_function("pack", |b| {
        let mut out = vec![0i32; BLOCK_SIZE * 2];
        b.iter(|| pack_frame(black_box(&mono), &mut out));
    });

    group.bench_function("rms", |b| {
        b.iter(|| black_box(rms(black_box(&mono))));
    });

    group.finish();
}

criterion_group!(benches, bench_nlms_block, bench_frame_codec);
criterion_main!(benches);
