//! Performance benchmarks for block processing
//!
//! Run with: cargo bench --bench engine_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quadband::dsp::{CrossoverNetwork, OversamplingFactor};
use quadband::engine::{AudioBuffer, MultibandEngine, ProcessSpec};
use quadband::params::{SharedParameters, NUM_BANDS};
use std::f32::consts::PI;
use std::sync::Arc;

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK: usize = 512;

/// Stereo block of two sines
fn generate_test_block(num_samples: usize) -> AudioBuffer {
    let signal: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            0.5 * (2.0 * PI * 110.0 * t).sin() + 0.3 * (2.0 * PI * 3300.0 * t).sin()
        })
        .collect();
    AudioBuffer::from_channels(vec![signal.clone(), signal], SAMPLE_RATE as u32).unwrap()
}

fn bench_engine_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_block");
    group.throughput(Throughput::Elements(BLOCK as u64));

    for factor in [
        OversamplingFactor::X1,
        OversamplingFactor::X2,
        OversamplingFactor::X4,
        OversamplingFactor::X8,
    ] {
        let params = Arc::new(SharedParameters::new());
        for b in 0..NUM_BANDS {
            let band = params.band(b).unwrap();
            band.set_threshold_db(-24.0);
            band.set_drive(2.0);
        }
        let mut engine = MultibandEngine::with_oversampling(params, factor);
        engine.prepare(SAMPLE_RATE, BLOCK, 2).unwrap();
        let input = generate_test_block(BLOCK);
        let mut block = input.clone();

        group.bench_with_input(
            BenchmarkId::new("stereo_512", format!("{}x", factor.factor())),
            &input,
            |b, input| {
                b.iter(|| {
                    block.copy_from(input);
                    engine.process_block(black_box(&mut block), None);
                    black_box(&block);
                });
            },
        );
    }

    group.finish();
}

fn bench_crossover(c: &mut Criterion) {
    let mut network = CrossoverNetwork::default();
    network.prepare(&ProcessSpec::new(SAMPLE_RATE, BLOCK, 2).unwrap());
    let input = generate_test_block(BLOCK);
    let mut bands: [AudioBuffer; NUM_BANDS] = std::array::from_fn(|_| AudioBuffer::new(2, BLOCK));

    c.bench_function("crossover_split_stereo_512", |b| {
        b.iter(|| {
            network.process_block(black_box(&input), &mut bands);
            black_box(&bands);
        });
    });
}

criterion_group!(benches, bench_engine_block, bench_crossover);
criterion_main!(benches);
