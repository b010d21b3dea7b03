//! Performance benchmarks for the layer step.
//!
//! Measures a full `execute` at a few sizes plus the phases that dominate it:
//! - overlap + inhibition
//! - reconstruction score
//! - statistics snapshot

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use htm_cla::{Layer, LayerParams, PerformanceStatistics};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn build(columns: usize, inputs: usize, learn: bool) -> Layer {
    let mut params = LayerParams::default();
    params.set_layer_parameters(columns, inputs, inputs, 16, learn, learn);
    params.max_active_columns = (columns / 32).max(1);
    params.seed = 42;
    Layer::new(params).unwrap()
}

fn random_inputs(inputs: usize, count: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            (0..inputs)
                .map(|_| if rng.gen_bool(0.1) { 1.0 } else { 0.0 })
                .collect()
        })
        .collect()
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("Layer::execute");

    for &(columns, inputs) in [(128, 64), (512, 256), (2048, 512)].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", columns, inputs)),
            &(columns, inputs),
            |b, &(columns, inputs)| {
                let mut layer = build(columns, inputs, true);
                let samples = random_inputs(inputs, 16);
                let mut k = 0;

                b.iter(|| {
                    layer.execute(black_box(&samples[k % 16]), 1.0).unwrap();
                    k += 1;
                });
            },
        );
    }
    group.finish();
}

fn bench_execute_inference(c: &mut Criterion) {
    c.bench_function("Layer::execute (learning off)", |b| {
        let mut layer = build(512, 256, false);
        let samples = random_inputs(256, 16);
        let mut k = 0;

        b.iter(|| {
            layer.execute(black_box(&samples[k % 16]), 1.0).unwrap();
            k += 1;
        });
    });
}

fn bench_spatial_selection(c: &mut Criterion) {
    c.bench_function("overlap + inhibition (512x256)", |b| {
        let mut layer = build(512, 256, false);
        let samples = random_inputs(256, 16);
        let mut k = 0;

        b.iter(|| {
            layer.calculate_overlap(&samples[k % 16]).unwrap();
            layer.inhibit_neighboring_columns();
            black_box(layer.number_of_columns_active());
            k += 1;
        });
    });
}

fn bench_reconstruction_score(c: &mut Criterion) {
    c.bench_function("dynamic reconstruction + score", |b| {
        let mut layer = build(512, 256, true);
        let samples = random_inputs(256, 4);
        for x in &samples {
            layer.execute(x, 1.0).unwrap();
        }

        b.iter(|| {
            layer.compute_dynamic_reconstruction();
            black_box(layer.compute_dynamic_reconstruction_score());
        });
    });
}

fn bench_statistics(c: &mut Criterion) {
    c.bench_function("PerformanceStatistics::collect", |b| {
        let mut layer = build(512, 256, true);
        for x in &random_inputs(256, 50) {
            layer.execute(x, 1.0).unwrap();
        }

        b.iter(|| black_box(PerformanceStatistics::collect(&layer)));
    });
}

criterion_group!(
    benches,
    bench_execute,
    bench_execute_inference,
    bench_spatial_selection,
    bench_reconstruction_score,
    bench_statistics
);
criterion_main!(benches);
