//! Benchmarks for the per-pixel kernels

use covermap_algorithms::classification::{RandomForest, RandomForestConfig, classify_stack};
use covermap_algorithms::imagery::{median_composite, ndvi};
use covermap_algorithms::statistics::{FocalParams, focal_statistics};
use covermap_algorithms::texture::{GlcmParams, glcm_texture};
use covermap_core::{BandStack, GeoTransform, Raster};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn create_band(size: usize, base: f64, spread: f64) -> Raster<f64> {
    let data = (0..size * size)
        .map(|i| {
            let (row, col) = (i / size, i % size);
            base + ((row * 7 + col * 13) % 200) as f64 * spread
        })
        .collect();
    let mut r = Raster::from_vec(data, size, size).unwrap();
    r.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
    r
}

fn bench_ndvi(c: &mut Criterion) {
    let mut group = c.benchmark_group("imagery/ndvi");
    for size in [256, 512, 1024] {
        let nir = create_band(size, 0.3, 0.001);
        let red = create_band(size, 0.05, 0.0005);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| ndvi(black_box(&nir), black_box(&red)).unwrap())
        });
    }
    group.finish();
}

fn bench_median_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("imagery/median_composite");
    for size in [256, 512] {
        let scenes: Vec<BandStack> = (0..12)
            .map(|s| BandStack::from_bands([("B1", create_band(size, 0.01 * s as f64, 0.001))]).unwrap())
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| median_composite(black_box(&scenes), None).unwrap())
        });
    }
    group.finish();
}

fn bench_glcm(c: &mut Criterion) {
    let mut group = c.benchmark_group("texture/glcm");
    for size in [128, 256] {
        let hh = create_band(size, -20.0, 0.05);
        let params = GlcmParams::default();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| glcm_texture(black_box(&hh), "HH", &params).unwrap())
        });
    }
    group.finish();
}

fn bench_mode_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics/mode3x3");
    for size in [256, 512, 1024] {
        let classes = create_band(size, 1.0, 0.0).map(|v| (v as usize % 5 + 1) as f64);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| focal_statistics(black_box(&classes), FocalParams::mode3x3()).unwrap())
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let features: Vec<Vec<f64>> = (0..500).map(|i| vec![(i % 5) as f64, (i % 7) as f64]).collect();
    let labels: Vec<usize> = (0..500).map(|i| i % 5).collect();
    let names = vec!["a".to_string(), "b".to_string()];
    let forest = RandomForest::fit(&features, &labels, &names, &RandomForestConfig::default()).unwrap();

    let mut group = c.benchmark_group("classification/classify_stack");
    for size in [128, 256] {
        let stack = BandStack::from_bands([
            ("a", create_band(size, 0.0, 0.02)),
            ("b", create_band(size, 0.0, 0.03)),
        ])
        .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| classify_stack(black_box(&stack), &forest).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_ndvi,
    bench_median_composite,
    bench_glcm,
    bench_mode_filter,
    bench_classify
);
criterion_main!(benches);
