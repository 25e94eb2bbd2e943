use criterion::{Criterion, black_box, criterion_group, criterion_main};
use dr_hist::{Binning, Histogram1D, Histogram2D};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn bench_fill_1d(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<f64> = (0..100_000).map(|_| rng.random_range(5.0..75.0)).collect();

    c.bench_function("fill_1d_600_bins_100k", |b| {
        b.iter(|| {
            let mut h = Histogram1D::new("t", Binning::new(600, 10.0, 70.0).unwrap());
            for &v in &values {
                h.fill_weighted(black_box(v), 1.0);
            }
            black_box(h.total_weight())
        })
    });
}

fn bench_fill_2d(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let points: Vec<(f64, f64, f64)> = (0..100_000)
        .map(|_| {
            (
                2.5 * rng.random_range(0..170) as f64,
                2.5 * rng.random_range(0..170) as f64,
                rng.random_range(0..60) as f64,
            )
        })
        .collect();

    c.bench_function("fill_2d_160x160_100k", |b| {
        b.iter(|| {
            let axis = Binning::new(160, -0.5, 400.0).unwrap();
            let mut h = Histogram2D::new("map", axis, axis);
            for &(x, y, w) in &points {
                h.fill_weighted(black_box(x), black_box(y), w);
            }
            black_box(h.total_weight())
        })
    });
}

criterion_group!(benches, bench_fill_1d, bench_fill_2d);
criterion_main!(benches);
