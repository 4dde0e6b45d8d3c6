//! # Waypoint Discretiser Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nalgebra::Point2;
use nav_lib::nav::{WaypointDiscretiser, WaypointParams};

fn waypoints_benchmark(c: &mut Criterion) {
    // ---- Build a dense global path ----

    // Spiral out from the origin, sampled every 5 cm or so
    let path: Vec<Point2<f64>> = (0..20_000)
        .map(|i| {
            let t = i as f64 * 0.005;
            let r = 1.0 + 0.5 * t;
            Point2::new(r * t.cos(), r * t.sin())
        })
        .collect();

    let discretiser = WaypointDiscretiser::new(WaypointParams {
        min_spacing_m: 0.5,
        max_spacing_m: 0.75,
    })
    .unwrap();

    c.bench_function("WaypointDiscretiser::discretise", |b| {
        b.iter(|| discretiser.discretise(black_box(&path)))
    });

    // Sparse path, where most waypoints are interpolated
    let sparse: Vec<Point2<f64>> = path.iter().step_by(100).copied().collect();

    c.bench_function("WaypointDiscretiser::discretise::sparse", |b| {
        b.iter(|| discretiser.discretise(black_box(&sparse)))
    });
}

criterion_group!(benches, waypoints_benchmark);
criterion_main!(benches);
