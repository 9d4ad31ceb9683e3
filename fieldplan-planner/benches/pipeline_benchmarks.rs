//! Criterion benchmarks for the planning pipeline.
//!
//! Measures end-to-end planning across field sizes, plus the two stages that
//! dominate run time (tessellation and depot placement), to catch regressions
//! in the native solvers.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package fieldplan-planner
//! ```

// Criterion macros generate code that triggers missing_docs warnings.
#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fieldplan_core::test_support::{metric_crs, scattered_targets, square_region};
use fieldplan_core::{Layer, PlanningConfig, TessellationParams};
use fieldplan_planner::Planner;

/// Square field sides in metres.
const FIELD_SIDES: &[f64] = &[200.0, 400.0, 600.0];

/// Fixed seed so every sample plans the same field.
const BENCHMARK_SEED: u64 = 0x5EED;

fn config() -> PlanningConfig {
    PlanningConfig {
        tessellation: TessellationParams::default().with_seed(BENCHMARK_SEED),
        ..PlanningConfig::default()
    }
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    let planner = Planner::new(config());
    for &side in FIELD_SIDES {
        let region = square_region(side);
        let targets = Layer::new(
            metric_crs(),
            scattered_targets(200, region.extent(), BENCHMARK_SEED),
        );
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| planner.plan(black_box(&region), black_box(&targets)));
        });
    }
    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");
    group.sample_size(10);

    let planner = Planner::new(config());
    let region = square_region(400.0);
    group.bench_function("tessellate", |b| {
        b.iter(|| planner.tessellate(black_box(&region)));
    });

    if let Ok(tessellated) = planner.tessellate(&region) {
        group.bench_function("place_depots", |b| {
            b.iter(|| planner.place_depots(black_box(&tessellated.cells), black_box(&region)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plan, bench_stages);
criterion_main!(benches);
