//! Correction engine benchmark suite.
//!
//! The correction/update pair sits on the hot path of every simulation step,
//! so both are benchmarked over growing pillar counts.
//!
//! Run with:
//! - `cargo bench -p symbolic-gravity-core --bench correction_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

use symbolic_gravity_core::engine::ResidualCorrectionEngine;

/// Deterministic symbol vector; same seed always produces the same values.
fn generate_symbol_vec(pillars: usize) -> HashMap<String, f32> {
    (0..pillars)
        .map(|i| (format!("pillar_{i}"), ((i as f32 * 0.73).sin() + 1.0) / 2.0))
        .collect()
}

fn warmed_engine(symbol_vec: &HashMap<String, f32>) -> ResidualCorrectionEngine {
    let mut engine = ResidualCorrectionEngine::new(0.05, 0.01).unwrap();
    for i in 0..10 {
        engine.update_weights(if i % 2 == 0 { 1.0 } else { -0.5 }, symbol_vec);
    }
    engine
}

fn bench_apply_correction(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_correction");
    for pillars in [4, 16, 64].iter() {
        let symbol_vec = generate_symbol_vec(*pillars);
        let engine = warmed_engine(&symbol_vec);
        group.bench_with_input(BenchmarkId::from_parameter(pillars), pillars, |b, _| {
            b.iter(|| engine.apply_correction(black_box(10.0), black_box(&symbol_vec)))
        });
    }
    group.finish();
}

fn bench_update_weights(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_weights");
    for pillars in [4, 16, 64].iter() {
        let symbol_vec = generate_symbol_vec(*pillars);
        let mut engine = warmed_engine(&symbol_vec);
        group.bench_with_input(BenchmarkId::from_parameter(pillars), pillars, |b, _| {
            b.iter(|| engine.update_weights(black_box(0.5), black_box(&symbol_vec)))
        });
    }
    group.finish();
}

fn bench_correct_then_update(c: &mut Criterion) {
    let symbol_vec = generate_symbol_vec(16);
    let mut engine = warmed_engine(&symbol_vec);
    c.bench_function("correct_then_update_16_pillars", |b| {
        b.iter(|| {
            let outcome = engine.apply_correction(black_box(10.0), black_box(&symbol_vec));
            engine.update_weights(black_box(12.0 - 10.0), black_box(&symbol_vec));
            outcome.corrected
        })
    });
}

criterion_group!(
    benches,
    bench_apply_correction,
    bench_update_weights,
    bench_correct_then_update
);
criterion_main!(benches);
