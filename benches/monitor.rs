//! Benchmarks for formula compilation and event processing.
//!
//! Run with:
//! ```bash
//! cargo bench --bench monitor
//! ```

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ltl_rs::event::Event;
use ltl_rs::proposition::Proposition;
use ltl_rs::{compile, Formula};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const NAMES: [&str; 4] = ["req", "ack", "grant", "idle"];

fn p(name: &str) -> Formula {
    Formula::prop(Proposition::new(name))
}

/// `G(req → X F ack)`, nested `depth` times under `F`.
fn response(depth: usize) -> Formula {
    let mut f = Formula::always(Formula::implies(p("req"), Formula::next(Formula::eventually(p("ack")))));
    for _ in 0..depth {
        f = Formula::eventually(Formula::and(p("grant"), Formula::next(f)));
    }
    f
}

/// `p1 ∧ X(p2 ∧ X(... pn))`
fn chain(n: usize) -> Formula {
    let mut f = p(NAMES[(n - 1) % NAMES.len()]);
    for i in (0..n - 1).rev() {
        f = Formula::and(p(NAMES[i % NAMES.len()]), Formula::next(f));
    }
    f
}

/// Generate a deterministic random event stream.
fn random_events(seed: u64, count: usize) -> Vec<Event> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| Event::new(NAMES[rng.random_range(0..NAMES.len())]))
        .collect()
}

// ============================================================================
// Benchmark: Compilation
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for depth in [0, 1, 2, 3] {
        let f = response(depth);
        group.bench_with_input(BenchmarkId::new("response", depth), &f, |b, f| {
            b.iter(|| compile(black_box(f)).map(|a| a.states().len()))
        });
    }

    for n in [2, 4, 8, 16] {
        let f = chain(n);
        group.bench_with_input(BenchmarkId::new("chain", n), &f, |b, f| {
            b.iter(|| compile(black_box(f)).map(|a| a.states().len()))
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Event throughput
// ============================================================================

fn bench_accept(c: &mut Criterion) {
    let mut group = c.benchmark_group("accept");
    let events = random_events(42, 10_000);
    group.throughput(Throughput::Elements(events.len() as u64));

    for depth in [0, 2] {
        let f = response(depth);
        group.bench_with_input(BenchmarkId::new("response", depth), &events, |b, events| {
            b.iter_batched(
                || compile(&f).expect("formula has no triggers"),
                |mut monitor| {
                    for event in events {
                        monitor.accept(event.clone());
                    }
                    monitor.stats()
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    let f = chain(8);
    group.bench_with_input(BenchmarkId::new("chain", 8), &events, |b, events| {
        b.iter_batched(
            || compile(&f).expect("formula has no triggers"),
            |mut monitor| {
                for event in events {
                    monitor.accept(event.clone());
                }
                monitor.stats()
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_compile, bench_accept);
criterion_main!(benches);
