//! Benchmarks for the tracking hot paths
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple_core::reactive::{Effect, Memo, Observable, Signal};

// =============================================================================
// OBSERVABLE BENCHMARKS
// =============================================================================

fn bench_depend_untracked(c: &mut Criterion) {
    let observable = Observable::new();
    c.bench_function("depend_untracked", |b| {
        b.iter(|| black_box(&observable).depend())
    });
}

fn bench_notify_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("notify_fanout");

    for subscribers in [1usize, 8, 64] {
        let observable = Observable::new();
        let effects: Vec<_> = (0..subscribers)
            .map(|_| {
                let observable = observable.clone();
                Effect::new(move || observable.depend())
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| b.iter(|| observable.notify()),
        );

        drop(effects);
    }

    group.finish();
}

// =============================================================================
// SIGNAL / MEMO BENCHMARKS
// =============================================================================

fn bench_signal_set_with_effect(c: &mut Criterion) {
    let signal = Signal::new(0i32);
    let _effect = {
        let signal = signal.clone();
        Effect::new(move || {
            black_box(signal.get());
        })
    };

    c.bench_function("signal_set_with_effect", |b| {
        b.iter(|| signal.set(black_box(42)))
    });
}

fn bench_memo_chain(c: &mut Criterion) {
    let signal = Signal::new(1i64);
    let mut memo = {
        let signal = signal.clone();
        Memo::new(move || signal.get())
    };
    for _ in 0..16 {
        let previous = memo.clone();
        memo = Memo::new(move || previous.get() + 1);
    }

    c.bench_function("memo_chain_16", |b| {
        b.iter(|| {
            signal.update(|v| *v += 1);
            black_box(memo.get())
        })
    });
}

criterion_group!(
    benches,
    bench_depend_untracked,
    bench_notify_fanout,
    bench_signal_set_with_effect,
    bench_memo_chain,
);
criterion_main!(benches);
