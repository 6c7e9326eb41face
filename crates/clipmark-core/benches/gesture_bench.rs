//! Benchmark: gesture recognizer throughput.
//!
//! Run with: `cargo bench -p clipmark-core --bench gesture_bench`
//!
//! Measures the per-lifecycle cost of the reducer for the three common
//! shapes of input: a resolved tap, a swipe with a dense move stream, and a
//! double tap.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use clipmark_core::{GestureRecognizer, PointerSample, TimerCommand, TimerKind};

fn tap(gr: &mut GestureRecognizer, t0: u64) {
    gr.on_pointer_down(PointerSample::new(100.0, 100.0, t0));
    let up = gr.on_pointer_up(PointerSample::new(101.0, 100.0, t0 + 60));
    for cmd in up.timers {
        if let TimerCommand::Schedule {
            kind: TimerKind::DoubleTapWait,
            token,
            ..
        } = cmd
        {
            black_box(gr.on_timer(TimerKind::DoubleTapWait, token));
        }
    }
}

fn swipe(gr: &mut GestureRecognizer, t0: u64) {
    gr.on_pointer_down(PointerSample::new(0.0, 100.0, t0));
    for i in 1..=60u64 {
        black_box(gr.on_pointer_move(PointerSample::new(i as f64 * 3.0, 100.0, t0 + i * 5)));
    }
    black_box(gr.on_pointer_up(PointerSample::new(180.0, 102.0, t0 + 300)));
}

fn double_tap(gr: &mut GestureRecognizer, t0: u64) {
    gr.on_pointer_down(PointerSample::new(10.0, 10.0, t0));
    gr.on_pointer_up(PointerSample::new(10.0, 10.0, t0 + 40));
    gr.on_pointer_down(PointerSample::new(11.0, 10.0, t0 + 120));
    black_box(gr.on_pointer_up(PointerSample::new(11.0, 10.0, t0 + 170)));
}

fn bench_lifecycles(c: &mut Criterion) {
    let mut group = c.benchmark_group("gesture_lifecycle");

    group.bench_function("tap", |b| {
        let mut gr = GestureRecognizer::default();
        let mut t = 0u64;
        b.iter(|| {
            t += 1_000;
            tap(&mut gr, t);
        });
    });

    group.bench_function("swipe_60_moves", |b| {
        let mut gr = GestureRecognizer::default();
        let mut t = 0u64;
        b.iter(|| {
            t += 1_000;
            swipe(&mut gr, t);
        });
    });

    group.bench_function("double_tap", |b| {
        let mut gr = GestureRecognizer::default();
        let mut t = 0u64;
        b.iter(|| {
            t += 1_000;
            double_tap(&mut gr, t);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_lifecycles);
criterion_main!(benches);
