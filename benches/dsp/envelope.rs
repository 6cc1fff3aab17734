//! Benchmarks for ADSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fmsynth::dsp::envelope::Envelope;

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let mut env = Envelope::adsr(SAMPLE_RATE, 1.0, 0.1, 0.7, 0.3);
        env.note_on();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Sustain phase (holding steady)
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.001, 0.001, 0.7, 0.3);
        env.note_on();
        // Advance past attack/decay
        for _ in 0..200 {
            env.next_sample();
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Release phase; re-gated each iteration so it never runs out
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.001, 0.001, 0.7, 3.0);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.note_on();
                env.note_off();
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
