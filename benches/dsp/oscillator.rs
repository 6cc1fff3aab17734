//! Benchmarks for the phase oscillator and the FM oscillator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fmsynth::dsp::{
    fm::FmOscillator,
    oscillator::{PhaseOscillator, Waveform},
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for waveform in Waveform::ALL {
            let mut osc = PhaseOscillator::new(waveform);
            osc.prepare(SAMPLE_RATE);
            osc.set_frequency(440.0);
            group.bench_with_input(BenchmarkId::new(waveform.name(), size), &size, |b, _| {
                b.iter(|| {
                    for sample in buffer.iter_mut() {
                        *sample = osc.next_sample();
                    }
                    black_box(&buffer);
                })
            });
        }

        // Carrier with a silent modulator: the per-sample FM bookkeeping alone
        let mut plain = FmOscillator::new(Waveform::Sine);
        plain.prepare(SAMPLE_RATE, size, 1);
        plain.set_note(69);
        group.bench_with_input(BenchmarkId::new("fm_depth_0", size), &size, |b, _| {
            b.iter(|| {
                plain.render(black_box(&mut buffer));
            })
        });

        // Deep audio-rate modulation, crossing 0 Hz every cycle
        let mut deep = FmOscillator::new(Waveform::Saw);
        deep.prepare(SAMPLE_RATE, size, 1);
        deep.set_note(48);
        deep.set_modulation_params(800.0, 220.0);
        group.bench_with_input(BenchmarkId::new("fm_deep", size), &size, |b, _| {
            b.iter(|| {
                deep.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
