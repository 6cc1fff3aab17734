//! Benchmarks for voices, pools and the engine block loop.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fmsynth::{
    dsp::{AdsrParams, Waveform},
    io::AudioBuffer,
    synth::{ParamSnapshot, SoundDescriptor, Voice, VoicePool},
    Engine, EngineConfig,
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;
const CHANNELS: usize = 2;
const POLYPHONY: &[usize] = &[1, 8, 32];

fn patch() -> ParamSnapshot {
    ParamSnapshot {
        waveform: Waveform::Saw,
        fm_rate: 110.0,
        fm_depth: 300.0,
        // Long sustain so held notes keep sounding for the whole run
        envelope: AdsrParams::new(0.1, 0.2, 0.8, 0.5),
        ..ParamSnapshot::default()
    }
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let params = patch();

    for &size in BLOCK_SIZES {
        let mut output = AudioBuffer::new(CHANNELS, size);

        // === SINGLE VOICE ===
        let mut voice = Voice::new();
        voice.prepare(SAMPLE_RATE, size, CHANNELS);
        voice.apply_params(&params);
        voice.start_note(45, 1.0, 1, &SoundDescriptor::Universal, 0);
        group.bench_with_input(BenchmarkId::new("voice", size), &size, |b, _| {
            b.iter(|| {
                output.clear();
                voice.render_block(black_box(&mut output), 0, size);
            })
        });

        // === HELD CHORDS ===
        for &count in POLYPHONY {
            let mut pool = VoicePool::with_voices(count);
            pool.prepare(SAMPLE_RATE, size, CHANNELS);
            pool.apply_params(&params);
            for i in 0..count {
                pool.handle_note_on(36 + i as u8, 1.0, 1);
            }

            let id = BenchmarkId::new(format!("pool_{count}"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| {
                    output.clear();
                    pool.render_block(black_box(&mut output), &[], 0, size);
                })
            });
        }

        // === ENGINE BLOCK LOOP ===
        // Includes parameter and note queue draining
        let config = EngineConfig::default()
            .with_max_block_size(size)
            .with_params(params);
        let Ok((mut engine, mut handle)) = Engine::new(config) else {
            continue;
        };
        for note in [48, 52, 55, 59] {
            handle.note_on(note, 1.0, 1);
        }
        group.bench_with_input(BenchmarkId::new("engine_4_notes", size), &size, |b, _| {
            b.iter(|| {
                engine.process_block(black_box(&mut output), &[]);
            })
        });
    }

    group.finish();
}
