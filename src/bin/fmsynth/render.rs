//! Offline rendering to WAV

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, info};

use fmsynth::{
    analysis::{peak, rms, PitchAnalyzer},
    engine::traits::{NoteTarget, Renderable},
    io::AudioBuffer,
    synth::ParamId,
    Engine, EngineConfig,
};

const FFT_LEN: usize = 8192;
const MIDI_CHANNEL: u8 = 1;

/// Notes held together, then released.
pub struct Score {
    pub notes: Vec<u8>,
    pub velocity: f32,
    pub hold_seconds: f32,
    pub tail_seconds: f32,
}

impl Score {
    fn frames(seconds: f32, sample_rate: f32) -> usize {
        (seconds.max(0.0) * sample_rate).round() as usize
    }
}

/// Rendered audio: interleaved for the file, channel 0 for analysis.
pub struct Bounce {
    pub interleaved: Vec<f32>,
    pub mono: Vec<f32>,
    pub channels: usize,
}

/// Play `score` through `synth` block by block.
///
/// Note-offs land exactly on the hold boundary: the block containing it is
/// split there.
pub fn bounce<S>(synth: &mut S, score: &Score, sample_rate: f32, block_size: usize, channels: usize) -> Bounce
where
    S: Renderable + NoteTarget,
{
    let hold = Score::frames(score.hold_seconds, sample_rate);
    let total = hold + Score::frames(score.tail_seconds, sample_rate);

    let mut block = AudioBuffer::new(channels, block_size);
    let mut interleaved = vec![0.0; total * channels];
    let mut mono = Vec::with_capacity(total);

    for &note in &score.notes {
        synth.note_on(note, score.velocity, MIDI_CHANNEL);
    }

    let mut released = false;
    let mut position = 0;
    while position < total {
        if !released && position >= hold {
            for &note in &score.notes {
                synth.note_off(note, 0.0, MIDI_CHANNEL, true);
            }
            released = true;
        }

        let mut frames = (total - position).min(block_size);
        if !released {
            frames = frames.min(hold - position);
        }

        block.clear_range(0, frames);
        synth.render(&mut block, 0, frames);
        block.write_interleaved(&mut interleaved[position * channels..], frames);
        mono.extend_from_slice(&block.channel(0)[..frames]);

        position += frames;
    }

    Bounce {
        interleaved,
        mono,
        channels,
    }
}

pub fn write_wav(path: &Path, bounce: &Bounce, sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: bounce.channels as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;
    for &sample in &bounce.interleaved {
        writer.write_sample(sample)?;
    }
    writer.finalize().wrap_err("failed to finalize WAV file")?;
    Ok(())
}

pub fn run(config: EngineConfig, score: &Score, out: &Path) -> Result<()> {
    let sample_rate = config.sample_rate;
    let block_size = config.max_block_size;
    let channels = config.channels;
    for id in ParamId::ALL {
        debug!(param = id.label(), value = config.params.get(id), "patch");
    }

    let (mut engine, mut handle) = Engine::new(config).wrap_err("invalid engine configuration")?;

    info!(
        notes = ?score.notes,
        hold = score.hold_seconds,
        tail = score.tail_seconds,
        "rendering"
    );
    let bounce = bounce(&mut engine, score, sample_rate, block_size, channels);
    handle.poll_telemetry();

    write_wav(out, &bounce, sample_rate as u32)?;

    // Measure the end of the hold, where the envelope sits at sustain
    let mut analyzer = PitchAnalyzer::new(FFT_LEN, sample_rate);
    let hold_end = Score::frames(score.hold_seconds, sample_rate).min(bounce.mono.len());
    let window_start = hold_end.saturating_sub(analyzer.fft_len());
    let pitch = analyzer.dominant_frequency(&bounce.mono[window_start..hold_end]);
    info!(
        path = %out.display(),
        frames = bounce.mono.len(),
        rms = rms(&bounce.mono),
        peak = peak(&bounce.mono),
        dominant_hz = ?pitch,
        "render complete"
    );
    Ok(())
}
