//! Realtime playback on the default output device

use std::{thread, time::Duration};

use color_eyre::eyre::{eyre, Result, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use fmsynth::{io::AudioBuffer, Engine, EngineConfig};

use crate::render::Score;

const MIDI_CHANNEL: u8 = 1;

pub fn run(config: EngineConfig, score: &Score) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let stream_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = stream_config.sample_rate().0 as f32;
    let channels = stream_config.channels() as usize;
    info!(device = %device.name().unwrap_or_default(), sample_rate, channels, "audio output");

    let max_block_size = config.max_block_size;
    let (mut engine, mut handle) = Engine::new(
        config
            .with_sample_rate(sample_rate)
            .with_channels(channels),
    )
    .wrap_err("invalid engine configuration")?;

    // The engine moves into the callback; the handle stays here
    let mut block = AudioBuffer::new(channels, max_block_size);
    let stream = device.build_output_stream(
        &stream_config.into(),
        move |data: &mut [f32], _| {
            let total_frames = data.len() / channels;
            let mut frames_written = 0;

            while frames_written < total_frames {
                let frames = (total_frames - frames_written).min(max_block_size);
                block.clear_range(0, frames);
                engine.render_into(&mut block, &[], 0, frames);
                block.write_interleaved(&mut data[frames_written * channels..], frames);
                frames_written += frames;
            }
        },
        |err| error!(%err, "audio stream error"),
        None,
    )?;
    stream.play()?;

    for &note in &score.notes {
        handle.note_on(note, score.velocity, MIDI_CHANNEL);
    }
    thread::sleep(Duration::from_secs_f32(score.hold_seconds.max(0.0)));
    handle.poll_telemetry();

    for &note in &score.notes {
        handle.note_off(note, 0.0, MIDI_CHANNEL, true);
    }
    thread::sleep(Duration::from_secs_f32(score.tail_seconds.max(0.0)));
    handle.poll_telemetry();

    info!("playback finished");
    Ok(())
}
