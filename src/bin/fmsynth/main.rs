//! fmsynth - render or play chords through the FM voice engine
//!
//! Run with: cargo run -- render --out chord.wav --notes 60,64,67

mod app;
mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use fmsynth::{
    dsp::{AdsrParams, Waveform},
    synth::ParamSnapshot,
    EngineConfig,
};

#[derive(Parser)]
#[command(name = "fmsynth")]
#[command(about = "Polyphonic FM voice engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a held chord to a WAV file
    Render {
        /// Output WAV path
        #[arg(short, long)]
        out: PathBuf,

        /// Sample rate in Hz
        #[arg(short, long, default_value = "48000")]
        sample_rate: u32,

        /// Frames per block
        #[arg(short, long, default_value = "512")]
        block_size: usize,

        #[command(flatten)]
        score: ScoreArgs,

        #[command(flatten)]
        synth: SynthArgs,
    },
    /// Play a held chord on the default output device
    Play {
        #[command(flatten)]
        score: ScoreArgs,

        #[command(flatten)]
        synth: SynthArgs,
    },
}

#[derive(Args, Clone)]
struct ScoreArgs {
    /// MIDI notes to hold, comma separated
    #[arg(short, long, value_delimiter = ',', default_value = "60,64,67")]
    notes: Vec<u8>,

    /// Note velocity (0-1)
    #[arg(long, default_value = "0.8")]
    velocity: f32,

    /// Seconds the notes are held
    #[arg(long, default_value = "1.0")]
    hold: f32,

    /// Seconds rendered after note-off
    #[arg(long, default_value = "1.0")]
    tail: f32,
}

#[derive(Args, Clone)]
struct SynthArgs {
    /// Number of voices
    #[arg(short, long, default_value = "8")]
    voices: usize,

    /// Carrier waveform
    #[arg(short, long, value_enum, default_value = "sine")]
    wave: Wave,

    /// Modulator rate in Hz
    #[arg(long, default_value = "0.0")]
    fm_rate: f32,

    /// Modulation depth in Hz
    #[arg(long, default_value = "0.0")]
    fm_depth: f32,

    #[arg(long, default_value = "0.1")]
    attack: f32,

    #[arg(long, default_value = "0.1")]
    decay: f32,

    #[arg(long, default_value = "1.0")]
    sustain: f32,

    #[arg(long, default_value = "0.4")]
    release: f32,
}

#[derive(Copy, Clone, ValueEnum)]
enum Wave {
    Sine,
    Saw,
    Square,
}

impl From<Wave> for Waveform {
    fn from(wave: Wave) -> Self {
        match wave {
            Wave::Sine => Waveform::Sine,
            Wave::Saw => Waveform::Saw,
            Wave::Square => Waveform::Square,
        }
    }
}

impl SynthArgs {
    fn params(&self) -> ParamSnapshot {
        ParamSnapshot {
            waveform: self.wave.into(),
            fm_rate: self.fm_rate,
            fm_depth: self.fm_depth,
            envelope: AdsrParams::new(self.attack, self.decay, self.sustain, self.release),
            ..ParamSnapshot::default()
        }
    }

    fn config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_voices(self.voices)
            .with_params(self.params())
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            out,
            sample_rate,
            block_size,
            score,
            synth,
        } => {
            let config = synth
                .config()
                .with_sample_rate(sample_rate as f32)
                .with_max_block_size(block_size);
            render::run(config, &score.into(), &out)
        }
        Commands::Play { score, synth } => app::run(synth.config(), &score.into()),
    }
}

impl From<ScoreArgs> for render::Score {
    fn from(args: ScoreArgs) -> Self {
        render::Score {
            notes: args.notes,
            velocity: args.velocity,
            hold_seconds: args.hold,
            tail_seconds: args.tail,
        }
    }
}
