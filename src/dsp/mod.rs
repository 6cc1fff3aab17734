//! Low-level DSP primitives used by the voices.
//!
//! These components are allocation-free and realtime-safe once prepared,
//! making them safe to embed directly inside voice structs.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Carrier oscillator with a sine frequency modulator.
pub mod fm;
/// Phase accumulator oscillator and its waveforms.
pub mod oscillator;

pub use envelope::{AdsrParams, Envelope, EnvelopeStage};
pub use fm::FmOscillator;
pub use oscillator::{PhaseOscillator, Waveform};
