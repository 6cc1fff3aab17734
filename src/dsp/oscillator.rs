#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/*
Phase Oscillator
================

The oscillator keeps a phase in [-π, π) and advances it by

    increment = 2π × frequency / sample_rate

every sample. A shaping function turns the phase into a sample:

    Sine    sin(φ)                    pure tone, fundamental only
    Saw     φ / π                     ramp from -1 to +1, all harmonics
    Square  -1 if φ < 0, else +1      odd harmonics only

Saw and square are naive: no band-limiting, so high notes alias.

The phase is wrapped back into the domain after every step.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Saw,
    Square,
}

impl Waveform {
    pub const ALL: [Waveform; 3] = [Waveform::Sine, Waveform::Saw, Waveform::Square];

    /// Map the parameter-storage index (`Sine = 0`, `Saw = 1`, `Square = 2`).
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Waveform::Sine),
            1 => Some(Waveform::Saw),
            2 => Some(Waveform::Square),
            _ => None,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            Waveform::Sine => 0,
            Waveform::Saw => 1,
            Waveform::Square => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Saw => "Saw",
            Waveform::Square => "Square",
        }
    }

    /// Shape a phase in [-π, π) into a sample in [-1, 1].
    #[inline]
    pub fn shape(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Saw => phase / PI,
            Waveform::Square => {
                if phase < 0.0 {
                    -1.0
                } else {
                    1.0
                }
            }
        }
    }
}

/// Single naive oscillator with a wrapped phase accumulator.
#[derive(Debug, Clone)]
pub struct PhaseOscillator {
    waveform: Waveform,
    phase: f32,
    frequency: f32,
    increment: f32,
    sample_rate: f32,
}

impl PhaseOscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: -PI,
            frequency: 0.0,
            increment: 0.0,
            sample_rate: 48_000.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    /// Set the sample clock and restart the phase.
    pub fn prepare(&mut self, sample_rate: f32) {
        debug_assert!(sample_rate > 0.0, "sample rate must be positive");
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.sample_rate = sample_rate;
        }
        self.reset();
        self.set_frequency(self.frequency);
    }

    pub fn reset(&mut self) {
        self.phase = -PI;
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = if frequency.is_finite() { frequency } else { 0.0 };
        self.increment = self.increment_for(self.frequency);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Produce one sample at the stored frequency.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let out = self.waveform.shape(self.phase);
        self.phase = wrap_phase(self.phase + self.increment);
        out
    }

    /// Produce one sample at an instantaneous frequency, leaving the stored
    /// frequency untouched.
    #[inline]
    pub fn next_sample_at(&mut self, frequency: f32) -> f32 {
        let out = self.waveform.shape(self.phase);
        self.phase = wrap_phase(self.phase + self.increment_for(frequency));
        out
    }

    #[inline]
    fn increment_for(&self, frequency: f32) -> f32 {
        TAU * frequency / self.sample_rate
    }
}

/// Fold a phase back into [-π, π).
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    if (-PI..PI).contains(&phase) {
        return phase;
    }
    if !phase.is_finite() {
        return -PI;
    }
    let wrapped = (phase + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to exactly TAU
    if wrapped >= PI {
        wrapped - TAU
    } else {
        wrapped
    }
}
