#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
ADSR Envelope Implementation
============================

A linear four-stage amplitude envelope driven by a sample clock. One envelope
lives inside every voice; the voice multiplies its oscillator output by
`next_sample()` once per output frame.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0).

  stage       Idle, Attack, Decay, Sustain or Release.

  gate        note_on raises the gate (Attack), note_off lowers it (Release).

  progress    How far through the current stage we are, counted in samples:
              `elapsed / total`. Each ramping stage interpolates linearly
              between the level it started from and its target.


The Shape
---------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release


Counting Instead of Accumulating
--------------------------------

Each ramp stage knows how many samples it lasts:

    total = max(1, round(seconds * sample_rate))

and computes its level from the sample counter:

    level = start + (target - start) * elapsed / total

Summing a tiny per-sample increment thousands of times drifts in f32; the
counter form lands exactly on the target on sample `total`. A 0.5 s attack at
48 kHz therefore reaches 1.0 on sample 24000. Durations of zero or less
collapse to a single-sample stage, so nothing ever divides by zero.


Retriggering
------------

note_on does NOT reset the level. A note struck again during Release ramps up
from wherever the level currently is, so fast repeated notes never jump to
zero (which would click).

note_off starts Release from the CURRENT level, from any stage. Releasing an
idle envelope does nothing.


Changing Parameters Mid-Stage
-----------------------------

Parameters can change every block. A stage that is already running keeps its
progress ratio and continues against the new duration:

    elapsed' = round(elapsed / total * total')

Decay retargets to the new sustain level; Sustain snaps to it. Stage and level
are never reset by a parameter change.
*/

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Ramping from the entry level to 1.0
    Decay,   // Ramping from 1.0 to the sustain level
    Sustain, // Holding the sustain level while the gate is high
    Release, // Ramping from the entry level to 0.0
}

/// Envelope times in seconds and the sustain level (0.0 - 1.0).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl AdsrParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Replace anything unusable with the nearest valid value.
    pub fn sanitized(self) -> Self {
        Self {
            attack: sanitize_time(self.attack),
            decay: sanitize_time(self.decay),
            sustain: if self.sustain.is_finite() {
                self.sustain.clamp(0.0, 1.0)
            } else {
                0.0
            },
            release: sanitize_time(self.release),
        }
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self::new(0.1, 0.1, 1.0, 0.4)
    }
}

#[inline]
fn sanitize_time(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}

pub struct Envelope {
    params: AdsrParams,
    sample_rate: f32,

    // Runtime state
    stage: EnvelopeStage,
    level: f32,

    // Stage bookkeeping
    stage_start_level: f32, // level when the current stage began
    stage_elapsed: u32,     // samples spent in the current stage
    stage_total: u32,       // samples the current stage lasts
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_params(sample_rate, AdsrParams::default())
    }

    pub fn adsr(sample_rate: f32, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self::with_params(sample_rate, AdsrParams::new(attack, decay, sustain, release))
    }

    pub fn with_params(sample_rate: f32, params: AdsrParams) -> Self {
        Self {
            params: params.sanitized(),
            sample_rate: sanitize_rate(sample_rate),
            stage: EnvelopeStage::Idle,
            level: 0.0,
            stage_start_level: 0.0,
            stage_elapsed: 0,
            stage_total: 1,
        }
    }

    /// Change the sample clock. A running stage keeps its progress ratio.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_rate(sample_rate);
        self.rescale_current_stage();
        self.rebase_ramp();
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Store new ADSR values without resetting stage or level.
    pub fn set_parameters(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.set_params(AdsrParams::new(attack, decay, sustain, release));
    }

    pub fn set_params(&mut self, params: AdsrParams) {
        self.params = params.sanitized();

        if self.stage == EnvelopeStage::Sustain {
            self.level = self.params.sustain;
        } else {
            self.rescale_current_stage();
            self.rebase_ramp();
        }
    }

    pub fn params(&self) -> AdsrParams {
        self.params
    }

    /// Gate high: ramp towards 1.0 from the current level.
    pub fn note_on(&mut self) {
        self.enter(EnvelopeStage::Attack);
    }

    /// Gate low: start the release phase from the current level.
    pub fn note_off(&mut self) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }
        self.enter(EnvelopeStage::Release);
    }

    /// Advance the envelope by one sample and return the new level.
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                if self.advance_ramp(1.0) {
                    self.level = 1.0;
                    self.enter(EnvelopeStage::Decay);
                }
            }

            EnvelopeStage::Decay => {
                if self.advance_ramp(self.params.sustain) {
                    self.enter(EnvelopeStage::Sustain);
                }
            }

            EnvelopeStage::Sustain => {
                self.level = self.params.sustain;
            }

            EnvelopeStage::Release => {
                if self.advance_ramp(0.0) {
                    self.enter(EnvelopeStage::Idle);
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Force the envelope back to idle.
    pub fn reset(&mut self) {
        self.enter(EnvelopeStage::Idle);
    }

    /// Get the current envelope level (0.0 to 1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Get the current envelope stage
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    fn enter(&mut self, stage: EnvelopeStage) {
        self.stage = stage;
        self.stage_start_level = self.level;
        self.stage_elapsed = 0;
        self.stage_total = self.stage_samples(stage);

        match stage {
            EnvelopeStage::Idle => self.level = 0.0,
            EnvelopeStage::Sustain => self.level = self.params.sustain,
            _ => {}
        }
    }

    /// Step the linear ramp towards `target`. Returns true once the stage is done.
    #[inline]
    fn advance_ramp(&mut self, target: f32) -> bool {
        self.stage_elapsed = self.stage_elapsed.saturating_add(1);
        let progress = (self.stage_elapsed as f32 / self.stage_total as f32).min(1.0);
        self.level = (self.stage_start_level + (target - self.stage_start_level) * progress)
            .clamp(0.0, 1.0);
        self.stage_elapsed >= self.stage_total
    }

    fn stage_samples(&self, stage: EnvelopeStage) -> u32 {
        let seconds = match stage {
            EnvelopeStage::Attack => self.params.attack,
            EnvelopeStage::Decay => self.params.decay,
            EnvelopeStage::Release => self.params.release,
            EnvelopeStage::Idle | EnvelopeStage::Sustain => return 1,
        };
        (seconds * self.sample_rate).round().max(1.0) as u32
    }

    /// Level a ramping stage heads for.
    fn ramp_target(&self) -> Option<f32> {
        match self.stage {
            EnvelopeStage::Attack => Some(1.0),
            EnvelopeStage::Decay => Some(self.params.sustain),
            EnvelopeStage::Release => Some(0.0),
            EnvelopeStage::Idle | EnvelopeStage::Sustain => None,
        }
    }

    /// Move the ramp's start point so the current level lies on the line to
    /// the current target. The next sample continues from `level` without a
    /// step, even when the target (a new sustain) or the progress changed.
    fn rebase_ramp(&mut self) {
        let Some(target) = self.ramp_target() else {
            return;
        };
        let progress = self.stage_elapsed as f32 / self.stage_total as f32;
        if progress <= 0.0 {
            self.stage_start_level = self.level;
        } else if progress < 1.0 {
            self.stage_start_level = (self.level - target * progress) / (1.0 - progress);
        }
    }

    fn rescale_current_stage(&mut self) {
        let new_total = self.stage_samples(self.stage);
        if new_total == self.stage_total {
            return;
        }
        let ratio = self.stage_elapsed as f32 / self.stage_total as f32;
        self.stage_elapsed = (ratio * new_total as f32).round() as u32;
        self.stage_total = new_total;
    }
}

#[inline]
fn sanitize_rate(sample_rate: f32) -> f32 {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        debug_assert!(false, "sample rate must be positive, got {sample_rate}");
        48_000.0
    }
}
