//! Timbre parameters and their handoff to the render thread.
//!
//! The control side (UI, automation, CLI) owns a [`ParamHandle`] and edits a
//! private [`ParamSnapshot`]. `publish()` copies the whole snapshot onto a
//! lock-free ring; the render thread's [`ParamReceiver`] drains the ring once
//! per block and keeps the newest copy. Snapshots are plain `Copy` values, so
//! the render thread never reads memory the UI can mutate and never sees a
//! half-applied change.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::dsp::{envelope::AdsrParams, oscillator::Waveform};

/// Every user-tunable value the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    WaveType,
    FmFreq,
    FmDepth,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Inclusive value range of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

impl ParamId {
    pub const ALL: [ParamId; 7] = [
        ParamId::WaveType,
        ParamId::FmFreq,
        ParamId::FmDepth,
        ParamId::Attack,
        ParamId::Decay,
        ParamId::Sustain,
        ParamId::Release,
    ];

    /// Stable storage key.
    pub fn name(self) -> &'static str {
        match self {
            ParamId::WaveType => "OSC1WAVETYPE",
            ParamId::FmFreq => "OSC1FMFREQ",
            ParamId::FmDepth => "OSC1FMDEPTH",
            ParamId::Attack => "ATTACK",
            ParamId::Decay => "DECAY",
            ParamId::Sustain => "SUSTAIN",
            ParamId::Release => "RELEASE",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            ParamId::WaveType => "Osc 1 Wave Type",
            ParamId::FmFreq => "Osc 1 FM Frequency",
            ParamId::FmDepth => "Osc 1 FM Depth",
            ParamId::Attack => "Attack",
            ParamId::Decay => "Decay",
            ParamId::Sustain => "Sustain",
            ParamId::Release => "Release",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(name))
    }

    pub fn range(self) -> ParamRange {
        match self {
            ParamId::WaveType => ParamRange::new(0.0, 2.0),
            ParamId::FmFreq => ParamRange::new(0.0, 1000.0),
            ParamId::FmDepth => ParamRange::new(0.0, 1000.0),
            ParamId::Attack => ParamRange::new(0.1, 1.0),
            ParamId::Decay => ParamRange::new(0.1, 1.0),
            ParamId::Sustain => ParamRange::new(0.1, 1.0),
            ParamId::Release => ParamRange::new(0.1, 3.0),
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            ParamId::WaveType => 0.0,
            ParamId::FmFreq => 0.0,
            ParamId::FmDepth => 0.0,
            ParamId::Attack => 0.1,
            ParamId::Decay => 0.1,
            ParamId::Sustain => 1.0,
            ParamId::Release => 0.4,
        }
    }
}

/// The complete parameter set for one block.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub waveform: Waveform,
    /// Modulator rate in Hz
    pub fm_rate: f32,
    /// Modulation depth in Hz
    pub fm_depth: f32,
    pub envelope: AdsrParams,
    /// Bumped on every publish.
    pub version: u64,
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        let mut snapshot = Self {
            waveform: Waveform::Sine,
            fm_rate: 0.0,
            fm_depth: 0.0,
            envelope: AdsrParams::default(),
            version: 0,
        };
        for id in ParamId::ALL {
            snapshot.set(id, id.default_value());
        }
        snapshot
    }
}

impl ParamSnapshot {
    pub fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::WaveType => self.waveform.index() as f32,
            ParamId::FmFreq => self.fm_rate,
            ParamId::FmDepth => self.fm_depth,
            ParamId::Attack => self.envelope.attack,
            ParamId::Decay => self.envelope.decay,
            ParamId::Sustain => self.envelope.sustain,
            ParamId::Release => self.envelope.release,
        }
    }

    /// Set a value, clamped to the parameter's range. A wave type rounds to
    /// the nearest waveform index, so out-of-range indices select the nearest
    /// end of the table.
    ///
    /// Returns false when the value is rejected (non-finite input). A
    /// rejected value leaves the snapshot untouched.
    pub fn set(&mut self, id: ParamId, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        let value = id.range().clamp(value);

        match id {
            ParamId::WaveType => {
                let index = (value.round() as usize).min(Waveform::ALL.len() - 1);
                self.waveform = Waveform::ALL[index];
            }
            ParamId::FmFreq => self.fm_rate = value,
            ParamId::FmDepth => self.fm_depth = value,
            ParamId::Attack => self.envelope.attack = value,
            ParamId::Decay => self.envelope.decay = value,
            ParamId::Sustain => self.envelope.sustain = value,
            ParamId::Release => self.envelope.release = value,
        }
        true
    }

}

/// Create a connected handle/receiver pair holding up to `capacity`
/// unconsumed snapshots.
pub fn param_channel(capacity: usize, initial: ParamSnapshot) -> (ParamHandle, ParamReceiver) {
    let (tx, rx) = RingBuffer::<ParamSnapshot>::new(capacity.max(1));
    let handle = ParamHandle {
        tx,
        current: initial,
    };
    let receiver = ParamReceiver {
        rx,
        latest: initial,
    };
    (handle, receiver)
}

/// Control-side end of the parameter handoff.
pub struct ParamHandle {
    tx: Producer<ParamSnapshot>,
    current: ParamSnapshot,
}

impl ParamHandle {
    pub fn snapshot(&self) -> ParamSnapshot {
        self.current
    }

    /// Edit the local copy. Nothing reaches the engine until `publish()`.
    pub fn set(&mut self, id: ParamId, value: f32) -> bool {
        self.current.set(id, value)
    }

    /// Send the local copy to the render thread.
    ///
    /// Returns false if the ring is full. Nothing is lost in that case: the
    /// next successful publish carries every edit made so far.
    pub fn publish(&mut self) -> bool {
        self.current.version += 1;
        self.tx.push(self.current).is_ok()
    }

    pub fn set_and_publish(&mut self, id: ParamId, value: f32) -> bool {
        self.set(id, value) && self.publish()
    }
}

/// Render-side end of the parameter handoff.
pub struct ParamReceiver {
    rx: Consumer<ParamSnapshot>,
    latest: ParamSnapshot,
}

impl ParamReceiver {
    /// Drain pending snapshots and return the newest. Never allocates.
    pub fn latest(&mut self) -> &ParamSnapshot {
        while let Ok(snapshot) = self.rx.pop() {
            self.latest = snapshot;
        }
        &self.latest
    }
}
