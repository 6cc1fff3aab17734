use crate::{
    dsp::oscillator::{PhaseOscillator, Waveform},
    io::{midi_note_to_freq, AudioBuffer},
};

/*
Frequency-Modulated Oscillator
==============================

A carrier oscillator whose frequency is pushed around by a second, sine-only
modulator oscillator.

Vocabulary
----------

  carrier     The oscillator you hear. Its pitch comes from the MIDI note.

  modulator   A sine oscillator running at `rate` Hz. Slow rates give vibrato;
              audio rates give FM sidebands and metallic timbres.

  depth       How many Hz the modulator adds to or removes from the carrier
              frequency at its peaks.

  offset      The modulator's current contribution: `modulator × depth`.


The Math
--------

Every sample:

    offset    = sin(modulator_phase) × depth
    frequency = | note_hz + offset |
    output    = shape(carrier_phase)
    carrier_phase += 2π × frequency / sample_rate

Negative Frequencies
--------------------

With a deep modulation the sum `note_hz + offset` dips below zero. Rather
than clamping to 0 Hz (which would freeze the phase and silence the note for
part of every modulator cycle) the frequency is negated: the carrier keeps
running, reflected around 0 Hz, and the modulation stays audible.

Base Frequency Snapshot
-----------------------

`base_frequency()` reports the carrier frequency as of the last `set_note`
or `set_modulation_params` call: the note frequency plus the offset that
the modulator had at the end of the previous block. The render loop itself
does not depend on it; it recomputes the frequency every sample from the
live offset, so a change of depth or rate is heard from the next sample.
*/

pub struct FmOscillator {
    carrier: PhaseOscillator,
    modulator: PhaseOscillator,
    depth: f32,
    rate: f32,

    last_note: u8,
    note_frequency: f32,
    last_offset: f32,    // modulator offset at the end of the previous block
    base_frequency: f32, // |note_frequency + last_offset|

    prepared: bool,
    max_block_size: usize,
    num_channels: usize,
}

impl FmOscillator {
    pub fn new(waveform: Waveform) -> Self {
        let last_note = 69;
        let note_frequency = midi_note_to_freq(last_note);

        Self {
            carrier: PhaseOscillator::new(waveform),
            modulator: PhaseOscillator::sine(),
            depth: 0.0,
            rate: 0.0,
            last_note,
            note_frequency,
            last_offset: 0.0,
            base_frequency: note_frequency,
            prepared: false,
            max_block_size: 0,
            num_channels: 0,
        }
    }

    /// Prepare carrier and modulator for a block context. Must be called
    /// before rendering.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) {
        self.carrier.prepare(sample_rate);
        self.modulator.prepare(sample_rate);
        self.last_offset = 0.0;
        self.refresh_base_frequency();

        self.max_block_size = max_block_size;
        self.num_channels = num_channels;
        self.prepared = true;
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.carrier.set_waveform(waveform);
    }

    /// Select the waveform from its parameter index.
    ///
    /// An unknown index is a configuration bug: it trips a debug assertion and
    /// is otherwise ignored, keeping the last valid waveform.
    pub fn set_waveform_index(&mut self, index: u32) {
        match Waveform::from_index(index) {
            Some(waveform) => self.set_waveform(waveform),
            None => debug_assert!(false, "unknown waveform index {index}"),
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.carrier.waveform()
    }

    /// Tune the carrier to a MIDI note.
    pub fn set_note(&mut self, note: u8) {
        self.last_note = note;
        self.note_frequency = midi_note_to_freq(note);
        self.refresh_base_frequency();
    }

    pub fn note(&self) -> u8 {
        self.last_note
    }

    /// Set modulation depth (Hz) and modulator rate (Hz).
    ///
    /// Negative or non-finite values are treated as zero. The base frequency
    /// is recomputed from the stored note and the previous block's offset.
    pub fn set_modulation_params(&mut self, depth: f32, rate: f32) {
        self.depth = non_negative(depth);
        self.rate = non_negative(rate);
        self.modulator.set_frequency(self.rate);
        self.refresh_base_frequency();
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    /// Produce one mono sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let offset = self.modulator.next_sample() * self.depth;
        self.last_offset = offset;
        let frequency = (self.note_frequency + offset).abs();
        self.carrier.next_sample_at(frequency)
    }

    /// Render into a mono slice.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Render `num_samples` frames into the start of `block`, writing the same
    /// value to every channel.
    pub fn render_block(&mut self, block: &mut AudioBuffer, num_samples: usize) {
        debug_assert!(self.prepared, "FmOscillator rendered before prepare()");
        if !self.prepared {
            return;
        }
        debug_assert!(
            num_samples <= block.num_frames(),
            "block of {num_samples} frames exceeds buffer of {}",
            block.num_frames()
        );
        debug_assert!(
            num_samples <= self.max_block_size,
            "block of {num_samples} frames exceeds prepared size {}",
            self.max_block_size
        );
        debug_assert!(
            block.num_channels() <= self.num_channels,
            "{} channels requested, prepared for {}",
            block.num_channels(),
            self.num_channels
        );
        let num_samples = num_samples.min(block.num_frames());

        if block.num_channels() == 0 {
            for _ in 0..num_samples {
                self.next_sample();
            }
            return;
        }

        self.render(&mut block.channel_mut(0)[..num_samples]);
        block.mirror_first_channel(num_samples);
    }

    fn refresh_base_frequency(&mut self) {
        self.base_frequency = (self.note_frequency + self.last_offset).abs();
        self.carrier.set_frequency(self.base_frequency);
    }
}

#[inline]
fn non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
