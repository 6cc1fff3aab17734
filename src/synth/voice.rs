use crate::{
    dsp::{
        envelope::{AdsrParams, Envelope, EnvelopeStage},
        fm::FmOscillator,
        oscillator::Waveform,
    },
    io::AudioBuffer,
    synth::{params::ParamSnapshot, sound::SoundDescriptor},
};

/// Static output gain applied to every voice.
pub const VOICE_GAIN: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// One oscillator → gain → envelope chain bound to at most one note.
///
/// The voice state is derived from the envelope: a voice is active exactly
/// while its envelope is not idle.
pub struct Voice {
    oscillator: FmOscillator,
    envelope: Envelope,
    gain: f32,

    // Private render buffers, sized in prepare()
    scratch: AudioBuffer,
    envelope_buffer: Vec<f32>,
    prepared: bool,

    note: Option<u8>,
    channel: u8,
    velocity: f32,
    pitch_wheel: i16,
}

impl Voice {
    pub fn new() -> Self {
        Self {
            oscillator: FmOscillator::new(Waveform::Sine),
            envelope: Envelope::new(48_000.0),
            gain: VOICE_GAIN,
            scratch: AudioBuffer::default(),
            envelope_buffer: Vec::new(),
            prepared: false,
            note: None,
            channel: 0,
            velocity: 0.0,
            pitch_wheel: 0,
        }
    }

    /// Size the private buffers and prepare the oscillator and envelope.
    /// Allocates; call it before rendering, never from the audio callback.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) {
        self.envelope.set_sample_rate(sample_rate);
        self.oscillator
            .prepare(sample_rate, max_block_size, num_channels);

        self.scratch.resize(num_channels, max_block_size);
        self.envelope_buffer.clear();
        self.envelope_buffer.resize(max_block_size, 0.0);

        self.gain = VOICE_GAIN;
        self.prepared = true;
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Every voice can play every sound: there is a single timbre class.
    pub fn can_handle(&self, _sound: &SoundDescriptor) -> bool {
        true
    }

    /// Bind a note and open the envelope.
    ///
    /// Velocity and pitch wheel are recorded but shape neither amplitude nor
    /// pitch. A voice that is still sounding is simply rebound; its envelope
    /// ramps up from the current level.
    pub fn start_note(
        &mut self,
        note: u8,
        velocity: f32,
        channel: u8,
        _sound: &SoundDescriptor,
        pitch_wheel: i16,
    ) {
        self.note = Some(note);
        self.channel = channel;
        self.velocity = velocity;
        self.pitch_wheel = pitch_wheel;

        self.oscillator.set_note(note);
        self.envelope.note_on();
    }

    /// Release the note.
    ///
    /// With `allow_tail_off` the envelope runs its release and the voice frees
    /// itself once it finishes. Without it (or when the envelope is already
    /// silent) the voice is cut and freed immediately.
    pub fn stop_note(&mut self, _velocity: f32, allow_tail_off: bool) {
        self.envelope.note_off();

        if !allow_tail_off || !self.envelope.is_active() {
            self.retire();
        }
    }

    pub fn update_envelope(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.envelope.set_parameters(attack, decay, sustain, release);
    }

    pub fn set_envelope(&mut self, params: AdsrParams) {
        self.envelope.set_params(params);
    }

    /// Push a block's worth of timbre parameters into this voice.
    pub fn apply_params(&mut self, params: &ParamSnapshot) {
        self.oscillator.set_waveform(params.waveform);
        self.oscillator
            .set_modulation_params(params.fm_depth, params.fm_rate);
        self.set_envelope(params.envelope);
    }

    pub fn oscillator(&self) -> &FmOscillator {
        &self.oscillator
    }

    pub fn oscillator_mut(&mut self) -> &mut FmOscillator {
        &mut self.oscillator
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Add `num_samples` frames of this voice into `output` at `start_sample`.
    ///
    /// Returns true when the voice finished during this call and is idle
    /// again. Rendering never overwrites what is already in `output`.
    pub fn render_block(
        &mut self,
        output: &mut AudioBuffer,
        start_sample: usize,
        num_samples: usize,
    ) -> bool {
        debug_assert!(self.prepared, "Voice rendered before prepare()");
        if !self.prepared || !self.is_active() {
            return false;
        }

        debug_assert!(
            num_samples <= self.scratch.num_frames(),
            "block of {num_samples} frames exceeds prepared size {}",
            self.scratch.num_frames()
        );
        let num_samples = num_samples
            .min(self.scratch.num_frames())
            .min(output.num_frames().saturating_sub(start_sample));

        self.scratch.clear_range(0, num_samples);
        self.oscillator.render_block(&mut self.scratch, num_samples);

        // One envelope value per frame, applied to the same frame of every channel
        let envelope = &mut self.envelope_buffer[..num_samples];
        self.envelope.render(envelope);

        let gain = self.gain;
        for channel in self.scratch.channels_mut() {
            for (sample, &level) in channel[..num_samples].iter_mut().zip(envelope.iter()) {
                *sample *= gain * level;
            }
        }

        output.add_from(&self.scratch, start_sample, num_samples);

        if !self.envelope.is_active() {
            self.retire();
            return true;
        }
        false
    }

    pub fn state(&self) -> VoiceState {
        match self.envelope.stage() {
            EnvelopeStage::Idle => VoiceState::Idle,
            EnvelopeStage::Release => VoiceState::Releasing,
            _ => VoiceState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    pub fn is_idle(&self) -> bool {
        !self.is_active()
    }

    pub fn note(&self) -> Option<u8> {
        self.note
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn pitch_wheel(&self) -> i16 {
        self.pitch_wheel
    }

    /// True when this voice is sounding `note` on `channel` (releasing included).
    pub fn is_playing(&self, note: u8, channel: u8) -> bool {
        self.is_active() && self.note == Some(note) && self.channel == channel
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    fn retire(&mut self) {
        self.envelope.reset();
        self.note = None;
        self.velocity = 0.0;
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::new()
    }
}
