use rtrb::Producer;

use crate::{
    engine::traits::{NoteTarget, Renderable},
    io::{AudioBuffer, TimedEvent},
    synth::{
        message::{EventSink, VoiceEvent},
        params::ParamSnapshot,
        sound::SoundDescriptor,
        voice::{Voice, VoiceState},
    },
};

/// Pitch wheel position handed to voices (centred; the engine has no bend).
const CENTRED_PITCH_WHEEL: i16 = 0;

/// Fixed set of voices plus the sounds they may play.
///
/// Voices and sounds are added at configuration time. Rendering never
/// allocates: the mix accumulator is sized in [`VoicePool::prepare`].
pub struct VoicePool {
    voices: Vec<Voice>,
    sounds: Vec<SoundDescriptor>,
    mix: AudioBuffer,
    telemetry: Option<Producer<VoiceEvent>>,
    prepared: bool,
}

impl VoicePool {
    pub fn new() -> Self {
        Self {
            voices: Vec::new(),
            sounds: Vec::new(),
            mix: AudioBuffer::default(),
            telemetry: None,
            prepared: false,
        }
    }

    /// A pool of `count` voices playing one universal sound.
    pub fn with_voices(count: usize) -> Self {
        let mut pool = Self::new();
        pool.add_sound(SoundDescriptor::Universal);
        for _ in 0..count {
            pool.add_voice(Voice::new());
        }
        pool
    }

    pub fn add_voice(&mut self, voice: Voice) {
        self.voices.push(voice);
    }

    pub fn add_sound(&mut self, sound: SoundDescriptor) {
        self.sounds.push(sound);
    }

    pub fn set_telemetry(&mut self, producer: Producer<VoiceEvent>) {
        self.telemetry = Some(producer);
    }

    /// Push an event onto the telemetry ring, if one is attached.
    pub fn report(&mut self, event: VoiceEvent) {
        self.telemetry.emit(event);
    }

    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) {
        for voice in &mut self.voices {
            voice.prepare(sample_rate, max_block_size, num_channels);
        }
        self.mix.resize(num_channels, max_block_size);
        self.prepared = true;
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn num_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Push the block's parameters into every voice.
    pub fn apply_params(&mut self, params: &ParamSnapshot) {
        for voice in &mut self.voices {
            voice.apply_params(params);
        }
    }

    /// Start a note on the first idle voice able to play it.
    ///
    /// A voice still holding the same note on the same channel is released
    /// first (with tail-off), so a repeated key never stacks two sustained
    /// copies. Returns the voice index, or `None` if no sound applies or every
    /// voice is busy. A busy pool drops the note (no stealing) and reports it
    /// through telemetry.
    pub fn handle_note_on(&mut self, note: u8, velocity: f32, channel: u8) -> Option<usize> {
        let sound = *self.sounds.iter().find(|s| s.applies_to(note, channel))?;

        for voice in &mut self.voices {
            if voice.is_playing(note, channel) && voice.state() != VoiceState::Releasing {
                voice.stop_note(0.0, true);
            }
        }

        let free = self
            .voices
            .iter()
            .position(|v| v.is_idle() && v.can_handle(&sound));

        match free {
            Some(index) => {
                self.voices[index].start_note(note, velocity, channel, &sound, CENTRED_PITCH_WHEEL);
                self.telemetry.emit(VoiceEvent::VoiceStarted {
                    voice: index,
                    note,
                    channel,
                });
                Some(index)
            }
            None => {
                self.telemetry.emit(VoiceEvent::NoteDropped { note, channel });
                None
            }
        }
    }

    /// Release every voice sounding `note` on `channel`.
    pub fn handle_note_off(&mut self, note: u8, velocity: f32, channel: u8, allow_tail_off: bool) {
        for (index, voice) in self.voices.iter_mut().enumerate() {
            if voice.is_playing(note, channel) {
                voice.stop_note(velocity, allow_tail_off);
                if voice.is_idle() {
                    self.telemetry.emit(VoiceEvent::VoiceIdle { voice: index });
                }
            }
        }
    }

    pub fn all_notes_off(&mut self, allow_tail_off: bool) {
        for (index, voice) in self.voices.iter_mut().enumerate() {
            if voice.is_active() {
                voice.stop_note(0.0, allow_tail_off);
                if voice.is_idle() {
                    self.telemetry.emit(VoiceEvent::VoiceIdle { voice: index });
                }
            }
        }
    }

    /// Render `num_samples` frames into `output` starting at `start_sample`,
    /// applying `events` at their frame offsets.
    ///
    /// Events must be time ordered; offsets are relative to `start_sample`.
    /// Voices are rendered up to each event, the event is applied, and
    /// rendering continues, so note timing is sample accurate. An event whose
    /// offset lies past the block is applied after the last frame. The
    /// output is only ever added to.
    pub fn render_block(
        &mut self,
        output: &mut AudioBuffer,
        events: &[TimedEvent],
        start_sample: usize,
        num_samples: usize,
    ) {
        debug_assert!(self.prepared, "VoicePool rendered before prepare()");
        if !self.prepared {
            return;
        }
        debug_assert!(
            output.num_channels() <= self.mix.num_channels(),
            "output has {} channels, pool prepared for {}",
            output.num_channels(),
            self.mix.num_channels()
        );

        let end = start_sample
            .saturating_add(num_samples)
            .min(output.num_frames());
        let mut position = start_sample.min(end);

        for event in events {
            let at = start_sample
                .saturating_add(event.offset.min(num_samples))
                .clamp(position, end);
            if at > position {
                self.render_voices(output, position, at - position);
                position = at;
            }
            self.dispatch(event.message);
        }

        if end > position {
            self.render_voices(output, position, end - position);
        }
    }

    fn render_voices(&mut self, output: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        let mut done = 0;
        while done < num_samples {
            let chunk = (num_samples - done).min(self.mix.num_frames());
            if chunk == 0 {
                return;
            }

            self.mix.clear_range(0, chunk);
            for (index, voice) in self.voices.iter_mut().enumerate() {
                if voice.render_block(&mut self.mix, 0, chunk) {
                    self.telemetry.emit(VoiceEvent::VoiceIdle { voice: index });
                }
            }
            output.add_from(&self.mix, start_sample + done, chunk);
            done += chunk;
        }
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteTarget for VoicePool {
    fn note_on(&mut self, note: u8, velocity: f32, channel: u8) {
        self.handle_note_on(note, velocity, channel);
    }

    fn note_off(&mut self, note: u8, velocity: f32, channel: u8, allow_tail_off: bool) {
        self.handle_note_off(note, velocity, channel, allow_tail_off);
    }

    fn all_notes_off(&mut self, allow_tail_off: bool) {
        VoicePool::all_notes_off(self, allow_tail_off);
    }
}

impl Renderable for VoicePool {
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) {
        VoicePool::prepare(self, sample_rate, max_block_size, num_channels);
    }

    fn render(&mut self, output: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        self.render_block(output, &[], start_sample, num_samples);
    }
}
