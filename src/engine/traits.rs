use crate::{io::AudioBuffer, synth::message::SynthMessage};

/// Something that renders audio additively into a host buffer.
pub trait Renderable {
    /// Size internal buffers. May allocate; never called from the callback.
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize);

    /// Add `num_samples` frames into `output` starting at `start_sample`.
    fn render(&mut self, output: &mut AudioBuffer, start_sample: usize, num_samples: usize);
}

/// Something that reacts to note traffic.
pub trait NoteTarget {
    fn note_on(&mut self, note: u8, velocity: f32, channel: u8);
    fn note_off(&mut self, note: u8, velocity: f32, channel: u8, allow_tail_off: bool);
    fn all_notes_off(&mut self, allow_tail_off: bool);

    fn dispatch(&mut self, message: SynthMessage) {
        match message {
            SynthMessage::NoteOn {
                note,
                velocity,
                channel,
            } => self.note_on(note, velocity, channel),
            SynthMessage::NoteOff {
                note,
                velocity,
                channel,
                allow_tail_off,
            } => self.note_off(note, velocity, channel, allow_tail_off),
            SynthMessage::AllNotesOff { allow_tail_off } => self.all_notes_off(allow_tail_off),
        }
    }
}
