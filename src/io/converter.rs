use crate::{io::midi::MidiEvent, synth::message::SynthMessage};

/// Translate a decoded MIDI message into a synth message.
///
/// `channel_filter` restricts the conversion to one channel; `None` accepts
/// all of them. Note-offs coming from MIDI always allow the release tail.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: Option<u8>) -> Option<SynthMessage> {
    let accepts = |channel: u8| channel_filter.map_or(true, |wanted| wanted == channel);

    match midi {
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } if accepts(channel) => Some(SynthMessage::NoteOn {
            note: key,
            velocity: velocity_to_unit(velocity),
            channel,
        }),
        MidiEvent::NoteOff {
            channel,
            key,
            velocity,
        } if accepts(channel) => Some(SynthMessage::NoteOff {
            note: key,
            velocity: velocity_to_unit(velocity),
            channel,
            allow_tail_off: true,
        }),
        // CC 123: all notes off
        MidiEvent::ControlChange {
            channel,
            controller: 123,
            ..
        } if accepts(channel) => Some(SynthMessage::AllNotesOff {
            allow_tail_off: true,
        }),
        _ => None,
    }
}

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

#[inline]
fn velocity_to_unit(velocity: u8) -> f32 {
    (velocity.min(127) as f32) / 127.0
}
