use crate::synth::message::SynthMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Decode a raw channel-voice message.
    ///
    /// Channels are reported 1-based (1..=16). A note-on with velocity 0 is a
    /// note-off, as the MIDI running-status convention requires. Pitch bend is
    /// centred on zero (-8192..=8191).
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = (status & 0x0F) + 1;
        let data1 = data.first().copied().unwrap_or(0) & 0x7F;
        let data2 = data.get(1).copied().unwrap_or(0) & 0x7F;

        match status & 0xF0 {
            0x80 if data.len() >= 2 => Some(MidiEvent::NoteOff {
                channel,
                key: data1,
                velocity: data2,
            }),
            0x90 if data.len() >= 2 => {
                if data2 == 0 {
                    Some(MidiEvent::NoteOff {
                        channel,
                        key: data1,
                        velocity: 0,
                    })
                } else {
                    Some(MidiEvent::NoteOn {
                        channel,
                        key: data1,
                        velocity: data2,
                    })
                }
            }
            0xB0 if data.len() >= 2 => Some(MidiEvent::ControlChange {
                channel,
                controller: data1,
                value: data2,
            }),
            0xC0 if !data.is_empty() => Some(MidiEvent::ProgramChange {
                channel,
                program: data1,
            }),
            0xE0 if data.len() >= 2 => {
                let raw = ((data2 as i16) << 7) | data1 as i16;
                Some(MidiEvent::PitchBend {
                    channel,
                    value: raw - 8192,
                })
            }
            _ => None,
        }
    }
}

/// A synth message scheduled at a frame offset inside one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    /// Frame offset relative to the start of the block being rendered.
    pub offset: usize,
    pub message: SynthMessage,
}

impl TimedEvent {
    pub fn new(offset: usize, message: SynthMessage) -> Self {
        Self { offset, message }
    }
}
