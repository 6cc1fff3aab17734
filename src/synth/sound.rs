/// Which notes and channels a sound answers to.
///
/// The pool consults every registered descriptor on note-on; the first one
/// that applies picks the voices that may play the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoundDescriptor {
    /// Every note on every channel.
    #[default]
    Universal,
    /// An inclusive key range, optionally restricted to one MIDI channel.
    Zone {
        low: u8,
        high: u8,
        channel: Option<u8>,
    },
}

impl SoundDescriptor {
    pub fn zone(low: u8, high: u8) -> Self {
        SoundDescriptor::Zone {
            low: low.min(high),
            high: low.max(high),
            channel: None,
        }
    }

    /// Restrict a zone to a single channel. A universal sound is returned as a
    /// full-range zone on that channel.
    pub fn on_channel(self, channel: u8) -> Self {
        match self {
            SoundDescriptor::Universal => SoundDescriptor::Zone {
                low: 0,
                high: 127,
                channel: Some(channel),
            },
            SoundDescriptor::Zone { low, high, .. } => SoundDescriptor::Zone {
                low,
                high,
                channel: Some(channel),
            },
        }
    }

    pub fn applies_to_note(&self, note: u8) -> bool {
        match *self {
            SoundDescriptor::Universal => true,
            SoundDescriptor::Zone { low, high, .. } => (low..=high).contains(&note),
        }
    }

    pub fn applies_to_channel(&self, channel: u8) -> bool {
        match *self {
            SoundDescriptor::Universal => true,
            SoundDescriptor::Zone { channel: wanted, .. } => wanted.map_or(true, |c| c == channel),
        }
    }

    pub fn applies_to(&self, note: u8, channel: u8) -> bool {
        self.applies_to_note(note) && self.applies_to_channel(channel)
    }
}
