use rtrb::{Consumer, Producer};

/// Note traffic from the control side to the render thread.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn {
        note: u8,
        velocity: f32,
        channel: u8,
    },
    NoteOff {
        note: u8,
        velocity: f32,
        channel: u8,
        allow_tail_off: bool,
    },
    AllNotesOff {
        allow_tail_off: bool,
    },
}

/// Render-side source of queued note messages.
pub trait MessageReceiver {
    fn receive(&mut self) -> Option<SynthMessage>;
}

impl MessageReceiver for Consumer<SynthMessage> {
    #[inline]
    fn receive(&mut self) -> Option<SynthMessage> {
        self.pop().ok()
    }
}

/// Out-of-band notifications emitted by the render thread.
///
/// These are pushed without blocking; when the ring is full the event is lost,
/// never the audio block.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    /// A note-on found no idle voice and was dropped.
    NoteDropped { note: u8, channel: u8 },
    /// A voice started sounding a note.
    VoiceStarted { voice: usize, note: u8, channel: u8 },
    /// A voice finished its release (or was cut) and is idle again.
    VoiceIdle { voice: usize },
    /// More events arrived in one block than the scheduler can hold.
    EventsOverflowed { dropped: usize },
}

pub trait EventSink {
    fn emit(&mut self, event: VoiceEvent);
}

impl EventSink for Producer<VoiceEvent> {
    #[inline]
    fn emit(&mut self, event: VoiceEvent) {
        let _ = self.push(event);
    }
}

impl EventSink for Option<Producer<VoiceEvent>> {
    #[inline]
    fn emit(&mut self, event: VoiceEvent) {
        if let Some(producer) = self {
            producer.emit(event);
        }
    }
}
