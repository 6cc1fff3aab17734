//! Block processor and its control-side handle.
//!
//! [`Engine`] lives on the audio thread and owns everything the render path
//! touches. [`EngineHandle`] lives on the control thread. The two only talk
//! through `rtrb` rings: note messages and parameter snapshots go in,
//! telemetry comes out.

pub mod scheduler;
pub mod traits;

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, info, warn};

use self::{
    scheduler::Scheduler,
    traits::{NoteTarget, Renderable},
};
use crate::{
    config::{validate_stream, EngineConfig},
    error::ConfigError,
    io::{AudioBuffer, TimedEvent},
    synth::{
        message::{MessageReceiver, SynthMessage, VoiceEvent},
        params::{param_channel, ParamHandle, ParamReceiver},
        poly::VoicePool,
    },
};

pub struct Engine {
    pool: VoicePool,
    notes: Consumer<SynthMessage>,
    params: ParamReceiver,
    scheduler: Scheduler,

    sample_rate: f32,
    max_block_size: usize,
    num_channels: usize,
}

impl Engine {
    /// Build an engine and its handle. The engine comes back prepared for the
    /// config's stream settings.
    pub fn new(config: EngineConfig) -> Result<(Engine, EngineHandle), ConfigError> {
        config.validate()?;

        let (note_tx, note_rx) = RingBuffer::<SynthMessage>::new(config.note_queue_capacity);
        let (telemetry_tx, telemetry_rx) = RingBuffer::<VoiceEvent>::new(config.telemetry_capacity);
        let (param_handle, mut param_rx) = param_channel(config.param_queue_capacity, config.params);

        let mut pool = VoicePool::with_voices(config.voices);
        pool.set_telemetry(telemetry_tx);
        pool.prepare(config.sample_rate, config.max_block_size, config.channels);
        pool.apply_params(param_rx.latest());

        info!(
            voices = config.voices,
            sample_rate = config.sample_rate,
            max_block_size = config.max_block_size,
            channels = config.channels,
            "engine created"
        );

        let engine = Engine {
            pool,
            notes: note_rx,
            params: param_rx,
            scheduler: Scheduler::new(config.events_per_block),
            sample_rate: config.sample_rate,
            max_block_size: config.max_block_size,
            num_channels: config.channels,
        };
        let handle = EngineHandle {
            notes: note_tx,
            params: param_handle,
            telemetry: telemetry_rx,
        };
        Ok((engine, handle))
    }

    /// Re-prepare for new stream settings. Allocates; call it while the
    /// stream is stopped.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        max_block_size: usize,
        num_channels: usize,
    ) -> Result<(), ConfigError> {
        validate_stream(sample_rate, max_block_size, num_channels)?;

        self.pool.prepare(sample_rate, max_block_size, num_channels);
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.num_channels = num_channels;

        info!(sample_rate, max_block_size, num_channels, "engine prepared");
        Ok(())
    }

    /// Render one host block.
    ///
    /// `output` is cleared and then filled with the mix of every voice. Host
    /// events carry frame offsets into this block; queued messages from the
    /// handle are applied at offset 0. Parameters are read once, before the
    /// first frame.
    pub fn process_block(&mut self, output: &mut AudioBuffer, host_events: &[TimedEvent]) {
        output.clear();
        let frames = output.num_frames();
        self.render_into(output, host_events, 0, frames);
    }

    /// Like [`Engine::process_block`] but additive and over a sub-range.
    pub fn render_into(
        &mut self,
        output: &mut AudioBuffer,
        host_events: &[TimedEvent],
        start_sample: usize,
        num_samples: usize,
    ) {
        let params = *self.params.latest();
        self.pool.apply_params(&params);

        self.schedule(host_events);
        self.pool
            .render_block(output, self.scheduler.events(), start_sample, num_samples);
    }

    fn schedule(&mut self, host_events: &[TimedEvent]) {
        self.scheduler.clear();

        let mut dropped = 0;
        for event in host_events {
            if !self.scheduler.enqueue(*event) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            self.pool.report(VoiceEvent::EventsOverflowed { dropped });
        }

        // Queued messages that do not fit wait in the ring for the next block
        while self.scheduler.len() < self.scheduler.capacity() {
            let Some(message) = self.notes.receive() else {
                break;
            };
            self.scheduler.enqueue(TimedEvent::new(0, message));
        }
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn active_voice_count(&self) -> usize {
        self.pool.active_voice_count()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }
}

impl Renderable for Engine {
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) {
        if let Err(err) = Engine::prepare(self, sample_rate, max_block_size, num_channels) {
            warn!(%err, "ignoring invalid prepare");
        }
    }

    fn render(&mut self, output: &mut AudioBuffer, start_sample: usize, num_samples: usize) {
        self.render_into(output, &[], start_sample, num_samples);
    }
}

/// Notes delivered this way bypass the queue and act immediately.
impl NoteTarget for Engine {
    fn note_on(&mut self, note: u8, velocity: f32, channel: u8) {
        self.pool.handle_note_on(note, velocity, channel);
    }

    fn note_off(&mut self, note: u8, velocity: f32, channel: u8, allow_tail_off: bool) {
        self.pool
            .handle_note_off(note, velocity, channel, allow_tail_off);
    }

    fn all_notes_off(&mut self, allow_tail_off: bool) {
        self.pool.all_notes_off(allow_tail_off);
    }
}

/// Control-side end of an [`Engine`].
pub struct EngineHandle {
    notes: Producer<SynthMessage>,
    params: ParamHandle,
    telemetry: Consumer<VoiceEvent>,
}

impl EngineHandle {
    /// Queue a message for the next block. Returns false if the queue is full.
    pub fn send(&mut self, message: SynthMessage) -> bool {
        self.notes.push(message).is_ok()
    }

    pub fn note_on(&mut self, note: u8, velocity: f32, channel: u8) -> bool {
        self.send(SynthMessage::NoteOn {
            note,
            velocity,
            channel,
        })
    }

    pub fn note_off(&mut self, note: u8, velocity: f32, channel: u8, allow_tail_off: bool) -> bool {
        self.send(SynthMessage::NoteOff {
            note,
            velocity,
            channel,
            allow_tail_off,
        })
    }

    pub fn all_notes_off(&mut self, allow_tail_off: bool) -> bool {
        self.send(SynthMessage::AllNotesOff { allow_tail_off })
    }

    /// Parameter editing and publishing.
    pub fn params(&mut self) -> &mut ParamHandle {
        &mut self.params
    }

    /// Drain telemetry, logging anything that indicates lost input.
    pub fn poll_telemetry(&mut self) -> Vec<VoiceEvent> {
        let mut events = Vec::with_capacity(self.telemetry.slots());
        while let Ok(event) = self.telemetry.pop() {
            match event {
                VoiceEvent::NoteDropped { note, channel } => {
                    warn!(note, channel, "no free voice, note dropped");
                }
                VoiceEvent::EventsOverflowed { dropped } => {
                    warn!(dropped, "block event timeline full, events dropped");
                }
                VoiceEvent::VoiceStarted {
                    voice,
                    note,
                    channel,
                } => debug!(voice, note, channel, "voice started"),
                VoiceEvent::VoiceIdle { voice } => debug!(voice, "voice idle"),
            }
            events.push(event);
        }
        events
    }
}
