// Purpose - external interfaces: host audio buffers, MIDI events, conversions

pub mod converter;
pub mod midi;

pub use converter::{midi_note_to_freq, midi_to_synth};
pub use midi::{MidiEvent, TimedEvent};

/// Planar multichannel sample buffer.
///
/// Every channel has the same number of frames. The buffer is sized once
/// (at construction or through [`AudioBuffer::resize`]) and the render path
/// only ever works inside that capacity.
#[derive(Debug, Default, Clone)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    frames: usize,
}

impl AudioBuffer {
    pub fn new(num_channels: usize, num_frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; num_frames]; num_channels],
            frames: num_frames,
        }
    }

    /// Reallocate to a new shape. Not realtime-safe.
    pub fn resize(&mut self, num_channels: usize, num_frames: usize) {
        self.channels.resize_with(num_channels, Vec::new);
        for channel in &mut self.channels {
            channel.clear();
            channel.resize(num_frames, 0.0);
        }
        self.frames = num_frames;
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_frames(&self) -> usize {
        self.frames
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }

    /// Zero every sample.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Zero `len` frames starting at `start` (clamped to the buffer).
    pub fn clear_range(&mut self, start: usize, len: usize) {
        let start = start.min(self.frames);
        let end = start.saturating_add(len).min(self.frames);
        for channel in &mut self.channels {
            channel[start..end].fill(0.0);
        }
    }

    /// Add the first `len` frames of `source` into this buffer at `dest_start`.
    ///
    /// Only channels present in both buffers are touched. The range is
    /// clamped to both buffers, so a short source or destination never panics.
    pub fn add_from(&mut self, source: &AudioBuffer, dest_start: usize, len: usize) {
        let dest_start = dest_start.min(self.frames);
        let len = len
            .min(source.frames)
            .min(self.frames - dest_start);

        for (dest, src) in self.channels.iter_mut().zip(source.channels.iter()) {
            for (d, s) in dest[dest_start..dest_start + len].iter_mut().zip(&src[..len]) {
                *d += s;
            }
        }
    }

    /// Copy the first `len` frames of channel 0 into every other channel.
    pub fn mirror_first_channel(&mut self, len: usize) {
        let len = len.min(self.frames);
        if let Some((first, rest)) = self.channels.split_first_mut() {
            for channel in rest {
                channel[..len].copy_from_slice(&first[..len]);
            }
        }
    }

    /// Write `frames` frames into an interleaved slice (`frame * channels + ch`).
    ///
    /// Used to hand blocks to cpal callbacks and WAV writers.
    pub fn write_interleaved(&self, out: &mut [f32], frames: usize) {
        let num_channels = self.channels.len();
        if num_channels == 0 {
            return;
        }
        let frames = frames.min(self.frames).min(out.len() / num_channels);
        for (ch, channel) in self.channels.iter().enumerate() {
            for (i, &sample) in channel[..frames].iter().enumerate() {
                out[i * num_channels + ch] = sample;
            }
        }
    }
}
