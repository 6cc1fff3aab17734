#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, synth::params::ParamSnapshot, MAX_BLOCK_SIZE};

/// Everything needed to build an [`Engine`](crate::Engine).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub max_block_size: usize,
    pub channels: usize,
    pub voices: usize,
    /// Pending note messages the control side may queue between blocks.
    pub note_queue_capacity: usize,
    /// Pending parameter snapshots.
    pub param_queue_capacity: usize,
    /// Telemetry events buffered for the control side.
    pub telemetry_capacity: usize,
    /// Events the per-block timeline can hold (queued notes plus host events).
    pub events_per_block: usize,
    pub params: ParamSnapshot,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_block_size: 512,
            channels: 2,
            voices: 8,
            note_queue_capacity: 256,
            param_queue_capacity: 16,
            telemetry_capacity: 256,
            events_per_block: 256,
            params: ParamSnapshot::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_voices(mut self, voices: usize) -> Self {
        self.voices = voices;
        self
    }

    pub fn with_params(mut self, params: ParamSnapshot) -> Self {
        self.params = params;
        self
    }

    pub fn with_events_per_block(mut self, events: usize) -> Self {
        self.events_per_block = events;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_stream(self.sample_rate, self.max_block_size, self.channels)?;
        if self.voices == 0 {
            return Err(ConfigError::NoVoices);
        }
        for (queue, capacity) in [
            ("note", self.note_queue_capacity),
            ("parameter", self.param_queue_capacity),
            ("telemetry", self.telemetry_capacity),
            ("event", self.events_per_block),
        ] {
            if capacity == 0 {
                return Err(ConfigError::ZeroCapacity(queue));
            }
        }
        Ok(())
    }
}

/// Check a sample rate / block size / channel count triple.
pub(crate) fn validate_stream(
    sample_rate: f32,
    max_block_size: usize,
    channels: usize,
) -> Result<(), ConfigError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(ConfigError::InvalidSampleRate(sample_rate));
    }
    if max_block_size == 0 {
        return Err(ConfigError::InvalidBlockSize(max_block_size));
    }
    if max_block_size > MAX_BLOCK_SIZE {
        return Err(ConfigError::BlockTooLarge {
            requested: max_block_size,
            max: MAX_BLOCK_SIZE,
        });
    }
    if channels == 0 {
        return Err(ConfigError::NoChannels);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_stream_settings() {
        let config = EngineConfig::default();
        assert!(matches!(
            config.clone().with_sample_rate(0.0).validate(),
            Err(ConfigError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            config.clone().with_sample_rate(f32::NAN).validate(),
            Err(ConfigError::InvalidSampleRate(_))
        ));
        assert_eq!(
            config.clone().with_max_block_size(0).validate(),
            Err(ConfigError::InvalidBlockSize(0))
        );
        assert_eq!(
            config.clone().with_max_block_size(MAX_BLOCK_SIZE + 1).validate(),
            Err(ConfigError::BlockTooLarge {
                requested: MAX_BLOCK_SIZE + 1,
                max: MAX_BLOCK_SIZE
            })
        );
        assert_eq!(config.clone().with_channels(0).validate(), Err(ConfigError::NoChannels));
        assert_eq!(config.with_voices(0).validate(), Err(ConfigError::NoVoices));
    }

    #[test]
    fn rejects_zero_queues() {
        let config = EngineConfig {
            param_queue_capacity: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity("parameter")));
    }

    #[test]
    fn errors_read_well() {
        let message = ConfigError::BlockTooLarge {
            requested: 9000,
            max: 8192,
        }
        .to_string();
        assert!(message.contains("9000"));
        assert!(message.contains("8192"));
    }
}
