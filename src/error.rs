use std::fmt;

/// Setup-time configuration failures.
///
/// These only come out of construction and `prepare`; the render path never
/// returns errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidSampleRate(f32),
    InvalidBlockSize(usize),
    BlockTooLarge { requested: usize, max: usize },
    NoChannels,
    NoVoices,
    ZeroCapacity(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSampleRate(rate) => {
                write!(f, "sample rate must be positive and finite, got {rate}")
            }
            ConfigError::InvalidBlockSize(size) => {
                write!(f, "block size must be at least 1 frame, got {size}")
            }
            ConfigError::BlockTooLarge { requested, max } => {
                write!(f, "block size {requested} exceeds the maximum of {max} frames")
            }
            ConfigError::NoChannels => f.write_str("at least one output channel is required"),
            ConfigError::NoVoices => f.write_str("at least one voice is required"),
            ConfigError::ZeroCapacity(queue) => write!(f, "{queue} queue capacity must be non-zero"),
        }
    }
}

impl std::error::Error for ConfigError {}
