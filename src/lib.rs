pub mod analysis; // Signal measurements (RMS, pitch estimation)
pub mod config;
pub mod dsp;
pub mod engine; // Block processor, scheduling and control handles
pub mod error;
pub mod io;
pub mod synth; // Voices, voice pool, parameters and messages

pub use config::EngineConfig;
pub use engine::{Engine, EngineHandle};
pub use error::ConfigError;

/// Upper bound for any prepared block size. Hosts asking for larger blocks
/// must split them.
pub const MAX_BLOCK_SIZE: usize = 8192;
