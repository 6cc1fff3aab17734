// Purpose: Voice management, polyphony, parameter and note handoff
// This layer sits above the DSP primitives and drives a pool of voices

pub mod message;
pub mod params;
pub mod poly;
pub mod sound;
pub mod voice;

pub use message::{SynthMessage, VoiceEvent};
pub use params::{param_channel, ParamHandle, ParamId, ParamReceiver, ParamSnapshot};
pub use poly::VoicePool;
pub use sound::SoundDescriptor;
pub use voice::{Voice, VoiceState, VOICE_GAIN};
