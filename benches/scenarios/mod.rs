//! Real-world scenario benchmarks.
//!
//! Single voices, a full pool of held notes and the engine's block loop.

mod voices;

pub use voices::bench_voices;
