pub mod clock;
pub mod playback_engine;
pub mod sink;

pub use clock::TempoClock;
pub use playback_engine::{EngineConfig, PlaybackEngine};
pub use sink::{ChannelSink, ConsoleSink};
