//! # Motif
//!
//! Real-time playback for `motif-core` patterns.
//!
//! `motif-core` describes music as lazy pattern streams and plays them on a
//! scheduler that only knows beats. This crate runs that scheduler against the
//! wall clock and delivers the events somewhere useful.
//!
//! ## Modules
//!
//! - `audio`: the tempo clock, the playback engine thread and event sinks
//!   (console output, channel hand-off to an external synth).
//! - `demo`: a tutorial arrangement, section by section, used by the `motif`
//!   binary.

pub mod audio;
pub mod demo;

// Re-export commonly used types for convenience
pub use crate::audio::{ChannelSink, ConsoleSink, EngineConfig, PlaybackEngine, TempoClock};
pub use motif_core::{chain, Bound, Event, EventKey, Pattern, Player, PlayerState, Repeats, Value};
