//! Players and the scheduler that drives them.
//!
//! Everything here runs in logical time (beats). Mapping beats to wall-clock
//! time is left to a driver such as the playback engine in the `motif` crate.

pub mod player;
pub mod scheduler;
pub mod sink;

pub use player::{Player, PlayerId, PlayerState, Voice};
pub use scheduler::{Scheduler, MAX_EVENTS_PER_INSTANT};
pub use sink::{EventSink, FnSink};
