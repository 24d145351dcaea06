// motif-core/src/types/mod.rs

pub mod event;
pub mod pattern;
pub mod scheduled_event;
pub mod time;
pub mod value;

pub use event::{Event, EventKey, DEFAULT_DUR};
pub use pattern::{chain, Bound, BoundaryPolicy, Pattern, Repeats, Stream};
pub use scheduled_event::ScheduledEvent;
pub use time::Beats;
pub use value::Value;
