//! # Motif Core
//!
//! Lazy pattern streams for algorithmic composition, without any audio or
//! real-time dependencies.
//!
//! Patterns are immutable recipes (sequences, random choices, numeric
//! generators, event templates) that combine into larger patterns. Each call
//! to [`Pattern::as_stream`] yields an independent cursor. Event streams are
//! played by [`Player`]s on a [`Scheduler`], which advances in beats and hands
//! every due event to an [`EventSink`].
//!
//! ## Features
//!
//! - **serde**: Serialize values, events and player identifiers
//!
//! ## Example
//!
//! ```
//! use motif_core::{Pattern, Scheduler};
//! use motif_core::types::time::beats;
//!
//! let melody = Pattern::bind(vec![
//!     ("degree", Pattern::seq(vec![0.into(), 2.into(), 4.into()], 1)),
//!     ("dur", Pattern::value(0.5)),
//! ]);
//!
//! let mut scheduler = Scheduler::new();
//! let player = scheduler.spawn("melody", &melody);
//! player.play()?;
//!
//! let mut fired = Vec::new();
//! scheduler.advance(beats(2), &mut fired);
//! assert_eq!(fired.len(), 3);
//! # Ok::<(), motif_core::PatternError>(())
//! ```

pub mod error;
pub mod playback;
pub mod types;

// Re-export commonly used types
pub use error::{PatternError, Result};
pub use playback::{EventSink, Player, PlayerId, PlayerState, Scheduler};
pub use types::{chain, Bound, Event, EventKey, Pattern, Repeats, ScheduledEvent, Stream, Value};
