//! Patterns and the streams they instantiate
//!
//! A [`Pattern`] is an immutable recipe; [`Pattern::as_stream`] turns it into
//! a [`Stream`], a lazy cursor that produces values or events until the
//! pattern is exhausted (or forever). Combinators build new patterns and never
//! modify their operands.

mod bind;
mod chain;
mod constraint;
mod core;
mod list;
mod numeric;
mod parallel;
mod stream;

#[cfg(test)]
mod tests;

// Re-export public types
pub use self::constraint::{Bound, BoundaryPolicy, ZERO_DURATION_LIMIT};
pub use self::core::{chain, Pattern, Repeats, DEFAULT_SEED};
pub use self::stream::Stream;
