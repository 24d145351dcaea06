//! Constraints: force termination of a possibly infinite stream.

use super::stream::{Stream, StreamSource};
use crate::error::{PatternError, Result};
use crate::types::event::EventKey;
use crate::types::time::{from_f64, to_f64, zero, Beats};
use crate::types::value::Value;
use num_traits::Zero;
use std::fmt;

/// Consecutive zero-length events a duration bound tolerates.
///
/// Past this the total can never reach the ceiling and the stream is failed
/// rather than left to spin.
pub const ZERO_DURATION_LIMIT: usize = 1024;

/// What happens to the event that would cross a duration ceiling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// Shorten the crossing event so the total lands exactly on the ceiling
    #[default]
    Truncate,
    /// Drop the crossing event and end
    Exclude,
}

/// Termination bound wrapped around a pattern
#[derive(Clone, Debug, PartialEq)]
pub enum Bound {
    /// Stop once the summed event deltas reach `beats`
    Duration {
        beats: Beats,
        policy: BoundaryPolicy,
    },
    /// Stop after the first event whose `key` reaches `target`
    Value { key: EventKey, target: Value },
    /// Stop after `n` values
    Count(usize),
}

impl Bound {
    /// Duration ceiling in beats, truncating the crossing event
    pub fn duration(beats: f64) -> Result<Bound> {
        let beats = from_f64(beats).map_err(|_| {
            PatternError::InvalidArgument(format!(
                "duration bound {} must be finite and non-negative",
                beats
            ))
        })?;
        Ok(Bound::Duration {
            beats,
            policy: BoundaryPolicy::Truncate,
        })
    }

    /// Switch a duration bound to dropping the crossing event
    pub fn exclude(self) -> Bound {
        self.with_policy(BoundaryPolicy::Exclude)
    }

    pub fn with_policy(self, policy: BoundaryPolicy) -> Bound {
        match self {
            Bound::Duration { beats, .. } => Bound::Duration { beats, policy },
            other => other,
        }
    }

    /// Stop once `key` reaches `target` (numbers: `>=`, otherwise equality)
    pub fn until(key: impl Into<EventKey>, target: impl Into<Value>) -> Bound {
        Bound::Value {
            key: key.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Duration { beats, policy } => match policy {
                BoundaryPolicy::Truncate => write!(f, "Pfindur[{}]", to_f64(*beats)),
                BoundaryPolicy::Exclude => write!(f, "Pfindur[{}, exclude]", to_f64(*beats)),
            },
            Bound::Value { key, target } => write!(f, "Puntil[{} >= {}]", key, target),
            Bound::Count(n) => write!(f, "Pfin[{}]", n),
        }
    }
}

pub(crate) struct ConstrainStream {
    inner: Stream,
    bound: Bound,
    emitted: usize,
    elapsed: Beats,
    zero_run: usize,
    done: bool,
}

impl ConstrainStream {
    pub(crate) fn new(inner: Stream, bound: Bound) -> Self {
        ConstrainStream {
            inner,
            bound,
            emitted: 0,
            elapsed: zero(),
            zero_run: 0,
            done: false,
        }
    }

    fn pull_count(&mut self, n: usize) -> Result<Option<Value>> {
        if self.emitted >= n {
            return Ok(None);
        }
        let value = self.inner.pull()?;
        if value.is_some() {
            self.emitted += 1;
        }
        Ok(value)
    }

    fn pull_until(&mut self, key: &EventKey, target: &Value) -> Result<Option<Value>> {
        let Some(value) = self.inner.pull()? else {
            return Ok(None);
        };
        let reached = value
            .as_event()?
            .get(key)
            .is_some_and(|v| v.reaches(target));
        if reached {
            self.done = true;
        }
        Ok(Some(value))
    }

    fn pull_duration(&mut self, ceiling: Beats, policy: BoundaryPolicy) -> Result<Option<Value>> {
        if self.elapsed >= ceiling {
            return Ok(None);
        }
        let Some(mut event) = self.inner.next_event()? else {
            return Ok(None);
        };
        let delta = event.delta()?;
        if delta.is_zero() {
            self.zero_run += 1;
            if self.zero_run > ZERO_DURATION_LIMIT {
                return Err(PatternError::UnboundedComposition(format!(
                    "more than {} consecutive zero-length events under a duration bound",
                    ZERO_DURATION_LIMIT
                )));
            }
        } else {
            self.zero_run = 0;
        }

        let remaining = ceiling - self.elapsed;
        if delta <= remaining {
            self.elapsed += delta;
            return Ok(Some(event.into()));
        }
        self.elapsed = ceiling;
        match policy {
            BoundaryPolicy::Truncate => {
                event.truncate_to(remaining)?;
                Ok(Some(event.into()))
            }
            BoundaryPolicy::Exclude => Ok(None),
        }
    }
}

impl StreamSource for ConstrainStream {
    fn pull(&mut self) -> Result<Option<Value>> {
        if self.done {
            return Ok(None);
        }
        // The bound is cloned out so the pull helpers can borrow `self` mutably.
        match self.bound.clone() {
            Bound::Count(n) => self.pull_count(n),
            Bound::Value { key, target } => self.pull_until(&key, &target),
            Bound::Duration { beats, policy } => self.pull_duration(beats, policy),
        }
    }
}
