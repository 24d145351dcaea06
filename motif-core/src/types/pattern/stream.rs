//! Streams: stateful cursors instantiated from patterns.

use crate::error::Result;
use crate::types::event::Event;
use crate::types::value::Value;
use std::fmt;
use std::iter::FusedIterator;

/// Producer behind a [`Stream`]. `Ok(None)` means exhausted.
///
/// Sources never see a call after they returned `Ok(None)` or an error; the
/// wrapping [`Stream`] latches the terminal state.
pub(crate) trait StreamSource: Send {
    fn pull(&mut self) -> Result<Option<Value>>;
}

/// A single-owner, resumable cursor over a pattern.
///
/// Iterating yields `Ok(value)` items and ends with `None` once the pattern is
/// exhausted. A malformed value is yielded as one `Err` item, after which the
/// stream is exhausted as well. Calling `next()` again after the end keeps
/// returning `None`.
pub struct Stream {
    source: Box<dyn StreamSource>,
    exhausted: bool,
}

impl Stream {
    pub(crate) fn new(source: impl StreamSource + 'static) -> Self {
        Stream {
            source: Box::new(source),
            exhausted: false,
        }
    }

    /// A stream that is already exhausted
    pub fn empty() -> Self {
        Stream::new(Empty)
    }

    /// Pull the next value, `Ok(None)` at exhaustion
    pub fn pull(&mut self) -> Result<Option<Value>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.source.pull() {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => {
                self.exhausted = true;
                Ok(None)
            }
            Err(e) => {
                self.exhausted = true;
                Err(e)
            }
        }
    }

    /// Pull the next value as an event; a scalar is a value error.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        match self.pull()? {
            Some(value) => match value.into_event() {
                Ok(event) => Ok(Some(event)),
                Err(e) => {
                    self.exhausted = true;
                    Err(e)
                }
            },
            None => Ok(None),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Iterator for Stream {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pull().transpose()
    }
}

impl FusedIterator for Stream {}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

struct Empty;

impl StreamSource for Empty {
    fn pull(&mut self) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// A literal value: forever when played on its own, once when embedded in a list.
pub(crate) struct ConstStream {
    value: Option<Value>,
    repeat: bool,
}

impl ConstStream {
    pub(crate) fn new(value: Value, once: bool) -> Self {
        ConstStream {
            value: Some(value),
            repeat: !once,
        }
    }
}

impl StreamSource for ConstStream {
    fn pull(&mut self) -> Result<Option<Value>> {
        if self.repeat {
            Ok(self.value.clone())
        } else {
            Ok(self.value.take())
        }
    }
}
