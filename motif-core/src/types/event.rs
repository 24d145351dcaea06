//! Event records: ordered key/value mappings consumed by sinks.
//!
//! Well-known keys are a closed enum so timing and merge code never compares
//! strings; anything else lands in [`EventKey::Custom`].

use super::time::{from_f64, Beats};
use super::value::Value;
use crate::error::Result;
use num_traits::Zero;
use std::fmt;

/// Fallback `dur` used for pacing when an event carries none.
pub const DEFAULT_DUR: f64 = 1.0;

/// Key of an event entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKey {
    /// Sounding duration in beats
    Dur,
    /// Time until the next event, overrides `dur × stretch` for pacing
    Delta,
    /// Multiplier applied to `dur` for pacing
    Stretch,
    Legato,
    Amp,
    /// Scale degree
    Degree,
    Note,
    Octave,
    Instrument,
    Pan,
    /// Index of the parallel operand that produced the event
    Voice,
    Custom(String),
}

impl EventKey {
    /// Parse a key from its symbolic name
    pub fn from_name(name: &str) -> EventKey {
        match name {
            "dur" => EventKey::Dur,
            "delta" => EventKey::Delta,
            "stretch" => EventKey::Stretch,
            "legato" => EventKey::Legato,
            "amp" => EventKey::Amp,
            "degree" => EventKey::Degree,
            "note" => EventKey::Note,
            "octave" => EventKey::Octave,
            "instrument" => EventKey::Instrument,
            "pan" => EventKey::Pan,
            "voice" => EventKey::Voice,
            other => EventKey::Custom(other.to_string()),
        }
    }

    /// Symbolic name of the key
    pub fn name(&self) -> &str {
        match self {
            EventKey::Dur => "dur",
            EventKey::Delta => "delta",
            EventKey::Stretch => "stretch",
            EventKey::Legato => "legato",
            EventKey::Amp => "amp",
            EventKey::Degree => "degree",
            EventKey::Note => "note",
            EventKey::Octave => "octave",
            EventKey::Instrument => "instrument",
            EventKey::Pan => "pan",
            EventKey::Voice => "voice",
            EventKey::Custom(name) => name,
        }
    }
}

impl From<&str> for EventKey {
    fn from(name: &str) -> Self {
        EventKey::from_name(name)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered mapping from keys to values. Keys are unique.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    entries: Vec<(EventKey, Value)>,
}

impl Event {
    pub fn new() -> Self {
        Event {
            entries: Vec::new(),
        }
    }

    /// Builder form of [`Event::set`]
    pub fn with(mut self, key: impl Into<EventKey>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a key, replacing an existing value in place or appending a new entry
    pub fn set(&mut self, key: impl Into<EventKey>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &EventKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &EventKey) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&EventKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Merge `self` over `base`: every key of `base` is kept unless `self` sets it too.
    pub fn merged_over(&self, base: &Event) -> Event {
        let mut merged = base.clone();
        for (key, value) in &self.entries {
            merged.set(key.clone(), value.clone());
        }
        merged
    }

    fn number_or(&self, key: &EventKey, default: f64) -> Result<f64> {
        match self.get(key) {
            Some(value) => value.as_f64(),
            None => Ok(default),
        }
    }

    /// Sounding duration, falling back to [`DEFAULT_DUR`]
    pub fn dur(&self) -> Result<f64> {
        self.number_or(&EventKey::Dur, DEFAULT_DUR)
    }

    /// Logical time until the next event: `delta` if present, else `dur × stretch`.
    pub fn delta(&self) -> Result<Beats> {
        if let Some(delta) = self.get(&EventKey::Delta) {
            return from_f64(delta.as_f64()?);
        }
        let stretch = self.number_or(&EventKey::Stretch, 1.0)?;
        from_f64(self.dur()? * stretch)
    }

    /// Overwrite the pacing delta, leaving `dur` untouched
    pub fn set_delta(&mut self, delta: Beats) {
        self.set(EventKey::Delta, super::time::to_f64(delta));
    }

    /// Shorten the event so its delta equals `span`.
    ///
    /// `dur` is scaled back through `stretch`; an explicit `delta` is rewritten too.
    pub fn truncate_to(&mut self, span: Beats) -> Result<()> {
        let span_f = super::time::to_f64(span);
        let stretch = self.number_or(&EventKey::Stretch, 1.0)?;
        if self.contains(&EventKey::Delta) || stretch.is_zero() {
            self.set(EventKey::Delta, span_f);
            if stretch.is_zero() {
                return Ok(());
            }
        }
        self.set(EventKey::Dur, span_f / stretch);
        Ok(())
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, ")")
    }
}
