//! Values produced by streams.

use super::event::Event;
use crate::error::{PatternError, Result};
use std::fmt;

/// A single value produced by a stream: a scalar or a whole event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Number(f64),
    Bool(bool),
    /// Symbolic value such as an instrument name or `rest`
    Symbol(String),
    Event(Box<Event>),
}

impl Value {
    /// Create a symbol value
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Symbol(_) => "symbol",
            Value::Event(_) => "event",
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(PatternError::value(format!(
                "expected a number, got {} {}",
                other.kind(),
                other
            ))),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(PatternError::value(format!(
                "expected a bool, got {} {}",
                other.kind(),
                other
            ))),
        }
    }

    pub fn as_symbol(&self) -> Result<&str> {
        match self {
            Value::Symbol(s) => Ok(s),
            other => Err(PatternError::value(format!(
                "expected a symbol, got {} {}",
                other.kind(),
                other
            ))),
        }
    }

    pub fn as_event(&self) -> Result<&Event> {
        match self {
            Value::Event(e) => Ok(e),
            other => Err(PatternError::value(format!(
                "expected an event, got {} {}",
                other.kind(),
                other
            ))),
        }
    }

    /// Unwrap into an owned event, or fail with a value error
    pub fn into_event(self) -> Result<Event> {
        match self {
            Value::Event(e) => Ok(*e),
            other => Err(PatternError::value(format!(
                "expected an event, got {} {}",
                other.kind(),
                other
            ))),
        }
    }

    /// Whether this value has reached `target`.
    ///
    /// Numbers compare with `>=`, every other variant by equality.
    pub fn reaches(&self, target: &Value) -> bool {
        match (self, target) {
            (Value::Number(a), Value::Number(b)) => a >= b,
            (a, b) => a == b,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Symbol(s.to_string())
    }
}

impl From<Event> for Value {
    fn from(e: Event) -> Self {
        Value::Event(Box::new(e))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Symbol(s) => write!(f, "\\{}", s),
            Value::Event(e) => write!(f, "{}", e),
        }
    }
}
