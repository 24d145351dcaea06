//! Rational beat time for drift-free scheduling
//!
//! Event durations arrive as floats (`dur: 0.25`), but running totals are kept
//! as exact rationals so long sequences, duration bounds and interleaved
//! players never accumulate rounding error.

use crate::error::{PatternError, Result};
use num_rational::Ratio;
use num_traits::{ToPrimitive, Zero};

/// Exact time point or span in beats
pub type Beats = Ratio<i64>;

/// Denominator used when converting float durations (LCM of common divisions: 24, 32, 48, ...)
pub const BEAT_DENOMINATOR: i64 = 9600;

/// Helper to create Beats from a ratio n/d
#[inline]
pub fn time(n: i64, d: i64) -> Beats {
    Ratio::new(n, d)
}

/// Create Beats from an integer (whole beats)
#[inline]
pub fn beats(n: i64) -> Beats {
    Ratio::from_integer(n)
}

/// Zero beats
#[inline]
pub fn zero() -> Beats {
    Beats::zero()
}

/// Convert rational to f64 for sinks and display
#[inline]
pub fn to_f64(t: Beats) -> f64 {
    t.to_f64().unwrap_or(0.0)
}

/// Convert a float duration to Beats, rejecting values that cannot be timing.
pub fn from_f64(f: f64) -> Result<Beats> {
    if !f.is_finite() {
        return Err(PatternError::value(format!("duration {} is not finite", f)));
    }
    if f < 0.0 {
        return Err(PatternError::value(format!("duration {} is negative", f)));
    }
    let scaled = (f * BEAT_DENOMINATOR as f64).round();
    if scaled > i64::MAX as f64 {
        return Err(PatternError::value(format!("duration {} is too large", f)));
    }
    Ok(Ratio::new(scaled as i64, BEAT_DENOMINATOR))
}
