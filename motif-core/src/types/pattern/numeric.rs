//! Numeric value generators.

use super::core::Repeats;
use super::stream::StreamSource;
use crate::error::Result;
use crate::types::value::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Counts emitted values against a length
struct Length {
    limit: Repeats,
    emitted: usize,
}

impl Length {
    fn new(limit: Repeats) -> Self {
        Length { limit, emitted: 0 }
    }

    /// Claim the next slot, false once the length is used up
    fn claim(&mut self) -> bool {
        if !self.limit.allows(self.emitted) {
            return false;
        }
        self.emitted += 1;
        true
    }
}

/// Reflect `x` back into `[lo, hi]`
fn fold(x: f64, lo: f64, hi: f64) -> f64 {
    let range = hi - lo;
    if range <= 0.0 {
        return lo;
    }
    let period = 2.0 * range;
    let mut offset = (x - lo) % period;
    if offset < 0.0 {
        offset += period;
    }
    if offset > range {
        offset = period - offset;
    }
    (lo + offset).clamp(lo, hi)
}

pub(crate) struct WhiteStream {
    lo: f64,
    hi: f64,
    length: Length,
    rng: StdRng,
}

impl WhiteStream {
    pub(crate) fn new(lo: f64, hi: f64, length: Repeats, seed: u64) -> Self {
        WhiteStream {
            lo,
            hi,
            length: Length::new(length),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl StreamSource for WhiteStream {
    fn pull(&mut self) -> Result<Option<Value>> {
        if !self.length.claim() {
            return Ok(None);
        }
        Ok(Some(Value::Number(self.rng.gen_range(self.lo..=self.hi))))
    }
}

pub(crate) struct BrownStream {
    lo: f64,
    hi: f64,
    step: f64,
    current: f64,
    length: Length,
    rng: StdRng,
}

impl BrownStream {
    pub(crate) fn new(lo: f64, hi: f64, step: f64, length: Repeats, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let current = rng.gen_range(lo..=hi);
        BrownStream {
            lo,
            hi,
            step,
            current,
            length: Length::new(length),
            rng,
        }
    }
}

impl StreamSource for BrownStream {
    fn pull(&mut self) -> Result<Option<Value>> {
        if !self.length.claim() {
            return Ok(None);
        }
        let delta = if self.step > 0.0 {
            self.rng.gen_range(-self.step..=self.step)
        } else {
            0.0
        };
        self.current = fold(self.current + delta, self.lo, self.hi);
        Ok(Some(Value::Number(self.current)))
    }
}

pub(crate) struct SeriesStream {
    next: f64,
    step: f64,
    length: Length,
}

impl SeriesStream {
    pub(crate) fn new(start: f64, step: f64, length: Repeats) -> Self {
        SeriesStream {
            next: start,
            step,
            length: Length::new(length),
        }
    }
}

impl StreamSource for SeriesStream {
    fn pull(&mut self) -> Result<Option<Value>> {
        if !self.length.claim() {
            return Ok(None);
        }
        let value = self.next;
        self.next += self.step;
        Ok(Some(Value::Number(value)))
    }
}

pub(crate) struct GeomStream {
    next: f64,
    grow: f64,
    length: Length,
}

impl GeomStream {
    pub(crate) fn new(start: f64, grow: f64, length: Repeats) -> Self {
        GeomStream {
            next: start,
            grow,
            length: Length::new(length),
        }
    }
}

impl StreamSource for GeomStream {
    fn pull(&mut self) -> Result<Option<Value>> {
        if !self.length.claim() {
            return Ok(None);
        }
        let value = self.next;
        self.next *= self.grow;
        Ok(Some(Value::Number(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::pattern::Stream;

    fn take(source: impl StreamSource + 'static, n: usize) -> Vec<f64> {
        Stream::new(source)
            .take(n)
            .map(|v| v.unwrap().as_f64().unwrap())
            .collect()
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold(5.5, 0.0, 5.0), 4.5);
        assert_eq!(fold(-0.5, 0.0, 5.0), 0.5);
        assert_eq!(fold(2.0, 3.0, 3.0), 3.0);
        assert_eq!(fold(3.0, 0.0, 5.0), 3.0);
    }

    #[test]
    fn test_brown_stays_in_bounds() {
        let values = take(BrownStream::new(-2.0, 2.0, 1.5, Repeats::Inf, 42), 2000);
        assert_eq!(values.len(), 2000);
        assert!(values.iter().all(|v| (-2.0..=2.0).contains(v)));
    }

    #[test]
    fn test_brown_moves_at_most_step() {
        let values = take(BrownStream::new(0.0, 100.0, 1.0, Repeats::Inf, 9), 500);
        assert!(values.windows(2).all(|w| (w[1] - w[0]).abs() <= 1.0 + 1e-9));
    }

    #[test]
    fn test_white_length_and_bounds() {
        let values = take(WhiteStream::new(0.1, 0.3, Repeats::Times(50), 1), 100);
        assert_eq!(values.len(), 50);
        assert!(values.iter().all(|v| (0.1..=0.3).contains(v)));
    }

    #[test]
    fn test_series_and_geom() {
        assert_eq!(take(SeriesStream::new(0.0, 2.0, Repeats::Times(4)), 10), vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(take(GeomStream::new(1.0, 2.0, Repeats::Inf), 4), vec![1.0, 2.0, 4.0, 8.0]);
    }
}
