//! Tempo clock: maps wall-clock time onto beats
//!
//! The clock is shared between the playback thread and the caller. The tempo
//! lives in an atomic so it can be read without locking; changing it rebases
//! the clock so the beat position stays continuous across the change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Tempo used when none is configured
pub const DEFAULT_BPM: f64 = 120.0;

/// Point on the timeline the current tempo is measured from
#[derive(Clone, Copy, Debug)]
struct Anchor {
    instant: Option<Instant>,
    beat: f64,
}

#[derive(Debug)]
pub struct TempoClock {
    /// BPM stored as bits for atomic operations
    bpm: AtomicU64,
    anchor: Mutex<Anchor>,
}

impl TempoClock {
    /// Create a stopped clock at beat 0
    pub fn new(bpm: f64) -> Self {
        TempoClock {
            bpm: AtomicU64::new(sanitize(bpm).to_bits()),
            anchor: Mutex::new(Anchor {
                instant: None,
                beat: 0.0,
            }),
        }
    }

    /// Start counting beats from now. Has no effect on a running clock.
    pub fn start(&self) {
        let mut anchor = self.lock();
        if anchor.instant.is_none() {
            anchor.instant = Some(Instant::now());
        }
    }

    /// Back to beat 0, counting from now
    pub fn reset(&self) {
        let mut anchor = self.lock();
        anchor.instant = Some(Instant::now());
        anchor.beat = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.lock().instant.is_some()
    }

    pub fn bpm(&self) -> f64 {
        f64::from_bits(self.bpm.load(Ordering::Relaxed))
    }

    /// Change the tempo without jumping in beat position
    pub fn set_bpm(&self, bpm: f64) {
        let bpm = sanitize(bpm);
        let mut anchor = self.lock();
        if let Some(instant) = anchor.instant {
            let now = Instant::now();
            anchor.beat += beats_between(instant, now, self.bpm());
            anchor.instant = Some(now);
        }
        self.bpm.store(bpm.to_bits(), Ordering::Relaxed);
        debug!("tempo set to {} bpm at beat {:.3}", bpm, anchor.beat);
    }

    /// Fractional beats since the clock started
    pub fn current_beat(&self) -> f64 {
        let anchor = self.lock();
        match anchor.instant {
            Some(instant) => anchor.beat + beats_between(instant, Instant::now(), self.bpm()),
            None => anchor.beat,
        }
    }

    /// Wall-clock length of `beats` at the current tempo
    pub fn beats_to_duration(&self, beats: f64) -> Duration {
        Duration::from_secs_f64((beats.max(0.0) * 60.0) / self.bpm())
    }

    /// Get duration of a single beat in milliseconds at current BPM
    pub fn beat_duration_ms(&self) -> u64 {
        self.beats_to_duration(1.0).as_millis() as u64
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Anchor> {
        self.anchor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TempoClock {
    fn default() -> Self {
        TempoClock::new(DEFAULT_BPM)
    }
}

fn beats_between(from: Instant, to: Instant, bpm: f64) -> f64 {
    to.saturating_duration_since(from).as_secs_f64() * bpm / 60.0
}

/// Non-positive or non-finite tempos fall back to the default
fn sanitize(bpm: f64) -> f64 {
    if bpm.is_finite() && bpm > 0.0 {
        bpm
    } else {
        DEFAULT_BPM
    }
}
