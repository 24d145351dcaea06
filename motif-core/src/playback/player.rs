//! Player state machine and the handle that controls it.
//!
//! A player is split in two: the [`Player`] handle held by whoever spawned
//! it, and the [`Voice`] owned by a scheduler, which holds the stream and the
//! timeline position. The two share an atomic state word, so `play`, `pause`
//! and `stop` are safe from any thread and take effect at the scheduler's
//! next tick.

use crate::error::{PatternError, Result};
use crate::types::event::Event;
use crate::types::pattern::{Pattern, Stream};
use crate::types::time::Beats;
use num_traits::Zero;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Identifier of a player, increasing in creation order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a player
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PlayerState {
    /// Created, never started
    Idle = 0,
    Playing = 1,
    /// Cursor kept, no events fire
    Paused = 2,
    /// Terminal: stopped by the caller or aborted by an error
    Stopped = 3,
    /// Terminal: the stream ran out
    Finished = 4,
}

impl PlayerState {
    fn from_u8(raw: u8) -> PlayerState {
        match raw {
            0 => PlayerState::Idle,
            1 => PlayerState::Playing,
            2 => PlayerState::Paused,
            3 => PlayerState::Stopped,
            _ => PlayerState::Finished,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayerState::Stopped | PlayerState::Finished)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlayerState::Idle => "idle",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Stopped => "stopped",
            PlayerState::Finished => "finished",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State shared between a handle and its voice
pub(crate) struct PlayerControl {
    id: PlayerId,
    name: String,
    state: AtomicU8,
    error: Mutex<Option<PatternError>>,
}

impl PlayerControl {
    fn new(id: PlayerId, name: String) -> Self {
        PlayerControl {
            id,
            name,
            state: AtomicU8::new(PlayerState::Idle as u8),
            error: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> PlayerState {
        PlayerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(
        &self,
        operation: &'static str,
        allowed: impl Fn(PlayerState) -> bool,
        to: PlayerState,
    ) -> Result<()> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let state = PlayerState::from_u8(current);
            if !allowed(state) {
                return Err(PatternError::invalid_state(operation, state));
            }
            match self.state.compare_exchange_weak(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    fn stop(&self) -> PlayerState {
        PlayerState::from_u8(self.state.swap(PlayerState::Stopped as u8, Ordering::AcqRel))
    }

    /// Playing → Finished; false if the state moved on in the meantime
    fn finish(&self) -> bool {
        self.state
            .compare_exchange(
                PlayerState::Playing as u8,
                PlayerState::Finished as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn fail(&self, error: PatternError) {
        warn!("player {} '{}' aborted: {}", self.id, self.name, error);
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
        self.state.store(PlayerState::Stopped as u8, Ordering::Release);
    }

    fn error(&self) -> Option<PatternError> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Handle controlling one playing stream.
///
/// Streams only play through a handle; dropping the handle stops the player.
#[must_use = "a player is stopped as soon as its handle is dropped"]
pub struct Player {
    control: Arc<PlayerControl>,
}

impl Player {
    pub fn id(&self) -> PlayerId {
        self.control.id
    }

    pub fn name(&self) -> &str {
        &self.control.name
    }

    pub fn state(&self) -> PlayerState {
        self.control.state()
    }

    /// Start (Idle) or resume (Paused) the player
    pub fn play(&self) -> Result<()> {
        self.control.transition(
            "play",
            |s| matches!(s, PlayerState::Idle | PlayerState::Paused),
            PlayerState::Playing,
        )?;
        debug!("player {} '{}' playing", self.id(), self.name());
        Ok(())
    }

    /// Pause a playing player, keeping its stream position
    pub fn pause(&self) -> Result<()> {
        self.control.transition(
            "pause",
            |s| s == PlayerState::Playing,
            PlayerState::Paused,
        )?;
        debug!("player {} '{}' paused", self.id(), self.name());
        Ok(())
    }

    /// Stop the player for good. Idempotent; the stream is released at the next tick.
    pub fn stop(&self) {
        let previous = self.control.stop();
        if previous != PlayerState::Stopped {
            debug!("player {} '{}' stopped (was {})", self.id(), self.name(), previous);
        }
    }

    /// The error that aborted this player, if any
    pub fn error(&self) -> Option<PatternError> {
        self.control.error()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

/// Scheduler-side half of a player: the stream and its timeline position.
pub struct Voice {
    control: Arc<PlayerControl>,
    stream: Option<Stream>,
    /// `None` until the first tick after a start or resume
    next_due: Option<Beats>,
    zero_run: usize,
}

impl Voice {
    /// Create a player over a fresh stream of `pattern`
    pub fn new(id: PlayerId, name: impl Into<String>, pattern: &Pattern) -> (Player, Voice) {
        Voice::with_stream(id, name, pattern.as_stream())
    }

    /// Create a player over an already instantiated stream
    pub fn with_stream(id: PlayerId, name: impl Into<String>, stream: Stream) -> (Player, Voice) {
        let control = Arc::new(PlayerControl::new(id, name.into()));
        let player = Player {
            control: Arc::clone(&control),
        };
        let voice = Voice {
            control,
            stream: Some(stream),
            next_due: None,
            zero_run: 0,
        };
        (player, voice)
    }

    pub fn id(&self) -> PlayerId {
        self.control.id
    }

    pub fn name(&self) -> &str {
        &self.control.name
    }

    pub fn state(&self) -> PlayerState {
        self.control.state()
    }

    pub(crate) fn next_due(&self) -> Option<Beats> {
        self.next_due
    }

    /// Pending due time, anchoring a fresh start or resume at `anchor`
    pub(crate) fn due_at(&mut self, anchor: Beats) -> Beats {
        *self.next_due.get_or_insert(anchor)
    }

    /// Forget the timeline position so a resume fires at the next tick
    pub(crate) fn unanchor(&mut self) {
        self.next_due = None;
    }

    pub(crate) fn fail(&mut self, error: PatternError) {
        self.control.fail(error);
        self.stream = None;
    }

    /// Pull the event due at `due`. `None` if the stream ended or failed.
    pub(crate) fn pull_due(&mut self, due: Beats, zero_limit: usize) -> Option<Event> {
        let stream = self.stream.as_mut()?;
        let event = match stream.next_event() {
            Ok(Some(event)) => event,
            Ok(None) => {
                if self.control.finish() {
                    debug!("player {} '{}' finished", self.id(), self.name());
                    self.stream = None;
                }
                return None;
            }
            Err(e) => {
                self.fail(e);
                return None;
            }
        };
        let delta = match event.delta() {
            Ok(delta) => delta,
            Err(e) => {
                self.fail(e);
                return None;
            }
        };
        if delta.is_zero() {
            self.zero_run += 1;
            if self.zero_run > zero_limit {
                self.fail(PatternError::UnboundedComposition(format!(
                    "more than {} events at one instant",
                    zero_limit
                )));
                return None;
            }
        } else {
            self.zero_run = 0;
        }
        self.next_due = Some(due + delta);
        Some(event)
    }
}

impl fmt::Debug for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("next_due", &self.next_due)
            .finish()
    }
}
