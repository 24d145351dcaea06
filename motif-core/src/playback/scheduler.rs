//! Logical-time scheduler shared by any number of players.
//!
//! The scheduler does not sleep or spawn threads: a driver calls
//! [`Scheduler::advance`] with the current beat and every due event fires in
//! timeline order. Players interleave by due time, ties going to the older
//! player.

use super::player::{Player, PlayerId, PlayerState, Voice};
use super::sink::EventSink;
use crate::types::pattern::Pattern;
use crate::types::scheduled_event::ScheduledEvent;
use crate::types::time::{zero, Beats};
use tracing::debug;

/// Consecutive events a single player may emit at one instant before it is aborted.
pub const MAX_EVENTS_PER_INSTANT: usize = 4096;

/// Drives the voices of many players against one timeline
#[derive(Debug)]
pub struct Scheduler {
    voices: Vec<Voice>,
    next_id: u64,
    now: Beats,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            voices: Vec::new(),
            next_id: 0,
            now: zero(),
        }
    }

    /// Create an idle player over a fresh stream of `pattern`.
    ///
    /// Nothing fires until [`Player::play`] is called.
    pub fn spawn(&mut self, name: impl Into<String>, pattern: &Pattern) -> Player {
        let id = self.allocate_id();
        let (player, voice) = Voice::new(id, name, pattern);
        self.insert(voice);
        player
    }

    /// Like [`Scheduler::spawn`] with an explicit random seed
    pub fn spawn_seeded(&mut self, name: impl Into<String>, pattern: &Pattern, seed: u64) -> Player {
        let id = self.allocate_id();
        let (player, voice) = Voice::with_stream(id, name, pattern.as_stream_seeded(seed));
        self.insert(voice);
        player
    }

    pub fn allocate_id(&mut self) -> PlayerId {
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Adopt a voice created elsewhere (e.g. on another thread)
    pub fn insert(&mut self, voice: Voice) {
        debug!("scheduling player {} '{}'", voice.id(), voice.name());
        self.next_id = self.next_id.max(voice.id().0 + 1);
        self.voices.push(voice);
    }

    /// Fire every event due at or before `now`. Returns the number fired.
    pub fn advance<S: EventSink + ?Sized>(&mut self, now: Beats, sink: &mut S) -> usize {
        // Players started or resumed since the last tick begin where that tick left off
        let anchor = self.now.min(now);
        let mut fired = 0;
        loop {
            self.reap();

            let mut next: Option<(Beats, PlayerId, usize)> = None;
            for (index, voice) in self.voices.iter_mut().enumerate() {
                if voice.state() != PlayerState::Playing {
                    continue;
                }
                let due = voice.due_at(anchor);
                if due > now {
                    continue;
                }
                let candidate = (due, voice.id(), index);
                if next.map_or(true, |(d, id, _)| (due, voice.id()) < (d, id)) {
                    next = Some(candidate);
                }
            }

            let Some((due, id, index)) = next else {
                break;
            };
            if let Some(event) = self.voices[index].pull_due(due, MAX_EVENTS_PER_INSTANT) {
                sink.receive(ScheduledEvent::new(due, id, event));
                fired += 1;
            }
        }
        if now > self.now {
            self.now = now;
        }
        fired
    }

    /// Earliest pending due time among playing voices
    pub fn next_due(&self) -> Option<Beats> {
        self.voices
            .iter()
            .filter(|v| v.state() == PlayerState::Playing)
            .filter_map(|v| v.next_due())
            .min()
    }

    /// Latest time passed to [`Scheduler::advance`]
    pub fn now(&self) -> Beats {
        self.now
    }

    /// Number of voices still held (terminal ones are dropped at the next advance)
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Drop finished and stopped voices; paused voices lose their anchor.
    fn reap(&mut self) {
        self.voices.retain_mut(|voice| match voice.state() {
            PlayerState::Stopped | PlayerState::Finished => {
                debug!("releasing player {} '{}' ({})", voice.id(), voice.name(), voice.state());
                false
            }
            PlayerState::Paused => {
                voice.unanchor();
                true
            }
            PlayerState::Idle | PlayerState::Playing => true,
        });
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}
