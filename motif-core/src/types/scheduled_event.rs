//! Events stamped with the logical time at which a player emitted them.

use super::event::Event;
use super::time::Beats;
use crate::playback::PlayerId;

/// An event scheduled for a specific logical time (in beats)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduledEvent {
    /// When the sink should render the event (beats from scheduler origin)
    pub time: Beats,
    /// Player that produced the event
    pub player: PlayerId,
    pub event: Event,
}

impl ScheduledEvent {
    pub fn new(time: Beats, player: PlayerId, event: Event) -> Self {
        Self {
            time,
            player,
            event,
        }
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse order for min-heap behavior (earliest first, then oldest player)
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.player.cmp(&self.player))
    }
}

impl Eq for ScheduledEvent {}
