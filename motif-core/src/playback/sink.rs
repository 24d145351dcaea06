//! Event sinks: the opaque consumers of scheduled events.

use crate::types::scheduled_event::ScheduledEvent;

/// Receives every event a scheduler fires, stamped with its logical time.
///
/// Sinks only need `dur` and friends for their own rendering; the scheduler
/// has already used them for pacing.
pub trait EventSink {
    fn receive(&mut self, scheduled: ScheduledEvent);
}

/// Collects events, mostly useful in tests and offline rendering
impl EventSink for Vec<ScheduledEvent> {
    fn receive(&mut self, scheduled: ScheduledEvent) {
        self.push(scheduled);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn receive(&mut self, scheduled: ScheduledEvent) {
        (**self).receive(scheduled);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn receive(&mut self, scheduled: ScheduledEvent) {
        (**self).receive(scheduled);
    }
}

/// Adapts a closure into a sink
pub struct FnSink<F>(pub F);

impl<F: FnMut(ScheduledEvent)> EventSink for FnSink<F> {
    fn receive(&mut self, scheduled: ScheduledEvent) {
        (self.0)(scheduled);
    }
}
