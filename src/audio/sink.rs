//! Sinks that take scheduled events out of the engine: a console printer and
//! a channel for handing events to an external synth.

use colored::*;
use crossbeam_channel::Sender;
use motif_core::types::time::to_f64;
use motif_core::{EventKey, EventSink, PlayerId, ScheduledEvent, Value};
use std::collections::HashMap;
use std::io::{self, Stdout, Write};
use tracing::{debug, warn};

/// Prints one colored line per event
pub struct ConsoleSink<W: Write = Stdout> {
    out: W,
    names: HashMap<PlayerId, String>,
    failed: bool,
}

impl ConsoleSink<Stdout> {
    pub fn stdout() -> Self {
        ConsoleSink::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        ConsoleSink {
            out,
            names: HashMap::new(),
            failed: false,
        }
    }

    /// Label events of `player` with `name` instead of its id
    pub fn with_name(mut self, player: PlayerId, name: impl Into<String>) -> Self {
        self.names.insert(player, name.into());
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn format(&self, scheduled: &ScheduledEvent) -> String {
        let label = match self.names.get(&scheduled.player) {
            Some(name) => name.clone(),
            None => scheduled.player.to_string(),
        };
        let fields: Vec<String> = scheduled
            .event
            .iter()
            .map(|(key, value)| format_field(key, value))
            .collect();
        format!(
            "{} {} {}",
            format!("{:>8.3}", to_f64(scheduled.time)).dimmed(),
            format!("{:<10}", label).cyan().bold(),
            fields.join(" ")
        )
    }
}

fn format_field(key: &EventKey, value: &Value) -> String {
    let value = match key {
        EventKey::Degree | EventKey::Note => value.to_string().green().bold().to_string(),
        EventKey::Instrument => value.to_string().magenta().to_string(),
        _ => value.to_string(),
    };
    format!("{}={}", key.name().yellow(), value)
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn receive(&mut self, scheduled: ScheduledEvent) {
        let line = self.format(&scheduled);
        if let Err(e) = writeln!(self.out, "{}", line) {
            if !self.failed {
                warn!("console output failed: {}", e);
                self.failed = true;
            }
        }
    }
}

/// Forwards events to a channel, e.g. for a synth running on another thread
pub struct ChannelSink {
    tx: Sender<ScheduledEvent>,
    disconnected: bool,
}

impl ChannelSink {
    pub fn new(tx: Sender<ScheduledEvent>) -> Self {
        ChannelSink {
            tx,
            disconnected: false,
        }
    }
}

impl EventSink for ChannelSink {
    fn receive(&mut self, scheduled: ScheduledEvent) {
        if self.disconnected {
            return;
        }
        if self.tx.send(scheduled).is_err() {
            debug!("event receiver dropped, discarding further events");
            self.disconnected = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use motif_core::types::time::time;
    use motif_core::Event;

    fn scheduled(degree: i32) -> ScheduledEvent {
        ScheduledEvent::new(
            time(3, 2),
            PlayerId(2),
            Event::new().with("degree", degree).with("dur", 0.5),
        )
    }

    #[test]
    fn test_console_sink_writes_line_per_event() {
        colored::control::set_override(false);
        let mut sink = ConsoleSink::new(Vec::new()).with_name(PlayerId(2), "bass");
        sink.receive(scheduled(4));
        sink.receive(scheduled(5));
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("1.500"));
        assert!(lines[0].contains("bass"));
        assert!(lines[0].contains("degree=4"));
        assert!(lines[1].contains("dur=0.5"));
    }

    #[test]
    fn test_console_sink_defaults_to_player_id() {
        colored::control::set_override(false);
        let mut sink = ConsoleSink::new(Vec::new());
        sink.receive(scheduled(1));
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains("#2"));
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (tx, rx) = unbounded();
        let mut sink = ChannelSink::new(tx);
        sink.receive(scheduled(7));
        let received = rx.try_recv().unwrap();
        assert_eq!(received.player, PlayerId(2));
        assert_eq!(received.event.get(&EventKey::Degree), Some(&Value::Number(7.0)));
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (tx, rx) = unbounded();
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        sink.receive(scheduled(1));
        sink.receive(scheduled(2));
        assert!(sink.disconnected);
    }
}
