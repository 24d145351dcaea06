//! Real-time playback engine
//!
//! A dedicated thread owns a [`Scheduler`] and an [`EventSink`]. It wakes every
//! `tick_interval`, reads the beat position from the shared [`TempoClock`] and
//! fires every event due up to that beat (plus the configured lookahead).
//! Players are spawned on the caller's thread and shipped to the engine over a
//! command channel, so the returned [`Player`] handle is usable immediately.

use crate::audio::clock::{TempoClock, DEFAULT_BPM};
use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use motif_core::playback::{EventSink, Player, PlayerId, Scheduler, Voice};
use motif_core::types::time::from_f64;
use motif_core::Pattern;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often the engine thread wakes up by default
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(5);

/// Configuration for the playback engine
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Initial tempo
    pub bpm: f64,
    /// Sleep between scheduler ticks
    pub tick_interval: Duration,
    /// Beats fired ahead of the clock, for sinks with their own latency
    pub lookahead: f64,
}

impl EngineConfig {
    /// Create a new engine config with default values
    pub fn new() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            tick_interval: DEFAULT_TICK_INTERVAL,
            lookahead: 0.0,
        }
    }

    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the lookahead in beats (negative values are treated as zero)
    pub fn with_lookahead(mut self, beats: f64) -> Self {
        self.lookahead = beats.max(0.0);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::new()
    }
}

/// Commands that can be sent to the engine thread
enum EngineCommand {
    /// Start scheduling a freshly spawned player
    Insert(Voice),
    SetBpm(f64),
    Shutdown,
}

/// Drives players in real time on a background thread
pub struct PlaybackEngine {
    command_tx: Sender<EngineCommand>,
    clock: Arc<TempoClock>,
    next_id: AtomicU64,
    fired: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackEngine {
    /// Start the engine thread; events go to `sink`
    pub fn new<S>(config: EngineConfig, sink: S) -> Self
    where
        S: EventSink + Send + 'static,
    {
        let clock = Arc::new(TempoClock::new(config.bpm));
        let fired = Arc::new(AtomicU64::new(0));
        let (command_tx, command_rx) = bounded(64);

        let mut engine_loop = EngineLoop {
            scheduler: Scheduler::new(),
            clock: Arc::clone(&clock),
            sink: Box::new(sink),
            command_rx,
            tick_interval: config.tick_interval,
            lookahead: config.lookahead,
            fired: Arc::clone(&fired),
        };
        clock.start();
        let thread = thread::spawn(move || engine_loop.run());
        info!("playback engine started at {} bpm", clock.bpm());

        PlaybackEngine {
            command_tx,
            clock,
            next_id: AtomicU64::new(0),
            fired,
            thread: Some(thread),
        }
    }

    /// Create an idle player for `pattern`. Call [`Player::play`] to hear it.
    pub fn spawn(&self, name: impl Into<String>, pattern: &Pattern) -> Result<Player> {
        let id = PlayerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (player, voice) = Voice::new(id, name, pattern);
        self.command_tx
            .send(EngineCommand::Insert(voice))
            .map_err(|_| anyhow!("playback engine is not running"))?;
        Ok(player)
    }

    /// Set the tempo in BPM
    pub fn set_bpm(&self, bpm: f64) -> Result<()> {
        self.command_tx
            .send(EngineCommand::SetBpm(bpm))
            .map_err(|_| anyhow!("playback engine is not running"))
    }

    pub fn bpm(&self) -> f64 {
        self.clock.bpm()
    }

    pub fn current_beat(&self) -> f64 {
        self.clock.current_beat()
    }

    /// Total number of events handed to the sink so far
    pub fn events_fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Stop the engine thread and wait for it to exit
    pub fn shutdown(mut self) -> Result<()> {
        self.stop_thread()
    }

    fn stop_thread(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        let _ = self.command_tx.send(EngineCommand::Shutdown);
        thread
            .join()
            .map_err(|_| anyhow!("playback thread panicked"))
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if let Err(e) = self.stop_thread() {
            warn!("{}", e);
        }
    }
}

/// Internal loop that runs in the engine thread
struct EngineLoop {
    scheduler: Scheduler,
    clock: Arc<TempoClock>,
    sink: Box<dyn EventSink + Send>,
    command_rx: Receiver<EngineCommand>,
    tick_interval: Duration,
    lookahead: f64,
    fired: Arc<AtomicU64>,
}

enum LoopAction {
    Continue,
    Shutdown,
}

impl EngineLoop {
    fn run(&mut self) {
        loop {
            let action = match self.command_rx.recv_timeout(self.tick_interval) {
                Ok(cmd) => self.handle_command(cmd),
                Err(RecvTimeoutError::Timeout) => LoopAction::Continue,
                Err(RecvTimeoutError::Disconnected) => LoopAction::Shutdown,
            };
            if let LoopAction::Shutdown = action {
                break;
            }
            // Drain whatever else arrived so a burst of spawns lands in one tick
            while let Ok(cmd) = self.command_rx.try_recv() {
                if let LoopAction::Shutdown = self.handle_command(cmd) {
                    return self.finish();
                }
            }
            self.tick();
        }
        self.finish();
    }

    fn handle_command(&mut self, cmd: EngineCommand) -> LoopAction {
        match cmd {
            EngineCommand::Insert(voice) => {
                self.scheduler.insert(voice);
            }
            EngineCommand::SetBpm(bpm) => {
                self.clock.set_bpm(bpm);
                info!("tempo changed to {} bpm", self.clock.bpm());
            }
            EngineCommand::Shutdown => return LoopAction::Shutdown,
        }
        LoopAction::Continue
    }

    fn tick(&mut self) {
        let beat = self.clock.current_beat() + self.lookahead;
        let now = match from_f64(beat) {
            Ok(now) => now,
            Err(e) => {
                warn!("skipping tick at beat {}: {}", beat, e);
                return;
            }
        };
        let fired = self.scheduler.advance(now, &mut self.sink);
        if fired > 0 {
            self.fired.fetch_add(fired as u64, Ordering::Relaxed);
        }
    }

    fn finish(&mut self) {
        debug!(
            "playback engine stopping with {} player(s) scheduled",
            self.scheduler.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use motif_core::types::time::to_f64;
    use motif_core::{PlayerState, ScheduledEvent};

    struct Forward(Sender<ScheduledEvent>);

    impl EventSink for Forward {
        fn receive(&mut self, scheduled: ScheduledEvent) {
            let _ = self.0.send(scheduled);
        }
    }

    fn fast_engine() -> (PlaybackEngine, Receiver<ScheduledEvent>) {
        let (tx, rx) = unbounded();
        let config = EngineConfig::new()
            .with_bpm(1200.0)
            .with_tick_interval(Duration::from_millis(1));
        (PlaybackEngine::new(config, Forward(tx)), rx)
    }

    fn pulse(count: usize) -> Pattern {
        Pattern::bind(vec![("dur", Pattern::value(1.0))]).fin(count)
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .with_bpm(90.0)
            .with_tick_interval(Duration::from_millis(2))
            .with_lookahead(-1.0);
        assert_eq!(config.bpm, 90.0);
        assert_eq!(config.tick_interval, Duration::from_millis(2));
        assert_eq!(config.lookahead, 0.0);
    }

    #[test]
    fn test_plays_pattern_in_real_time() {
        let (engine, rx) = fast_engine();
        let player = engine.spawn("pulse", &pulse(4)).unwrap();
        player.play().unwrap();

        // 1200 bpm = 50ms per beat
        let events: Vec<ScheduledEvent> = (0..4)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        let gaps: Vec<f64> = events
            .windows(2)
            .map(|w| to_f64(w[1].time - w[0].time))
            .collect();
        assert_eq!(gaps, vec![1.0, 1.0, 1.0]);

        thread::sleep(Duration::from_millis(150));
        assert_eq!(player.state(), PlayerState::Finished);
        assert_eq!(engine.events_fired(), 4);
    }

    #[test]
    fn test_idle_player_is_silent() {
        let (engine, rx) = fast_engine();
        let _player = engine.spawn("idle", &pulse(4)).unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_stop_silences_player() {
        let (engine, rx) = fast_engine();
        let player = engine
            .spawn("loop", &Pattern::bind(vec![("dur", Pattern::value(1.0))]))
            .unwrap();
        player.play().unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        player.stop();
        // Drain anything already in flight, then expect silence
        thread::sleep(Duration::from_millis(20));
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_set_bpm() {
        let (engine, _rx) = fast_engine();
        engine.set_bpm(90.0).unwrap();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(engine.bpm(), 90.0);
    }

    #[test]
    fn test_commands_fail_once_thread_stopped() {
        let (mut engine, _rx) = fast_engine();
        engine.stop_thread().unwrap();
        let err = engine.spawn("late", &pulse(1)).unwrap_err();
        assert_eq!(err.to_string(), "playback engine is not running");
        assert!(engine.set_bpm(100.0).is_err());
    }

    #[test]
    fn test_shutdown_joins_thread() {
        let (engine, _rx) = fast_engine();
        let _player = engine.spawn("idle", &pulse(1)).unwrap();
        engine.shutdown().unwrap();
    }
}
