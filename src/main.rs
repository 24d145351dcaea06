//! Motif - plays the tutorial arrangement to the console

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use motif::audio::{ConsoleSink, EngineConfig, PlaybackEngine};
use motif::demo::Section;
use motif::PlayerState;
use std::thread;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "motif")]
#[command(about = "Play pattern streams in real time")]
struct Args {
    /// Tempo in beats per minute
    #[arg(long, default_value_t = 120.0)]
    bpm: f64,

    /// Stop after this many beats, even if the section is still going
    #[arg(long, default_value_t = 16.0)]
    beats: f64,

    /// Which part of the tutorial to play
    #[arg(long, value_enum, default_value_t = Section::All)]
    section: Section,

    /// Log scheduler and engine activity
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt().with_max_level(level).init();

    check_positive("--bpm", args.bpm)?;
    check_positive("--beats", args.beats)?;

    let pattern = args
        .section
        .pattern()
        .with_context(|| format!("failed to build section '{}'", args.section))?;

    println!(
        "{} {} at {} bpm for up to {} beats",
        "Playing".green().bold(),
        args.section.to_string().cyan().bold(),
        args.bpm,
        args.beats
    );

    let config = EngineConfig::new().with_bpm(args.bpm);
    let engine = PlaybackEngine::new(config, ConsoleSink::stdout());
    let player = engine.spawn(args.section.name(), &pattern)?;
    player.play()?;
    info!("started {:?}", player);

    while engine.current_beat() < args.beats && player.state() == PlayerState::Playing {
        thread::sleep(Duration::from_millis(20));
    }

    let state = player.state();
    player.stop();
    let fired = engine.events_fired();
    engine.shutdown()?;

    if let Some(error) = player.error() {
        bail!("player aborted: {}", error);
    }
    println!(
        "{} after {} events ({})",
        "Done".green().bold(),
        fired,
        state
    );
    Ok(())
}

fn check_positive(flag: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        bail!("{} must be a positive number, got {}", flag, value);
    }
    Ok(())
}
