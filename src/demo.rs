//! Tutorial arrangement
//!
//! A walk through the pattern library, one section per idea: plain
//! sequences, random durations, chained overrides, random walks, weighted
//! choices, sequenced sections and parallel layers.

use clap::ValueEnum;
use motif_core::{chain, Bound, Pattern, Repeats, Result};
use std::fmt;

/// Length each section gets when the whole tutorial is played
pub const SECTION_BEATS: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Section {
    /// A scale with randomly chosen durations
    Melody,
    /// A base pattern with overriding keys chained in front
    Chain,
    /// A bounded random walk over scale degrees
    Walk,
    /// Weighted choice between drum sounds
    Drums,
    /// Verse and chorus played one after the other
    Song,
    /// Bass and lead interleaved in time
    Layers,
    /// Every section in turn
    All,
}

impl Section {
    pub const EACH: [Section; 6] = [
        Section::Melody,
        Section::Chain,
        Section::Walk,
        Section::Drums,
        Section::Song,
        Section::Layers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Section::Melody => "melody",
            Section::Chain => "chain",
            Section::Walk => "walk",
            Section::Drums => "drums",
            Section::Song => "song",
            Section::Layers => "layers",
            Section::All => "all",
        }
    }

    /// Build the pattern for this section
    pub fn pattern(&self) -> Result<Pattern> {
        match self {
            Section::Melody => melody(),
            Section::Chain => Ok(chained()),
            Section::Walk => walk(),
            Section::Drums => drums(),
            Section::Song => song(),
            Section::Layers => layers(),
            Section::All => {
                let parts = Section::EACH
                    .iter()
                    .map(|s| s.pattern()?.fin_dur(SECTION_BEATS))
                    .collect::<Result<Vec<_>>>()?;
                Pattern::sequencer(parts)
            }
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn degrees(values: &[i32]) -> Vec<Pattern> {
    values.iter().map(|d| Pattern::from(*d)).collect()
}

fn melody() -> Result<Pattern> {
    Ok(Pattern::bind(vec![
        ("degree", Pattern::seq(degrees(&[0, 1, 2, 3, 4, 5, 6, 7]), Repeats::Inf)),
        (
            "dur",
            Pattern::rand(vec![Pattern::from(0.25), Pattern::from(0.5)], Repeats::Inf),
        ),
        ("amp", Pattern::white(0.1, 0.3, Repeats::Inf)?),
        ("instrument", Pattern::value("pluck")),
    ]))
}

fn chained() -> Pattern {
    let base = Pattern::bind(vec![
        ("degree", Pattern::seq(degrees(&[0, 2, 4, 7]), Repeats::Inf)),
        ("dur", Pattern::value(0.5)),
        ("amp", Pattern::value(0.2)),
        ("instrument", Pattern::value("pluck")),
    ]);
    let accents = Pattern::bind(vec![(
        "amp",
        Pattern::seq(vec![Pattern::from(0.4), Pattern::from(0.1)], Repeats::Inf),
    )]);
    let octave_up = Pattern::bind(vec![("octave", Pattern::value(6))]);
    chain(vec![octave_up, accents, base])
}

fn walk() -> Result<Pattern> {
    Ok(Pattern::bind(vec![
        ("degree", Pattern::brown(-7.0, 7.0, 2.0, Repeats::Inf)?),
        ("dur", Pattern::value(0.25)),
        ("legato", Pattern::white(0.2, 1.0, Repeats::Inf)?),
        ("instrument", Pattern::value("sine")),
    ]))
}

fn drums() -> Result<Pattern> {
    let sounds = vec!["kick".into(), "snare".into(), "hat".into()];
    Ok(Pattern::bind(vec![
        ("instrument", Pattern::wrand(sounds, vec![0.3, 0.2, 0.5], Repeats::Inf)?),
        ("dur", Pattern::value(0.25)),
        ("amp", Pattern::geom(0.5, 0.95, Repeats::Inf)),
    ]))
}

fn song() -> Result<Pattern> {
    let verse = Pattern::bind(vec![
        ("degree", Pattern::seq(degrees(&[0, 2, 4, 2]), 2)),
        ("dur", Pattern::value(0.5)),
    ]);
    let chorus = Pattern::bind(vec![
        ("degree", Pattern::shuffle(degrees(&[4, 5, 7, 9]), Repeats::Inf)),
        ("dur", Pattern::value(0.25)),
    ])
    .bound(Bound::until("degree", 9));
    let outro = Pattern::bind(vec![
        ("degree", Pattern::series(7.0, -1.0, Repeats::Inf)),
        ("dur", Pattern::value(1.0)),
    ])
    .fin_dur(4.0)?;
    Pattern::sequencer(vec![verse, chorus, outro])
}

fn layers() -> Result<Pattern> {
    let bass = Pattern::bind(vec![
        ("degree", Pattern::seq(degrees(&[0, -3, -2, -4]), Repeats::Inf)),
        ("octave", Pattern::value(3)),
        ("dur", Pattern::value(2.0)),
    ]);
    let lead = Pattern::bind(vec![
        ("degree", Pattern::rand(degrees(&[0, 2, 4, 5, 7]), Repeats::Inf)),
        ("dur", Pattern::seq(vec![Pattern::from(0.5), Pattern::from(0.25), Pattern::from(0.25)], Repeats::Inf)),
    ]);
    Ok(Pattern::parallel(vec![bass, lead]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use motif_core::types::time::to_f64;
    use motif_core::EventKey;

    fn take_events(pattern: &Pattern, n: usize) -> Vec<motif_core::Event> {
        let mut stream = pattern.as_stream();
        (0..n).map_while(|_| stream.next_event().unwrap()).collect()
    }

    #[test]
    fn test_every_section_builds_and_plays() {
        for section in Section::EACH {
            let pattern = section.pattern().unwrap();
            assert_eq!(take_events(&pattern, 12).len(), 12, "section {}", section);
        }
    }

    #[test]
    fn test_all_is_bounded() {
        let all = Section::All.pattern().unwrap();
        assert!(all.is_bounded());
        let events = take_events(&all, 10_000);
        assert!(events.len() < 10_000);
        let total: f64 = events.iter().map(|e| to_f64(e.delta().unwrap())).sum();
        assert!(total <= SECTION_BEATS * Section::EACH.len() as f64 + 1e-9);
    }

    #[test]
    fn test_walk_stays_in_range() {
        let pattern = walk().unwrap();
        for event in take_events(&pattern, 500) {
            let degree = event.get(&EventKey::Degree).unwrap().as_f64().unwrap();
            assert!((-7.0..=7.0).contains(&degree));
        }
    }

    #[test]
    fn test_chain_overrides() {
        let events = take_events(&chained(), 4);
        let amps: Vec<f64> = events
            .iter()
            .map(|e| e.get(&EventKey::Amp).unwrap().as_f64().unwrap())
            .collect();
        assert_eq!(amps, vec![0.4, 0.1, 0.4, 0.1]);
        assert!(events.iter().all(|e| e.get(&EventKey::Octave).is_some()));
    }

    #[test]
    fn test_song_ends() {
        let song = song().unwrap();
        assert!(song.is_bounded());
        let events = take_events(&song, 1000);
        assert!(events.len() < 1000);
        let last = events.last().unwrap();
        assert_eq!(last.get(&EventKey::Degree).unwrap().as_f64().unwrap(), 4.0);
    }
}
