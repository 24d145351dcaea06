//! Parallel: interleaves event streams by logical time without merging them.

use super::core::Pattern;
use super::stream::{Stream, StreamSource};
use crate::error::Result;
use crate::types::event::{Event, EventKey};
use crate::types::time::{zero, Beats};
use crate::types::value::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Next event of one operand, waiting for its due time
struct Pending {
    time: Beats,
    voice: usize,
    event: Event,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.voice == other.voice
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earliest time first, lower operand index on ties
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.voice.cmp(&self.voice))
    }
}

pub(crate) struct ParallelStream {
    voices: Vec<Stream>,
    pending: BinaryHeap<Pending>,
    primed: bool,
}

impl ParallelStream {
    pub(crate) fn new(parts: &[Pattern], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let voices = parts.iter().map(|p| p.as_stream_seeded(rng.gen())).collect();
        ParallelStream {
            voices,
            pending: BinaryHeap::new(),
            primed: false,
        }
    }

    fn enqueue(&mut self, voice: usize, time: Beats) -> Result<()> {
        if let Some(event) = self.voices[voice].next_event()? {
            self.pending.push(Pending { time, voice, event });
        }
        Ok(())
    }
}

impl StreamSource for ParallelStream {
    fn pull(&mut self) -> Result<Option<Value>> {
        if !self.primed {
            self.primed = true;
            for voice in 0..self.voices.len() {
                self.enqueue(voice, zero())?;
            }
        }

        let Some(Pending {
            time,
            voice,
            mut event,
        }) = self.pending.pop()
        else {
            return Ok(None);
        };

        let own_delta = event.delta()?;
        self.enqueue(voice, time + own_delta)?;

        // The merged stream paces by the gap to whichever operand is due next.
        let next_time = self
            .pending
            .peek()
            .map(|next| next.time)
            .unwrap_or(time + own_delta);
        event.set(EventKey::Voice, voice as f64);
        event.set_delta(next_time - time);
        Ok(Some(event.into()))
    }
}
