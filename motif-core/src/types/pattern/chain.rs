//! Chain: per-step merge of several event streams, left keys winning.

use super::core::Pattern;
use super::stream::{Stream, StreamSource};
use crate::error::Result;
use crate::types::event::Event;
use crate::types::value::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub(crate) struct ChainStream {
    operands: Vec<Stream>,
}

impl ChainStream {
    pub(crate) fn new(operands: &[Pattern], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let operands = operands
            .iter()
            .map(|p| p.as_stream_seeded(rng.gen()))
            .collect();
        ChainStream { operands }
    }
}

impl StreamSource for ChainStream {
    fn pull(&mut self) -> Result<Option<Value>> {
        // Right to left: each operand's event is laid over what the operands
        // to its right produced.
        let mut merged = Event::new();
        for stream in self.operands.iter_mut().rev() {
            match stream.next_event()? {
                Some(event) => merged = event.merged_over(&merged),
                None => return Ok(None),
            }
        }
        Ok(Some(merged.into()))
    }
}
