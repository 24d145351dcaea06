//! Bind: builds event streams from per-key value patterns.

use super::core::Pattern;
use super::stream::{Stream, StreamSource};
use crate::error::Result;
use crate::types::event::{Event, EventKey};
use crate::types::value::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub(crate) struct BindStream {
    fields: Vec<(EventKey, Stream)>,
}

impl BindStream {
    pub(crate) fn new(fields: &[(EventKey, Pattern)], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let fields = fields
            .iter()
            .map(|(key, pattern)| (key.clone(), pattern.as_stream_seeded(rng.gen())))
            .collect();
        BindStream { fields }
    }
}

impl StreamSource for BindStream {
    fn pull(&mut self) -> Result<Option<Value>> {
        let mut event = Event::new();
        for (key, stream) in &mut self.fields {
            match stream.pull()? {
                Some(value) => event.set(key.clone(), value),
                None => return Ok(None),
            }
        }
        Ok(Some(event.into()))
    }
}
