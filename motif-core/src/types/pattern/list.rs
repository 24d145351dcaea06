//! List generators: in-order, uniform, weighted and shuffled selection.
//!
//! Each selected item is embedded, i.e. played to exhaustion before the next
//! selection. The sequencer reuses this with standalone embedding so its
//! parts behave exactly as they would when played alone.

use super::core::{Embedding, Pattern, Repeats};
use super::stream::{Stream, StreamSource};
use crate::error::Result;
use crate::types::value::Value;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Consecutive empty embeds per item after which a list gives up.
///
/// An infinitely repeating list whose items all yield nothing would otherwise
/// spin forever without producing a value.
const STALL_LIMIT_PER_ITEM: usize = 8;

/// How a list generator chooses its next item
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Selection {
    /// One round is a full pass
    InOrder,
    /// One round is a single pick
    Uniform,
    /// One round is a single pick; weights are relative
    Weighted(Vec<f64>),
    /// One round is a full pass through a per-stream permutation
    Shuffled,
}

impl Selection {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Selection::InOrder => "Pseq",
            Selection::Uniform => "Prand",
            Selection::Weighted(_) => "Pwrand",
            Selection::Shuffled => "Pshuf",
        }
    }
}

enum Picker {
    InOrder,
    Uniform,
    Weighted(WeightedIndex<f64>),
    Shuffled(Vec<usize>),
}

pub(crate) struct ListStream {
    items: Vec<Pattern>,
    picker: Picker,
    repeats: Repeats,
    embedding: Embedding,
    rng: StdRng,
    rounds: usize,
    position: usize,
    current: Option<Stream>,
    current_yielded: bool,
    empty_run: usize,
}

impl ListStream {
    pub(crate) fn new(
        items: Vec<Pattern>,
        selection: &Selection,
        repeats: Repeats,
        embedding: Embedding,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let picker = match selection {
            Selection::InOrder => Picker::InOrder,
            Selection::Uniform => Picker::Uniform,
            // All-zero weights cannot build an index; pick uniformly instead.
            Selection::Weighted(weights) => match WeightedIndex::new(weights) {
                Ok(index) => Picker::Weighted(index),
                Err(_) => Picker::Uniform,
            },
            Selection::Shuffled => {
                let mut order: Vec<usize> = (0..items.len()).collect();
                order.shuffle(&mut rng);
                Picker::Shuffled(order)
            }
        };
        ListStream {
            items,
            picker,
            repeats,
            embedding,
            rng,
            rounds: 0,
            position: 0,
            current: None,
            current_yielded: false,
            empty_run: 0,
        }
    }

    /// Choose the next item index, counting completed rounds
    fn select(&mut self) -> usize {
        let len = self.items.len();
        match &self.picker {
            Picker::InOrder | Picker::Shuffled(_) => {
                let index = match &self.picker {
                    Picker::Shuffled(order) => order[self.position],
                    _ => self.position,
                };
                self.position += 1;
                if self.position == len {
                    self.position = 0;
                    self.rounds += 1;
                }
                index
            }
            Picker::Uniform => {
                self.rounds += 1;
                self.rng.gen_range(0..len)
            }
            Picker::Weighted(weights) => {
                self.rounds += 1;
                weights.sample(&mut self.rng)
            }
        }
    }
}

impl StreamSource for ListStream {
    fn pull(&mut self) -> Result<Option<Value>> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(value) = current.pull()? {
                    self.current_yielded = true;
                    self.empty_run = 0;
                    return Ok(Some(value));
                }
                if !self.current_yielded {
                    self.empty_run += 1;
                }
                self.current = None;
            }

            if self.items.is_empty() || !self.repeats.allows(self.rounds) {
                return Ok(None);
            }
            if self.empty_run >= self.items.len() * STALL_LIMIT_PER_ITEM {
                return Ok(None);
            }

            let index = self.select();
            let child_seed = self.rng.gen();
            self.current = Some(self.items[index].build(child_seed, self.embedding));
            self.current_yielded = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[i32]) -> Vec<Pattern> {
        values.iter().map(|v| Pattern::from(*v)).collect()
    }

    fn collect(stream: Stream) -> Vec<f64> {
        stream.map(|v| v.unwrap().as_f64().unwrap()).collect()
    }

    #[test]
    fn test_in_order_repeats() {
        let s = ListStream::new(numbers(&[1, 2]), &Selection::InOrder, Repeats::Times(2), Embedding::Item, 0);
        assert_eq!(collect(Stream::new(s)), vec![1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_uniform_counts_picks() {
        let s = ListStream::new(numbers(&[1, 2, 3]), &Selection::Uniform, Repeats::Times(5), Embedding::Item, 7);
        assert_eq!(collect(Stream::new(s)).len(), 5);
    }

    #[test]
    fn test_zero_weights_fall_back_to_uniform() {
        let s = ListStream::new(
            numbers(&[1, 2]),
            &Selection::Weighted(vec![0.0, 0.0]),
            Repeats::Times(4),
            Embedding::Item,
            3,
        );
        assert_eq!(collect(Stream::new(s)).len(), 4);
    }

    #[test]
    fn test_shuffled_is_permutation() {
        let s = ListStream::new(numbers(&[1, 2, 3, 4]), &Selection::Shuffled, Repeats::Times(1), Embedding::Item, 11);
        let mut values = collect(Stream::new(s));
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_stalled_infinite_list_ends() {
        let empty = Pattern::seq(vec![], Repeats::Inf);
        let s = ListStream::new(vec![empty], &Selection::InOrder, Repeats::Inf, Embedding::Item, 0);
        assert!(collect(Stream::new(s)).is_empty());
    }
}
