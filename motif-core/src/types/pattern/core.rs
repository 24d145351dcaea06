//! Core Pattern type: an immutable, shareable description of a stream.

use super::bind::BindStream;
use super::chain::ChainStream;
use super::constraint::{Bound, ConstrainStream};
use super::list::{ListStream, Selection};
use super::numeric::{BrownStream, GeomStream, SeriesStream, WhiteStream};
use super::parallel::ParallelStream;
use super::stream::{ConstStream, Stream};
use crate::error::{PatternError, Result};
use crate::types::event::EventKey;
use crate::types::value::Value;
use std::fmt;
use std::sync::Arc;

/// Seed used by [`Pattern::as_stream`] unless a pattern carries its own.
pub const DEFAULT_SEED: u64 = 0x5EED;

/// How many times a generator repeats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeats {
    Times(usize),
    /// Never exhausts on its own
    Inf,
}

impl Repeats {
    pub fn is_finite(&self) -> bool {
        matches!(self, Repeats::Times(_))
    }

    /// Whether another round is allowed after `done` completed rounds
    pub(crate) fn allows(&self, done: usize) -> bool {
        match self {
            Repeats::Times(n) => done < *n,
            Repeats::Inf => true,
        }
    }
}

impl From<usize> for Repeats {
    fn from(n: usize) -> Self {
        Repeats::Times(n)
    }
}

/// Negative counts play nothing
impl From<i32> for Repeats {
    fn from(n: i32) -> Self {
        Repeats::Times(n.max(0) as usize)
    }
}

impl fmt::Display for Repeats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repeats::Times(n) => write!(f, "{}", n),
            Repeats::Inf => write!(f, "inf"),
        }
    }
}

/// Whether a pattern is played as a stream of its own or embedded as a list item.
///
/// Only literal values care: standalone they repeat forever, embedded they
/// yield once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Embedding {
    Standalone,
    Item,
}

#[derive(Debug, PartialEq)]
pub(crate) enum PatternNode {
    Value(Value),
    List {
        items: Vec<Pattern>,
        selection: Selection,
        repeats: Repeats,
    },
    White {
        lo: f64,
        hi: f64,
        length: Repeats,
    },
    Brown {
        lo: f64,
        hi: f64,
        step: f64,
        length: Repeats,
    },
    Series {
        start: f64,
        step: f64,
        length: Repeats,
    },
    Geom {
        start: f64,
        grow: f64,
        length: Repeats,
    },
    Bind(Vec<(EventKey, Pattern)>),
    Chain(Vec<Pattern>),
    Constrain {
        inner: Pattern,
        bound: Bound,
    },
    Sequence(Vec<Pattern>),
    Parallel(Vec<Pattern>),
    Seeded {
        inner: Pattern,
        seed: u64,
    },
}

/// An immutable pattern descriptor.
///
/// Cloning is cheap (shared node). Every call to [`Pattern::as_stream`]
/// builds a fresh, independent [`Stream`]; composing patterns never touches
/// the operands.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    node: Arc<PatternNode>,
}

impl Pattern {
    fn from_node(node: PatternNode) -> Self {
        Pattern {
            node: Arc::new(node),
        }
    }

    /// A literal value. Repeats forever on its own, yields once inside a list.
    pub fn value(value: impl Into<Value>) -> Self {
        Pattern::from_node(PatternNode::Value(value.into()))
    }

    /// Play `items` in order, `repeats` times (`Pseq`)
    pub fn seq(items: Vec<Pattern>, repeats: impl Into<Repeats>) -> Self {
        Pattern::from_node(PatternNode::List {
            items,
            selection: Selection::InOrder,
            repeats: repeats.into(),
        })
    }

    /// Pick one of `items` uniformly, `repeats` times (`Prand`)
    pub fn rand(items: Vec<Pattern>, repeats: impl Into<Repeats>) -> Self {
        Pattern::from_node(PatternNode::List {
            items,
            selection: Selection::Uniform,
            repeats: repeats.into(),
        })
    }

    /// Pick one of `items` by relative weight, `repeats` times (`Pwrand`)
    ///
    /// Weights need not sum to one. All-zero weights fall back to a uniform pick.
    pub fn wrand(items: Vec<Pattern>, weights: Vec<f64>, repeats: impl Into<Repeats>) -> Result<Self> {
        if items.len() != weights.len() {
            return Err(PatternError::InvalidArgument(format!(
                "wrand has {} items but {} weights",
                items.len(),
                weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(PatternError::InvalidArgument(format!(
                "wrand weight {} must be finite and non-negative",
                w
            )));
        }
        Ok(Pattern::from_node(PatternNode::List {
            items,
            selection: Selection::Weighted(weights),
            repeats: repeats.into(),
        }))
    }

    /// Play a random permutation of `items`, `repeats` times (`Pshuf`)
    pub fn shuffle(items: Vec<Pattern>, repeats: impl Into<Repeats>) -> Self {
        Pattern::from_node(PatternNode::List {
            items,
            selection: Selection::Shuffled,
            repeats: repeats.into(),
        })
    }

    /// Uniform random numbers in `[lo, hi]` (`Pwhite`)
    pub fn white(lo: f64, hi: f64, length: impl Into<Repeats>) -> Result<Self> {
        check_range("white", lo, hi)?;
        Ok(Pattern::from_node(PatternNode::White {
            lo,
            hi,
            length: length.into(),
        }))
    }

    /// Bounded random walk in `[lo, hi]` moving at most `step` per value (`Pbrown`)
    pub fn brown(lo: f64, hi: f64, step: f64, length: impl Into<Repeats>) -> Result<Self> {
        check_range("brown", lo, hi)?;
        if !step.is_finite() || step < 0.0 {
            return Err(PatternError::InvalidArgument(format!(
                "brown step {} must be finite and non-negative",
                step
            )));
        }
        Ok(Pattern::from_node(PatternNode::Brown {
            lo,
            hi,
            step,
            length: length.into(),
        }))
    }

    /// Arithmetic series `start, start + step, ...` (`Pseries`)
    pub fn series(start: f64, step: f64, length: impl Into<Repeats>) -> Self {
        Pattern::from_node(PatternNode::Series {
            start,
            step,
            length: length.into(),
        })
    }

    /// Geometric series `start, start * grow, ...` (`Pgeom`)
    pub fn geom(start: f64, grow: f64, length: impl Into<Repeats>) -> Self {
        Pattern::from_node(PatternNode::Geom {
            start,
            grow,
            length: length.into(),
        })
    }

    /// Event pattern: one value from each field per event (`Pbind`)
    ///
    /// Ends as soon as any field stream ends.
    pub fn bind<K: Into<EventKey>>(fields: Vec<(K, Pattern)>) -> Self {
        let fields = fields.into_iter().map(|(k, p)| (k.into(), p)).collect();
        Pattern::from_node(PatternNode::Bind(fields))
    }

    /// Merge this pattern's events over `other`'s (`self <> other`)
    pub fn chain(&self, other: &Pattern) -> Pattern {
        chain(vec![self.clone(), other.clone()])
    }

    /// Wrap this pattern in a termination bound
    pub fn bound(&self, bound: Bound) -> Pattern {
        Pattern::from_node(PatternNode::Constrain {
            inner: self.clone(),
            bound,
        })
    }

    /// At most `count` values (`Pfin`)
    pub fn fin(&self, count: usize) -> Pattern {
        self.bound(Bound::Count(count))
    }

    /// Events up to a total of `beats`, truncating the last one (`Pfindur`)
    pub fn fin_dur(&self, beats: f64) -> Result<Pattern> {
        Ok(self.bound(Bound::duration(beats)?))
    }

    /// Play `parts` one after another.
    ///
    /// Every part except the last must be bounded, otherwise the sequence
    /// could never advance; that is rejected here instead of hanging at
    /// playback time.
    pub fn sequencer(parts: Vec<Pattern>) -> Result<Pattern> {
        let last = parts.len().saturating_sub(1);
        if let Some(index) = parts[..last].iter().position(|p| !p.is_bounded()) {
            return Err(PatternError::UnboundedComposition(format!(
                "sequencer part {} never ends; wrap it in a bound (fin, fin_dur or until)",
                index
            )));
        }
        Ok(Pattern::from_node(PatternNode::Sequence(parts)))
    }

    /// Interleave event patterns in logical time (`Ppar`)
    pub fn parallel(parts: Vec<Pattern>) -> Pattern {
        Pattern::from_node(PatternNode::Parallel(parts))
    }

    /// Fix the seed random generators in this pattern start from
    pub fn with_seed(&self, seed: u64) -> Pattern {
        Pattern::from_node(PatternNode::Seeded {
            inner: self.clone(),
            seed,
        })
    }

    /// Instantiate a fresh stream using [`DEFAULT_SEED`] or the pattern's own seed.
    pub fn as_stream(&self) -> Stream {
        self.as_stream_seeded(DEFAULT_SEED)
    }

    /// Instantiate a fresh stream with an explicit seed
    pub fn as_stream_seeded(&self, seed: u64) -> Stream {
        self.build(seed, Embedding::Standalone)
    }

    pub(crate) fn build(&self, seed: u64, embedding: Embedding) -> Stream {
        match &*self.node {
            PatternNode::Value(v) => {
                Stream::new(ConstStream::new(v.clone(), embedding == Embedding::Item))
            }
            PatternNode::List {
                items,
                selection,
                repeats,
            } => Stream::new(ListStream::new(
                items.clone(),
                selection,
                *repeats,
                Embedding::Item,
                seed,
            )),
            PatternNode::White { lo, hi, length } => {
                Stream::new(WhiteStream::new(*lo, *hi, *length, seed))
            }
            PatternNode::Brown {
                lo,
                hi,
                step,
                length,
            } => Stream::new(BrownStream::new(*lo, *hi, *step, *length, seed)),
            PatternNode::Series {
                start,
                step,
                length,
            } => Stream::new(SeriesStream::new(*start, *step, *length)),
            PatternNode::Geom {
                start,
                grow,
                length,
            } => Stream::new(GeomStream::new(*start, *grow, *length)),
            PatternNode::Bind(fields) => Stream::new(BindStream::new(fields, seed)),
            PatternNode::Chain(operands) => Stream::new(ChainStream::new(operands, seed)),
            PatternNode::Constrain { inner, bound } => {
                Stream::new(ConstrainStream::new(inner.as_stream_seeded(seed), bound.clone()))
            }
            PatternNode::Sequence(parts) => Stream::new(ListStream::new(
                parts.clone(),
                &Selection::InOrder,
                Repeats::Times(1),
                Embedding::Standalone,
                seed,
            )),
            PatternNode::Parallel(parts) => Stream::new(ParallelStream::new(parts, seed)),
            PatternNode::Seeded { inner, seed } => inner.build(*seed, embedding),
        }
    }

    /// Whether a stream of this pattern is guaranteed to end
    pub fn is_bounded(&self) -> bool {
        self.bounded_as(Embedding::Standalone)
    }

    fn bounded_as(&self, embedding: Embedding) -> bool {
        match &*self.node {
            PatternNode::Value(_) => embedding == Embedding::Item,
            PatternNode::List { items, repeats, .. } => {
                items.is_empty()
                    || (repeats.is_finite() && items.iter().all(|p| p.bounded_as(Embedding::Item)))
            }
            PatternNode::White { length, .. }
            | PatternNode::Brown { length, .. }
            | PatternNode::Series { length, .. }
            | PatternNode::Geom { length, .. } => length.is_finite(),
            PatternNode::Bind(fields) => fields.iter().any(|(_, p)| p.is_bounded()),
            PatternNode::Chain(operands) => operands.iter().any(Pattern::is_bounded),
            PatternNode::Constrain { .. } => true,
            PatternNode::Sequence(parts) | PatternNode::Parallel(parts) => {
                parts.iter().all(Pattern::is_bounded)
            }
            PatternNode::Seeded { inner, .. } => inner.bounded_as(embedding),
        }
    }

    pub(crate) fn chain_operands(&self) -> Option<&[Pattern]> {
        match &*self.node {
            PatternNode::Chain(operands) => Some(operands),
            _ => None,
        }
    }
}

/// Chain event patterns; keys from patterns further left win (`P1 <> P2 <> ...`).
///
/// Nested chains are flattened, so `chain([a, chain([b, c])])` equals
/// `chain([a, b, c])`.
pub fn chain(patterns: Vec<Pattern>) -> Pattern {
    let mut operands = Vec::with_capacity(patterns.len());
    for p in patterns {
        match p.chain_operands() {
            Some(inner) => operands.extend(inner.iter().cloned()),
            None => operands.push(p),
        }
    }
    Pattern::from_node(PatternNode::Chain(operands))
}

fn check_range(name: &str, lo: f64, hi: f64) -> Result<()> {
    if !lo.is_finite() || !hi.is_finite() || lo > hi || !(hi - lo).is_finite() {
        return Err(PatternError::InvalidArgument(format!(
            "{} range [{}, {}] is not a finite, ordered range",
            name, lo, hi
        )));
    }
    Ok(())
}

impl From<Value> for Pattern {
    fn from(value: Value) -> Self {
        Pattern::value(value)
    }
}

impl From<f64> for Pattern {
    fn from(n: f64) -> Self {
        Pattern::value(n)
    }
}

impl From<i32> for Pattern {
    fn from(n: i32) -> Self {
        Pattern::value(n)
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Pattern::value(s)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Pattern]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "]")
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.node {
            PatternNode::Value(v) => write!(f, "{}", v),
            PatternNode::List {
                items,
                selection,
                repeats,
            } => {
                write!(f, "{}(", selection.name())?;
                write_list(f, items)?;
                write!(f, ", {})", repeats)
            }
            PatternNode::White { lo, hi, length } => write!(f, "Pwhite({}, {}, {})", lo, hi, length),
            PatternNode::Brown {
                lo,
                hi,
                step,
                length,
            } => write!(f, "Pbrown({}, {}, {}, {})", lo, hi, step, length),
            PatternNode::Series {
                start,
                step,
                length,
            } => write!(f, "Pseries({}, {}, {})", start, step, length),
            PatternNode::Geom {
                start,
                grow,
                length,
            } => write!(f, "Pgeom({}, {}, {})", start, grow, length),
            PatternNode::Bind(fields) => {
                write!(f, "Pbind(")?;
                for (i, (key, p)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\\{}, {}", key, p)?;
                }
                write!(f, ")")
            }
            PatternNode::Chain(operands) => {
                for (i, p) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " <> ")?;
                    }
                    write!(f, "{}", p)?;
                }
                Ok(())
            }
            PatternNode::Constrain { inner, bound } => write!(f, "{}({})", bound, inner),
            PatternNode::Sequence(parts) => {
                write!(f, "Sequencer(")?;
                write_list(f, parts)?;
                write!(f, ")")
            }
            PatternNode::Parallel(parts) => {
                write!(f, "Ppar(")?;
                write_list(f, parts)?;
                write!(f, ")")
            }
            PatternNode::Seeded { inner, seed } => write!(f, "{}.seed({})", inner, seed),
        }
    }
}
