//! Tests for pattern combinators.

use super::constraint::{Bound, BoundaryPolicy};
use super::core::{chain, Pattern, Repeats};
use super::stream::Stream;
use crate::error::PatternError;
use crate::types::event::{Event, EventKey};
use crate::types::time::{beats, time, Beats};
use crate::types::value::Value;

fn numbers(stream: Stream) -> Vec<f64> {
    stream.map(|v| v.unwrap().as_f64().unwrap()).collect()
}

fn events(mut stream: Stream) -> Vec<Event> {
    let mut out = Vec::new();
    while let Some(event) = stream.next_event().unwrap() {
        out.push(event);
    }
    out
}

fn ints(values: &[i32]) -> Vec<Pattern> {
    values.iter().map(|v| Pattern::from(*v)).collect()
}

fn degree(event: &Event) -> f64 {
    event.get(&EventKey::Degree).unwrap().as_f64().unwrap()
}

fn pulse(dur: f64) -> Pattern {
    Pattern::bind(vec![("dur", Pattern::value(dur))])
}

#[test]
fn test_seq_plays_in_order() {
    let p = Pattern::seq(ints(&[1, 2, 3]), 2);
    assert_eq!(numbers(p.as_stream()), vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
}

#[test]
fn test_seq_zero_repeats_is_empty() {
    let p = Pattern::seq(ints(&[1, 2]), 0);
    assert!(numbers(p.as_stream()).is_empty());
}

#[test]
fn test_nested_seq_embeds_fully() {
    let inner = Pattern::seq(ints(&[1, 2]), 2);
    let p = Pattern::seq(vec![inner, Pattern::from(9)], 1);
    assert_eq!(numbers(p.as_stream()), vec![1.0, 2.0, 1.0, 2.0, 9.0]);
}

#[test]
fn test_literal_is_infinite_when_standalone() {
    let p = Pattern::value(5);
    let values: Vec<f64> = p.as_stream().take(100).map(|v| v.unwrap().as_f64().unwrap()).collect();
    assert_eq!(values.len(), 100);
    assert!(values.iter().all(|v| *v == 5.0));
    assert!(!p.is_bounded());
}

#[test]
fn test_infinite_seq_never_exhausts() {
    let p = Pattern::seq(ints(&[1, 2]), Repeats::Inf);
    let mut stream = p.as_stream();
    for _ in 0..1000 {
        assert!(stream.pull().unwrap().is_some());
    }
    assert!(!stream.is_exhausted());
}

#[test]
fn test_exhausted_stream_stays_exhausted() {
    let mut stream = Pattern::seq(ints(&[1]), 1).as_stream();
    assert!(stream.pull().unwrap().is_some());
    assert!(stream.pull().unwrap().is_none());
    assert!(stream.pull().unwrap().is_none());
    assert!(stream.is_exhausted());
}

#[test]
fn test_independent_streams_do_not_interfere() {
    let p = Pattern::rand(ints(&[1, 2, 3, 4, 5]), Repeats::Inf);
    let mut a = p.as_stream();
    let mut b = p.as_stream();

    let mut from_a = Vec::new();
    let mut from_b = Vec::new();
    // Pull unevenly so any shared state would show up as divergence
    for i in 0..60 {
        from_a.push(a.pull().unwrap().unwrap());
        if i % 3 == 0 {
            from_b.push(b.pull().unwrap().unwrap());
        }
    }
    while from_b.len() < from_a.len() {
        from_b.push(b.pull().unwrap().unwrap());
    }
    assert_eq!(from_a, from_b);
}

#[test]
fn test_seed_changes_random_output() {
    let p = Pattern::white(0.0, 1000.0, 20).unwrap();
    let default = numbers(p.as_stream());
    let reseeded = numbers(p.with_seed(42).as_stream());
    assert_eq!(default.len(), 20);
    assert_ne!(default, reseeded);
    assert_eq!(reseeded, numbers(p.as_stream_seeded(42)));
}

#[test]
fn test_rand_picks_from_items() {
    let p = Pattern::rand(ints(&[3, 5, 7]), 50);
    let values = numbers(p.as_stream());
    assert_eq!(values.len(), 50);
    assert!(values.iter().all(|v| [3.0, 5.0, 7.0].contains(v)));
}

#[test]
fn test_wrand_respects_zero_weight() {
    let p = Pattern::wrand(ints(&[1, 2]), vec![0.0, 3.0], 100).unwrap();
    assert!(numbers(p.as_stream()).iter().all(|v| *v == 2.0));
}

#[test]
fn test_wrand_rejects_bad_weights() {
    assert!(matches!(
        Pattern::wrand(ints(&[1, 2]), vec![1.0], 1),
        Err(PatternError::InvalidArgument(_))
    ));
    assert!(Pattern::wrand(ints(&[1, 2]), vec![1.0, -1.0], 1).is_err());
    assert!(Pattern::wrand(ints(&[1, 2]), vec![1.0, f64::NAN], 1).is_err());
}

#[test]
fn test_brown_rejects_inverted_range() {
    assert!(matches!(
        Pattern::brown(5.0, 1.0, 0.5, Repeats::Inf),
        Err(PatternError::InvalidArgument(_))
    ));
}

#[test]
fn test_random_ranges_must_have_finite_width() {
    assert!(matches!(
        Pattern::white(-f64::MAX, f64::MAX, 3),
        Err(PatternError::InvalidArgument(_))
    ));
    assert!(matches!(
        Pattern::brown(-f64::MAX, f64::MAX, 1.0, 3),
        Err(PatternError::InvalidArgument(_))
    ));
    let wide = Pattern::white(-f64::MAX / 2.0, f64::MAX / 2.0, 3).unwrap();
    assert_eq!(numbers(wide.as_stream()).len(), 3);
}

#[test]
fn test_shuffle_repeats_same_permutation() {
    let p = Pattern::shuffle(ints(&[1, 2, 3, 4, 5]), 2);
    let values = numbers(p.as_stream());
    assert_eq!(values.len(), 10);
    assert_eq!(values[..5], values[5..]);
}

#[test]
fn test_bind_builds_events() {
    let p = Pattern::bind(vec![
        ("degree", Pattern::seq(ints(&[0, 2]), 1)),
        ("dur", Pattern::value(0.25)),
        ("instrument", Pattern::value("pluck")),
    ]);
    let out = events(p.as_stream());
    assert_eq!(out.len(), 2);
    assert_eq!(
        out[1],
        Event::new()
            .with("degree", 2)
            .with("dur", 0.25)
            .with("instrument", "pluck")
    );
}

#[test]
fn test_bind_ends_with_shortest_field() {
    let p = Pattern::bind(vec![
        ("degree", Pattern::seq(ints(&[0, 1, 2, 3]), 1)),
        ("amp", Pattern::seq(vec![Pattern::from(0.1), Pattern::from(0.2)], 1)),
    ]);
    assert_eq!(events(p.as_stream()).len(), 2);
}

#[test]
fn test_chain_left_keys_win() {
    let a = Pattern::bind(vec![("dur", Pattern::value(1.0))]);
    let b = Pattern::bind(vec![("dur", Pattern::value(2.0)), ("amp", Pattern::value(0.1))]);
    let mut stream = a.chain(&b).as_stream();
    assert_eq!(
        stream.next_event().unwrap(),
        Some(Event::new().with("dur", 1.0).with("amp", 0.1))
    );
}

#[test]
fn test_chain_does_not_touch_operands() {
    let a = Pattern::bind(vec![("degree", Pattern::seq(ints(&[1, 2]), 1))]);
    let b = pulse(0.5);
    let before = a.clone();
    let _chained = chain(vec![a.clone(), b.clone()]);
    assert_eq!(a, before);
    assert_eq!(events(a.as_stream()).len(), 2);
}

#[test]
fn test_chain_ends_with_any_operand() {
    let short = Pattern::bind(vec![("degree", Pattern::seq(ints(&[1, 2, 3]), 1))]);
    let out = events(short.chain(&pulse(1.0)).as_stream());
    assert_eq!(out.iter().map(degree).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_nested_chain_flattens() {
    let a = pulse(1.0);
    let b = pulse(2.0);
    let c = Pattern::bind(vec![("amp", Pattern::value(0.3))]);
    assert_eq!(chain(vec![a.clone(), chain(vec![b.clone(), c.clone()])]), chain(vec![a, b, c]));
}

#[test]
fn test_chain_of_scalars_is_value_error() {
    let p = Pattern::value(3).chain(&pulse(1.0));
    let err = p.as_stream().next_event().unwrap_err();
    assert!(matches!(err, PatternError::Value(_)));
}

#[test]
fn test_duration_bound_truncates_last_event() {
    let p = pulse(1.0).fin_dur(3.5).unwrap();
    let out = events(p.as_stream());
    assert_eq!(out.len(), 4);
    assert_eq!(out[3].dur().unwrap(), 0.5);
    let total: Beats = out.iter().map(|e| e.delta().unwrap()).sum();
    assert_eq!(total, time(7, 2));
}

#[test]
fn test_duration_bound_exclude_drops_last_event() {
    let p = pulse(1.0).bound(Bound::duration(3.5).unwrap().exclude());
    let out = events(p.as_stream());
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|e| e.dur().unwrap() == 1.0));
}

#[test]
fn test_duration_bound_exact_fit() {
    let p = pulse(0.5).bound(Bound::duration(2.0).unwrap().with_policy(BoundaryPolicy::Exclude));
    assert_eq!(events(p.as_stream()).len(), 4);
}

#[test]
fn test_duration_bound_scales_back_through_stretch() {
    let p = Pattern::bind(vec![("dur", Pattern::value(1.0)), ("stretch", Pattern::value(2.0))])
        .fin_dur(3.0)
        .unwrap();
    let out = events(p.as_stream());
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].dur().unwrap(), 0.5);
    assert_eq!(out[1].delta().unwrap(), beats(1));
}

#[test]
fn test_duration_bound_on_zero_length_events_fails() {
    let p = pulse(0.0).fin_dur(1.0).unwrap();
    let mut stream = p.as_stream();
    let result = (0..5000).try_for_each(|_| stream.next_event().map(|_| ()));
    assert!(matches!(result, Err(PatternError::UnboundedComposition(_))));
}

#[test]
fn test_count_bound() {
    let p = Pattern::series(0.0, 1.0, Repeats::Inf).fin(3);
    assert_eq!(numbers(p.as_stream()), vec![0.0, 1.0, 2.0]);
}

#[test]
fn test_until_bound_emits_reaching_event() {
    let p = Pattern::bind(vec![("degree", Pattern::series(0.0, 1.0, Repeats::Inf))])
        .bound(Bound::until("degree", 3));
    let out = events(p.as_stream());
    assert_eq!(out.iter().map(degree).collect::<Vec<_>>(), vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn test_until_bound_on_symbol_uses_equality() {
    let p = Pattern::bind(vec![(
        "instrument",
        Pattern::seq(vec!["a".into(), "b".into(), "c".into()], Repeats::Inf),
    )])
    .bound(Bound::until("instrument", Value::symbol("b")));
    assert_eq!(events(p.as_stream()).len(), 2);
}

#[test]
fn test_sequencer_plays_parts_in_order() {
    let p1 = Pattern::bind(vec![("degree", Pattern::value(1))]).fin(2);
    let p2 = Pattern::bind(vec![("degree", Pattern::value(2))]).fin(3);
    let p = Pattern::sequencer(vec![p1, p2]).unwrap();
    let out = events(p.as_stream());
    assert_eq!(out.iter().map(degree).collect::<Vec<_>>(), vec![1.0, 1.0, 2.0, 2.0, 2.0]);
}

#[test]
fn test_sequencer_allows_unbounded_last_part() {
    let intro = pulse(1.0).fin(1);
    let p = Pattern::sequencer(vec![intro, pulse(0.5)]).unwrap();
    assert!(!p.is_bounded());
    assert_eq!(p.as_stream().take(10).count(), 10);
}

#[test]
fn test_sequencer_rejects_unbounded_inner_part() {
    let err = Pattern::sequencer(vec![pulse(1.0), pulse(1.0).fin(2)]).unwrap_err();
    assert!(matches!(err, PatternError::UnboundedComposition(_)));
}

#[test]
fn test_empty_sequencer_is_empty() {
    let p = Pattern::sequencer(vec![]).unwrap();
    assert!(p.as_stream().next().is_none());
}

#[test]
fn test_parallel_interleaves_by_time() {
    let slow = Pattern::bind(vec![("degree", Pattern::seq(ints(&[1, 2]), 1)), ("dur", Pattern::value(1.0))]);
    let fast = Pattern::bind(vec![
        ("degree", Pattern::seq(ints(&[10, 11, 12]), 1)),
        ("dur", Pattern::value(0.5)),
    ]);
    let out = events(Pattern::parallel(vec![slow, fast]).as_stream());

    assert_eq!(out.iter().map(degree).collect::<Vec<_>>(), vec![1.0, 10.0, 11.0, 2.0, 12.0]);
    let voices: Vec<f64> = out
        .iter()
        .map(|e| e.get(&EventKey::Voice).unwrap().as_f64().unwrap())
        .collect();
    assert_eq!(voices, vec![0.0, 1.0, 1.0, 0.0, 1.0]);
    let deltas: Vec<Beats> = out.iter().map(|e| e.delta().unwrap()).collect();
    assert_eq!(deltas, vec![beats(0), time(1, 2), time(1, 2), beats(0), time(1, 2)]);
    // Original durations survive for the sink
    assert_eq!(out[0].dur().unwrap(), 1.0);
}

#[test]
fn test_parallel_ends_when_all_parts_end() {
    let a = pulse(1.0).fin(2);
    let b = pulse(1.0).fin(5);
    assert_eq!(events(Pattern::parallel(vec![a, b]).as_stream()).len(), 7);
}

#[test]
fn test_is_bounded() {
    assert!(Pattern::seq(ints(&[1, 2]), 4).is_bounded());
    assert!(!Pattern::seq(ints(&[1, 2]), Repeats::Inf).is_bounded());
    assert!(!Pattern::white(0.0, 1.0, Repeats::Inf).unwrap().is_bounded());
    assert!(pulse(1.0).fin_dur(2.0).unwrap().is_bounded());
    assert!(Pattern::bind(vec![("degree", Pattern::seq(ints(&[1]), 1)), ("dur", Pattern::value(1.0))]).is_bounded());
    assert!(!pulse(1.0).is_bounded());
    assert!(!Pattern::parallel(vec![pulse(1.0).fin(1), pulse(1.0)]).is_bounded());
}

#[test]
fn test_display() {
    assert_eq!(Pattern::seq(ints(&[1, 2]), 1).to_string(), "Pseq([1, 2], 1)");
    assert_eq!(Pattern::rand(ints(&[1]), Repeats::Inf).to_string(), "Prand([1], inf)");
    assert_eq!(pulse(1.0).fin(2).to_string(), "Pfin[2](Pbind(\\dur, 1))");
}
