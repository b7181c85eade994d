//! Session cache behavior across successive edits

mod common;

use ambit::chart::ChartConfig;
use ambit::incremental::{
    CacheConfig, CacheOutcome, DebounceDecision, DebouncePolicy, DebounceSnapshot,
    IncrementalParser, ManualClock, ParseReason,
};
use common::{arithmetic, editing, tokens};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn parser() -> IncrementalParser {
    IncrementalParser::with_clock(
        ChartConfig::default(),
        CacheConfig::default(),
        Arc::new(ManualClock::new()),
    )
}

#[test_log::test]
fn test_typing_sequence_reuses_prefixes() {
    let grammar = editing();
    let mut parser = parser();

    let steps = ["make", "make it", "make it brighter"];
    let outcomes: Vec<CacheOutcome> = steps
        .iter()
        .map(|input| parser.parse(&grammar, &tokens(input)).unwrap().reuse.outcome)
        .collect();

    assert_eq!(
        outcomes,
        vec![
            CacheOutcome::Miss,
            CacheOutcome::PartialHit { reusable_prefix: 1 },
            CacheOutcome::PartialHit { reusable_prefix: 2 },
        ]
    );
    assert_eq!(parser.cache().len(), 3);
    assert_eq!(parser.cache().stats().partial_hits, 2);
}

#[test]
fn test_whitespace_and_case_do_not_matter() {
    let grammar = editing();
    let mut parser = parser();

    parser.parse(&grammar, &tokens("make it brighter")).unwrap();
    let spaced = parser.parse(&grammar, &tokens("  make   it brighter ")).unwrap();
    assert_eq!(spaced.reuse.outcome, CacheOutcome::FullHit);
    let shouted = parser.parse(&grammar, &tokens("Make It Brighter")).unwrap();
    assert_eq!(shouted.reuse.outcome, CacheOutcome::FullHit);
    assert!((shouted.reuse.reuse_ratio() - 1.0).abs() < f64::EPSILON);
    assert_eq!(parser.cache().len(), 1);
}

#[test]
fn test_failed_parses_are_cached() {
    let grammar = editing();
    let mut parser = parser();

    let first = parser.parse(&grammar, &tokens("delete tha clip")).unwrap();
    assert!(!first.result.is_success());
    let second = parser.parse(&grammar, &tokens("delete tha clip")).unwrap();
    assert_eq!(second.reuse.outcome, CacheOutcome::FullHit);
}

#[test]
fn test_grammars_are_cached_separately() {
    let editing = editing();
    let arithmetic = arithmetic();
    let mut parser = IncrementalParser::with_clock(
        ChartConfig::default(),
        CacheConfig::default().with_max_entries(1),
        Arc::new(ManualClock::new()),
    );

    parser.parse(&editing, &tokens("delete the clip")).unwrap();
    parser.parse(&arithmetic, &tokens("one plus one")).unwrap();

    assert_eq!(parser.cache().entries_for("editing").len(), 1);
    assert_eq!(parser.cache().entries_for("arith").len(), 1);
    assert_eq!(
        parser.parse(&editing, &tokens("delete the clip")).unwrap().reuse.outcome,
        CacheOutcome::FullHit
    );
}

#[test]
fn test_zero_capacity_keeps_latest_entry() {
    let grammar = editing();
    let config = CacheConfig {
        max_entries: 0,
        ..CacheConfig::default()
    };
    let mut parser =
        IncrementalParser::with_clock(ChartConfig::default(), config, Arc::new(ManualClock::new()));

    parser.parse(&grammar, &tokens("delete the clip")).unwrap();
    assert_eq!(parser.cache().len(), 1);
    let again = parser.parse(&grammar, &tokens("delete the clip")).unwrap();
    assert_eq!(again.reuse.outcome, CacheOutcome::FullHit);

    parser.parse(&grammar, &tokens("make it brighter")).unwrap();
    assert_eq!(parser.cache().len(), 1);
    assert_eq!(parser.cache().stats().evictions, 1);
}

#[test]
fn test_stats_and_reset() {
    let grammar = editing();
    let mut parser = parser();
    let input = tokens("delete the clip");

    parser.parse(&grammar, &input).unwrap();
    parser.parse(&grammar, &input).unwrap();
    parser.parse(&grammar, &input).unwrap();

    let stats = *parser.cache().stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.entries, 1);
    assert!((stats.hit_ratio() - 2.0 / 3.0).abs() < 1e-9);

    parser.cache_mut().reset_stats();
    assert_eq!(parser.cache().stats().hits, 0);
    assert_eq!(parser.cache().stats().entries, 1);

    parser.cache_mut().clear();
    assert!(parser.cache().is_empty());
    assert_eq!(parser.cache().stats().entries, 0);
}

#[test]
fn test_debounce_waits_for_earliest_trigger() {
    let policy = DebouncePolicy::default();
    let snapshot = DebounceSnapshot {
        since_last_parse: Some(Duration::from_millis(100)),
        since_last_keystroke: Duration::from_millis(100),
        pending_for: Duration::from_millis(100),
    };
    assert_eq!(
        policy.decide(snapshot),
        DebounceDecision::Wait(Duration::from_millis(50))
    );
    let later = DebounceSnapshot {
        since_last_parse: Some(Duration::from_millis(150)),
        ..snapshot
    };
    assert_eq!(
        policy.decide(later),
        DebounceDecision::ParseNow(ParseReason::MinInterval)
    );
}

proptest! {
    #[test]
    fn prop_eviction_bound(
        inputs in prop::collection::vec(
            prop::collection::vec(prop::sample::select(vec!["one", "plus", "two"]), 1..6),
            1..40,
        ),
        capacity in 1usize..6,
    ) {
        let grammar = arithmetic();
        let mut parser = IncrementalParser::with_clock(
            ChartConfig::default(),
            CacheConfig::default().with_max_entries(capacity),
            Arc::new(ManualClock::new()),
        );
        for words in &inputs {
            parser.parse(&grammar, &tokens(&words.join(" "))).unwrap();
            prop_assert!(parser.cache().entries_for("arith").len() <= capacity);
        }
    }

    #[test]
    fn prop_shared_prefix_is_reported(
        prefix in prop::collection::vec(prop::sample::select(vec!["one", "plus"]), 1..5),
        first_tail in prop::collection::vec(prop::sample::select(vec!["one", "plus"]), 0..3),
    ) {
        let grammar = arithmetic();
        let mut parser = IncrementalParser::with_clock(
            ChartConfig::default(),
            CacheConfig::default(),
            Arc::new(ManualClock::new()),
        );
        let mut first: Vec<&str> = prefix.clone();
        first.extend(&first_tail);
        let mut second: Vec<&str> = prefix.clone();
        second.push("two");

        parser.parse(&grammar, &tokens(&first.join(" "))).unwrap();
        let parse = parser.parse(&grammar, &tokens(&second.join(" "))).unwrap();
        prop_assert_eq!(
            parse.reuse.outcome,
            CacheOutcome::PartialHit { reusable_prefix: prefix.len() }
        );
    }
}
