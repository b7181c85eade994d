//! End-to-end behavior of the analysis pipeline

mod common;

use ambit::analysis::{Analyzer, AnalyzerConfig, Session};
use ambit::forest::{ForestNode, Severity};
use ambit::incremental::{CacheConfig, CacheOutcome, ManualClock};
use ambit::score::{Confidence, DiscourseContext};
use common::{brighter_or_contrast, editing, tokens};
use std::sync::Arc;

#[test_log::test]
fn test_equal_readings_need_clarification() {
    let grammar = brighter_or_contrast();
    let input = tokens("make it brighter");
    let analysis = Analyzer::new(&grammar, AnalyzerConfig::default()).analyze(&input);

    assert!(analysis.is_success());
    assert_eq!(analysis.derivations.len(), 2);

    let Some(ForestNode::Or { alternatives, .. }) = analysis.forest.root_node() else {
        panic!("expected an Or root");
    };
    assert_eq!(alternatives.len(), 2);

    assert_eq!(analysis.ambiguity_points.len(), 1);
    let point = &analysis.ambiguity_points[0];
    assert_eq!(point.severity, Severity::High);
    assert_eq!(point.source_text, "make it brighter");
    let mut actions: Vec<&str> = point
        .alternatives
        .iter()
        .filter_map(|alternative| alternative.action.as_deref())
        .collect();
    actions.sort_unstable();
    assert_eq!(actions, ["adjust_brightness", "adjust_contrast"]);

    let margin = analysis.ranking.margin().unwrap();
    assert!(margin.abs() < 1e-9);
    assert_eq!(analysis.ranking.confidence, Confidence::Ambiguous);
    assert!(analysis.needs_clarification());
    assert!(analysis.ranking.parses.iter().all(|p| p.needs_clarification));
}

#[test]
fn test_discourse_breaks_the_tie() {
    let grammar = brighter_or_contrast();
    let input = tokens("make it brighter");
    let discourse = DiscourseContext::new().with_action("adjust_contrast");
    let analysis = Analyzer::new(&grammar, AnalyzerConfig::default())
        .analyze_with(&input, Some(&discourse));

    let (best, derivation) = analysis.best().unwrap();
    let action = grammar.rule(derivation.root().rule).action.as_deref();
    assert_eq!(action, Some("adjust_contrast"));
    // Coherence alone moves the winner by its weight of 0.10.
    assert!((analysis.ranking.margin().unwrap() - 0.1).abs() < 1e-9);
    assert_eq!(best.rank, 1);
    assert_ne!(analysis.ranking.confidence, Confidence::Ambiguous);
}

#[test_log::test]
fn test_repeated_input_is_a_full_hit() {
    let grammar = editing();
    let clock = ManualClock::new();
    let mut session = Session::with_clock(
        &grammar,
        AnalyzerConfig::default(),
        CacheConfig::default(),
        Arc::new(clock.clone()),
    );
    let input = tokens("delete the clip");

    let first = session.analyze(&input).unwrap();
    assert_eq!(first.reuse.outcome, CacheOutcome::Miss);
    assert_eq!(first.reuse.reused_tokens, 0);

    clock.advance(std::time::Duration::from_millis(400));
    let second = session.analyze(&input).unwrap();
    assert_eq!(second.reuse.outcome, CacheOutcome::FullHit);
    assert_eq!(second.reuse.reused_tokens, input.len());
    assert_eq!(second.reuse.total_tokens, input.len());
    assert!(Arc::ptr_eq(&first.analysis.result, &second.analysis.result));
    assert_eq!(first.analysis.forest, second.analysis.forest);
    assert_eq!(first.analysis.ranking, second.analysis.ranking);
    assert_eq!(session.parser().cache().stats().hits, 1);
}

#[test]
fn test_pruned_pipeline_prefers_high_priority() {
    let grammar = editing();
    let config = AnalyzerConfig::default().with_prune(Some(2));
    let analysis = Analyzer::new(&grammar, config).analyze(&tokens("delete the clip"));

    assert!(analysis.ambiguity_points.is_empty());
    assert_eq!(analysis.derivations.len(), 1);
    let (best, derivation) = analysis.best().unwrap();
    assert_eq!(
        grammar.rule(derivation.root().rule).action.as_deref(),
        Some("delete_clip")
    );
    assert_eq!(best.confidence, analysis.ranking.confidence);
}

#[test]
fn test_unparseable_request_reports_feedback() {
    let grammar = editing();
    let analysis = Analyzer::new(&grammar, AnalyzerConfig::default())
        .analyze(&tokens("delete tha clip"));

    assert!(!analysis.is_success());
    assert!(analysis.forest.is_empty());
    assert!(analysis.ranking.is_empty());
    assert!(analysis.needs_clarification());
    let feedback = analysis.error.unwrap().feedback();
    assert_eq!(feedback, "I didn't understand \"tha\". Did you mean 'the'?");
}
