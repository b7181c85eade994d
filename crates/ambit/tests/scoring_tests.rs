//! Ranking, factor breakdowns and confidence

mod common;

use ambit::chart::{ChartConfig, Derivation, parse};
use ambit::grammar::Grammar;
use ambit::score::{
    Confidence, DiscourseContext, Factor, Scorer, ScoringConfig, ScoringContext,
};
use common::{arithmetic, editing, tokens};

fn action<'g>(grammar: &'g Grammar, derivation: &Derivation) -> Option<&'g str> {
    grammar.rule(derivation.root().rule).action.as_deref()
}

#[test]
fn test_scores_are_bounded_and_sorted() {
    let grammar = arithmetic();
    let input = tokens("one plus one plus one plus one");
    let result = parse(&grammar, &input, &ChartConfig::default());
    let ranking = Scorer::default().rank(&grammar, &input, &result.derivations, None);

    assert_eq!(ranking.len(), 5);
    for (index, parse) in ranking.parses.iter().enumerate() {
        assert_eq!(parse.rank, index + 1);
        assert!((0.0..=1.0).contains(&parse.score));
        assert_eq!(parse.confidence, ranking.confidence);
    }
    for pair in ranking.parses.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    // Every bracketing applies the same rules, so all scores tie.
    assert_eq!(ranking.confidence, Confidence::Ambiguous);
    assert!(ranking.needs_clarification);
}

#[test]
fn test_safety_prefers_non_destructive_reading() {
    let grammar = editing();
    let input = tokens("delete the clip");
    let result = parse(&grammar, &input, &ChartConfig::default());
    let ranking = Scorer::default().rank(&grammar, &input, &result.derivations, None);

    let best = ranking.best().unwrap();
    assert_eq!(action(&grammar, &result.derivations[best.derivation]), Some("mute_clip"));
    assert_eq!(best.breakdown.get("safety").unwrap().value, 1.0);
    assert!((best.score - 0.633).abs() < 0.01);

    let runner_up = &ranking.parses[1];
    assert_eq!(runner_up.breakdown.get("safety").unwrap().value, 0.0);
    assert!((runner_up.score - 0.5).abs() < 1e-9);

    assert_eq!(ranking.confidence, Confidence::Medium);
    assert!(!ranking.needs_clarification);
    assert!(ranking.margin().unwrap() > 0.1);
}

#[test]
fn test_breakdown_sums_to_score() {
    let grammar = editing();
    let input = tokens("delete the clip");
    let result = parse(&grammar, &input, &ChartConfig::default());
    let ranking = Scorer::default().rank(&grammar, &input, &result.derivations, None);

    for parse in &ranking.parses {
        assert_eq!(parse.breakdown.factors.len(), 6);
        assert!((parse.breakdown.raw_total() - parse.score).abs() < 1e-9);
    }
}

#[test]
fn test_coherence_follows_discourse() {
    let grammar = editing();
    let input = tokens("delete the clip");
    let result = parse(&grammar, &input, &ChartConfig::default());
    let discourse = DiscourseContext::new().with_action("delete_clip");
    let ranking = Scorer::default().rank(&grammar, &input, &result.derivations, Some(&discourse));

    for parse in &ranking.parses {
        let coherence = parse.breakdown.get("coherence").unwrap().value;
        match action(&grammar, &result.derivations[parse.derivation]) {
            Some("delete_clip") => assert_eq!(coherence, 1.0),
            Some("mute_clip") => assert_eq!(coherence, 0.0),
            other => panic!("unexpected action {other:?}"),
        }
    }
}

#[test]
fn test_vague_action_lowers_specificity() {
    let grammar = editing();
    let input = tokens("make it brighter");
    let result = parse(&grammar, &input, &ChartConfig::default());
    let ranking = Scorer::default().rank(&grammar, &input, &result.derivations, None);

    assert_eq!(ranking.len(), 1);
    let only = ranking.best().unwrap();
    assert_eq!(only.breakdown.get("specificity").unwrap().value, 0.0);
    assert_eq!(ranking.margin(), None);
}

struct PrefersMute;

impl Factor for PrefersMute {
    fn name(&self) -> &str {
        "prefers_mute"
    }

    fn evaluate(&self, derivation: &Derivation, context: &ScoringContext<'_>) -> f64 {
        match action(context.grammar, derivation) {
            Some("mute_clip") => 1.0,
            _ => 0.0,
        }
    }
}

#[test]
fn test_custom_factor_is_reported() {
    let grammar = editing();
    let input = tokens("delete the clip");
    let result = parse(&grammar, &input, &ChartConfig::default());
    let scorer = Scorer::new(ScoringConfig::default()).with_factor(PrefersMute, 0.5);
    let ranking = scorer.rank(&grammar, &input, &result.derivations, None);

    let best = ranking.best().unwrap();
    assert_eq!(best.breakdown.factors.len(), 7);
    assert_eq!(best.breakdown.get("prefers_mute").unwrap().value, 1.0);
    // 0.633 + 0.5 clamps to the top of the range.
    assert_eq!(best.score, 1.0);
    assert!(ranking.parses.iter().all(|p| (0.0..=1.0).contains(&p.score)));
}

#[test]
fn test_no_derivations_needs_clarification() {
    let grammar = editing();
    let input = tokens("delete");
    let ranking = Scorer::default().rank(&grammar, &input, &[], None);
    assert!(ranking.is_empty());
    assert!(ranking.needs_clarification);
    assert_eq!(ranking.confidence, Confidence::Low);
}
