//! Property-based tests over generated requests and grammars
//!
//! These tests use proptest to generate token sequences (valid and invalid)
//! and random rule priorities, and check the invariants of every stage.

#![cfg(test)]

mod common;

use ambit::analysis::{Analyzer, AnalyzerConfig};
use ambit::chart::{ChartConfig, ChartOutcome, parse};
use ambit::forest::{Forest, ForestNode};
use ambit::grammar::{Grammar, GrammarBuilder, RuleSpec, nt, word};
use ambit::incremental::{Fingerprint, fingerprint};
use ambit::text::{TextRange, TextSize};
use ambit::token::Token;
use common::{arithmetic, tokens};
use proptest::prelude::*;

fn arithmetic_words() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(vec!["one", "plus"]), 0..8)
}

/// Strictly alternating `one plus one ...` with `operands` operands
fn well_formed(operands: usize) -> String {
    vec!["one"; operands].join(" plus ")
}

fn ranked_grammar(priorities: &[i32]) -> Grammar {
    let mut builder = GrammarBuilder::new("ranked", "1").start("S");
    for (index, priority) in priorities.iter().enumerate() {
        builder = builder.rule(
            RuleSpec::new("S", [nt("V"), word("that")])
                .named(format!("s{index}"))
                .priority(*priority),
        );
    }
    builder
        .rule(RuleSpec::new("V", [word("undo")]))
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_parsing_is_deterministic(words in arithmetic_words()) {
        let grammar = arithmetic();
        let input = tokens(&words.join(" "));
        let first = parse(&grammar, &input, &ChartConfig::default());
        let second = parse(&grammar, &input, &ChartConfig::default());
        prop_assert_eq!(&first, &second);

        let forest_a = Forest::build(&grammar, &first.derivations, input.len());
        let forest_b = Forest::build(&grammar, &second.derivations, input.len());
        prop_assert_eq!(forest_a, forest_b);
    }

    #[test]
    fn prop_success_matches_well_formedness(words in arithmetic_words()) {
        let grammar = arithmetic();
        let text = words.join(" ");
        let input = tokens(&text);
        let result = parse(&grammar, &input, &ChartConfig::default());
        let expected = words.len() % 2 == 1 && text == well_formed(words.len().div_ceil(2));
        prop_assert_eq!(result.is_success(), expected);
        if let ChartOutcome::Failed { position, .. } = result.chart.outcome() {
            prop_assert!(*position <= input.len());
        }
    }

    #[test]
    fn prop_derivations_are_sound(operands in 1usize..6) {
        let grammar = arithmetic();
        let input = tokens(&well_formed(operands));
        let result = parse(&grammar, &input, &ChartConfig::default());
        prop_assert!(result.is_success());
        for derivation in &result.derivations {
            prop_assert!(derivation.is_sound(&grammar, input.len()));
        }

        let forest = Forest::build(&grammar, &result.derivations, input.len());
        prop_assert!(forest.check_invariants());
        let catalan = [1u64, 1, 2, 5, 14, 42];
        prop_assert_eq!(forest.stats().derivations, catalan[operands - 1]);
    }

    #[test]
    fn prop_scores_are_bounded(operands in 1usize..6) {
        let grammar = arithmetic();
        let input = tokens(&well_formed(operands));
        let analysis = Analyzer::new(&grammar, AnalyzerConfig::default()).analyze(&input);
        for parse in &analysis.ranking.parses {
            prop_assert!((0.0..=1.0).contains(&parse.score));
        }
        for pair in analysis.ranking.parses.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn prop_pruning_never_degenerates(
        priorities in prop::collection::vec(-3i32..6, 2..6),
        threshold in -5i32..8,
    ) {
        let grammar = ranked_grammar(&priorities);
        let input = tokens("undo that");
        let result = parse(&grammar, &input, &ChartConfig::default());
        let forest = Forest::build(&grammar, &result.derivations, input.len());
        let pruned = forest.pruned(threshold);

        prop_assert!(pruned.check_invariants());
        prop_assert!(pruned.root().is_some());
        for node in pruned.nodes() {
            if let ForestNode::Or { alternatives, .. } = node {
                prop_assert!(alternatives.len() >= 2);
            }
        }
        let survivors = priorities.iter().filter(|p| **p >= threshold).count().max(1);
        prop_assert_eq!(pruned.derivations(16).derivations.len(), survivors);
    }

    #[test]
    fn prop_fingerprints_ignore_offsets(
        words in prop::collection::vec("[a-z]{1,6}", 1..6),
        shift in 0u32..50,
    ) {
        let at = |offset: u32| -> Vec<Token> {
            let mut position = offset;
            words
                .iter()
                .map(|w| {
                    let len = u32::try_from(w.len()).unwrap();
                    let span = TextRange::new(TextSize::from(position), TextSize::from(position + len));
                    position += len + 1;
                    Token::new(w.as_str(), "WORD", span)
                })
                .collect()
        };
        let original: Vec<Fingerprint> = fingerprint(&at(0));
        let shifted: Vec<Fingerprint> = fingerprint(&at(shift));
        prop_assert_eq!(original, shifted);
    }
}
