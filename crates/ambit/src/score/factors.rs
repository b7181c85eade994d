//! Scoring factors.
//!
//! Each factor maps a derivation to a value in `[0, 1]`. The scorer weighs
//! and sums them; callers can add their own through [`Factor`].

use crate::chart::{Derivation, DerivationChild};
use crate::grammar::{Grammar, RhsSymbol, Terminal};
use crate::score::config::ScoringConfig;
use crate::token::Token;
use compact_str::CompactString;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Neutral value for factors that have nothing to measure
pub const NEUTRAL: f64 = 0.5;

/// Recent conversational state used by the coherence factor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct DiscourseContext {
    /// Action tags applied recently, most recent last
    pub recent_actions: Vec<CompactString>,
    /// Entity currently in focus, if any
    pub focus: Option<CompactString>,
}

impl DiscourseContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<CompactString>) -> Self {
        self.recent_actions.push(action.into());
        self
    }

    #[must_use]
    pub fn with_focus(mut self, focus: impl Into<CompactString>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    #[must_use]
    pub fn mentions(&self, action: &str) -> bool {
        self.recent_actions.iter().any(|a| a == action)
    }
}

/// Everything a factor may look at besides the derivation itself
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub grammar: &'a Grammar,
    pub tokens: &'a [Token],
    pub config: &'a ScoringConfig,
    pub discourse: Option<&'a DiscourseContext>,
}

/// A named, independent scoring heuristic
pub trait Factor: Send + Sync {
    /// Name reported in score breakdowns
    fn name(&self) -> &str;

    /// Value in `[0, 1]`; higher is better. Out-of-range values are clamped
    /// by the scorer.
    fn evaluate(&self, derivation: &Derivation, context: &ScoringContext<'_>) -> f64;
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64
}

/// Actions of every action-bearing rule application, in pre-order
fn actions<'g>(derivation: &Derivation, grammar: &'g Grammar) -> Vec<&'g str> {
    derivation
        .nodes()
        .into_iter()
        .filter_map(|node| grammar.rule(node.rule).action.as_deref())
        .collect()
}

/// Mean applied-rule priority, normalized over the grammar's priority range
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityFactor;

impl Factor for PriorityFactor {
    fn name(&self) -> &str {
        "priority"
    }

    fn evaluate(&self, derivation: &Derivation, context: &ScoringContext<'_>) -> f64 {
        let (low, high) = context.grammar.priority_range();
        if high <= low {
            return NEUTRAL;
        }
        let rules = derivation.rules();
        if rules.is_empty() {
            return NEUTRAL;
        }
        let sum: f64 = rules
            .iter()
            .map(|rule| f64::from(context.grammar.rule(*rule).priority))
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / rules.len() as f64;
        (mean - f64::from(low)) / (f64::from(high) - f64::from(low))
    }
}

/// Fraction of consumed tokens matched by a literal word
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitnessFactor;

impl Factor for ExplicitnessFactor {
    fn name(&self) -> &str {
        "explicitness"
    }

    fn evaluate(&self, derivation: &Derivation, context: &ScoringContext<'_>) -> f64 {
        let mut leaves = 0;
        let mut literal = 0;
        for node in derivation.nodes() {
            let rule = context.grammar.rule(node.rule);
            for (child, symbol) in node.children.iter().zip(rule.rhs.iter()) {
                if let DerivationChild::Leaf(_) = child {
                    leaves += 1;
                    if matches!(symbol, RhsSymbol::Terminal(Terminal::Word(_))) {
                        literal += 1;
                    }
                }
            }
        }
        if leaves == 0 {
            NEUTRAL
        } else {
            ratio(literal, leaves)
        }
    }
}

/// One minus the fraction of actions that destroy content
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyFactor;

impl Factor for SafetyFactor {
    fn name(&self) -> &str {
        "safety"
    }

    fn evaluate(&self, derivation: &Derivation, context: &ScoringContext<'_>) -> f64 {
        let actions = actions(derivation, context.grammar);
        if actions.is_empty() {
            return 1.0;
        }
        let destructive = actions
            .iter()
            .filter(|a| context.config.is_destructive(a))
            .count();
        1.0 - ratio(destructive, actions.len())
    }
}

/// One minus the fraction of vague actions
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecificityFactor;

impl Factor for SpecificityFactor {
    fn name(&self) -> &str {
        "specificity"
    }

    fn evaluate(&self, derivation: &Derivation, context: &ScoringContext<'_>) -> f64 {
        let actions = actions(derivation, context.grammar);
        if actions.is_empty() {
            return 1.0;
        }
        let vague = actions.iter().filter(|a| context.config.is_vague(a)).count();
        1.0 - ratio(vague, actions.len())
    }
}

/// Penalizes readings that assume elided material
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsimonyFactor;

impl Factor for ParsimonyFactor {
    fn name(&self) -> &str {
        "parsimony"
    }

    fn evaluate(&self, derivation: &Derivation, context: &ScoringContext<'_>) -> f64 {
        let elisions = derivation
            .nodes()
            .into_iter()
            .filter(|node| context.grammar.rule(node.rule).is_elision())
            .count();
        #[allow(clippy::cast_precision_loss)]
        let elisions = elisions as f64;
        1.0 / (1.0 + elisions)
    }
}

/// Fraction of actions that continue recent discourse
#[derive(Debug, Clone, Copy, Default)]
pub struct CoherenceFactor;

impl Factor for CoherenceFactor {
    fn name(&self) -> &str {
        "coherence"
    }

    fn evaluate(&self, derivation: &Derivation, context: &ScoringContext<'_>) -> f64 {
        let Some(discourse) = context.discourse else {
            return NEUTRAL;
        };
        if discourse.recent_actions.is_empty() {
            return NEUTRAL;
        }
        let actions = actions(derivation, context.grammar);
        if actions.is_empty() {
            return NEUTRAL;
        }
        let continued = actions.iter().filter(|a| discourse.mentions(a)).count();
        ratio(continued, actions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartConfig, parse};
    use crate::grammar::{GrammarBuilder, RuleSpec, kind, nt, word};
    use crate::token::{TagSet, tokenize_words};

    fn grammar() -> Grammar {
        GrammarBuilder::new("edits", "1")
            .start("Command")
            .rule(
                RuleSpec::new("Command", [word("delete"), nt("Target")])
                    .priority(4)
                    .action("delete_selection"),
            )
            .rule(RuleSpec::new("Command", [kind("VERB"), nt("Target")]).action("adjust"))
            .rule(RuleSpec::new("Target", [nt("Det"), kind("NOUN")]))
            .rule(RuleSpec::new("Det", []))
            .build()
            .unwrap()
    }

    fn tokens() -> Vec<Token> {
        tokenize_words("delete clip", |w| {
            let kind = if w == "delete" { "VERB" } else { "NOUN" };
            (kind.into(), TagSet::new())
        })
    }

    fn evaluate_all(factor: &dyn Factor, discourse: Option<&DiscourseContext>) -> Vec<f64> {
        let grammar = grammar();
        let tokens = tokens();
        let config = ScoringConfig::default();
        let result = parse(&grammar, &tokens, &ChartConfig::default());
        assert_eq!(result.derivations.len(), 2);
        let context = ScoringContext {
            grammar: &grammar,
            tokens: &tokens,
            config: &config,
            discourse,
        };
        result
            .derivations
            .iter()
            .map(|d| factor.evaluate(d, &context))
            .collect()
    }

    #[test]
    fn test_priority() {
        // Mean of [4, 0, 0] and [0, 0, 0] over the range 0..=4.
        let values = evaluate_all(&PriorityFactor, None);
        assert!((values[0] - 1.0 / 3.0).abs() < 1e-9);
        assert!(values[1].abs() < 1e-9);
    }

    #[test]
    fn test_explicitness() {
        let values = evaluate_all(&ExplicitnessFactor, None);
        assert!((values[0] - 0.5).abs() < 1e-9);
        assert!(values[1].abs() < 1e-9);
    }

    #[test]
    fn test_safety_and_specificity() {
        let safety = evaluate_all(&SafetyFactor, None);
        assert!(safety[0].abs() < 1e-9);
        assert!((safety[1] - 1.0).abs() < 1e-9);

        let specificity = evaluate_all(&SpecificityFactor, None);
        assert!((specificity[0] - 1.0).abs() < 1e-9);
        assert!(specificity[1].abs() < 1e-9);
    }

    #[test]
    fn test_parsimony_counts_elisions() {
        let values = evaluate_all(&ParsimonyFactor, None);
        assert!((values[0] - 0.5).abs() < 1e-9);
        assert!((values[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_coherence() {
        let neutral = evaluate_all(&CoherenceFactor, None);
        assert!((neutral[0] - NEUTRAL).abs() < 1e-9);

        let discourse = DiscourseContext::new().with_action("adjust");
        let values = evaluate_all(&CoherenceFactor, Some(&discourse));
        assert!(values[0].abs() < 1e-9);
        assert!((values[1] - 1.0).abs() < 1e-9);
    }
}
