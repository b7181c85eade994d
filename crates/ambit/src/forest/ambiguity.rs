//! Ambiguity points and their severity

use crate::forest::{Forest, ForestNode, NodeId};
use crate::grammar::{DEFAULT_PRIORITY, Grammar, RuleId};
use crate::text::{TextRange, TokenSpan};
use crate::token::Token;
use compact_str::CompactString;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// How hard an ambiguity is to resolve from grammar priorities alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum Severity {
    /// Priorities carry no information
    Low,
    /// One alternative holds the highest priority
    Medium,
    /// Several alternatives tie at the highest priority
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Classify the priorities of an Or node's alternatives
///
/// ```rust
/// use ambit::forest::{Severity, classify};
///
/// assert_eq!(classify(&[5, 5, 3]), Severity::High);
/// assert_eq!(classify(&[5, 3, 3]), Severity::Medium);
/// assert_eq!(classify(&[0, 0]), Severity::Low);
/// ```
#[must_use]
pub fn classify(priorities: &[i32]) -> Severity {
    if priorities.iter().all(|p| *p == DEFAULT_PRIORITY) {
        return Severity::Low;
    }
    let Some(max) = priorities.iter().max() else {
        return Severity::Low;
    };
    match priorities.iter().filter(|p| *p == max).count() {
        1 => Severity::Medium,
        _ => Severity::High,
    }
}

/// One competing reading at an ambiguity point
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct AlternativeInfo {
    pub node: NodeId,
    pub rule: RuleId,
    pub rule_name: CompactString,
    pub priority: i32,
    pub action: Option<CompactString>,
    pub description: CompactString,
}

/// A place in the forest where more than one derivation explains a span
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct AmbiguityPoint {
    pub node: NodeId,
    pub symbol: CompactString,
    pub span: TokenSpan,
    /// Character range of the span in the request
    pub text_range: TextRange,
    /// Token texts of the span joined by single spaces
    pub source_text: String,
    pub alternatives: Vec<AlternativeInfo>,
    pub severity: Severity,
}

impl AmbiguityPoint {
    #[must_use]
    pub fn alternative_count(&self) -> usize {
        self.alternatives.len()
    }

    /// Distinct action tags among the alternatives, in order
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = Vec::new();
        for action in self.alternatives.iter().filter_map(|a| a.action.as_deref()) {
            if !actions.contains(&action) {
                actions.push(action);
            }
        }
        actions
    }
}

pub(crate) fn collect(forest: &Forest, grammar: &Grammar, tokens: &[Token]) -> Vec<AmbiguityPoint> {
    forest
        .iter()
        .filter_map(|(id, node)| {
            let ForestNode::Or {
                symbol,
                span,
                alternatives,
            } = node
            else {
                return None;
            };
            let alternatives: Vec<AlternativeInfo> = alternatives
                .iter()
                .filter_map(|alt| match forest.node(*alt) {
                    Some(ForestNode::And {
                        rule,
                        priority,
                        action,
                        ..
                    }) => {
                        let definition = grammar.rule(*rule);
                        Some(AlternativeInfo {
                            node: *alt,
                            rule: *rule,
                            rule_name: definition.name.clone(),
                            priority: *priority,
                            action: action.clone(),
                            description: definition.description.clone(),
                        })
                    }
                    _ => None,
                })
                .collect();
            let priorities: Vec<i32> = alternatives.iter().map(|a| a.priority).collect();
            let source_text = tokens
                .get(span.start..span.end)
                .unwrap_or_default()
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            Some(AmbiguityPoint {
                node: id,
                symbol: grammar.symbol_name(*symbol).into(),
                span: *span,
                text_range: span.text_range(tokens),
                source_text,
                severity: classify(&priorities),
                alternatives,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(&[5, 5, 3]), Severity::High);
        assert_eq!(classify(&[5, 3, 3]), Severity::Medium);
        assert_eq!(classify(&[3, 5]), Severity::Medium);
        assert_eq!(classify(&[0, 0, 0]), Severity::Low);
        assert_eq!(classify(&[]), Severity::Low);
        assert_eq!(classify(&[-1, 0, 0]), Severity::High);
    }

    #[test]
    fn test_severity_order_and_display() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::Medium.to_string(), "medium");
    }
}
