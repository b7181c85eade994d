//! # Parse Scoring
//!
//! Ranks competing derivations and decides whether the user must be asked.
//!
//! ## Overview
//!
//! Every derivation is scored by a weighted sum of independent [`Factor`]s,
//! clamped to `[0, 1]`. The built-in factors are:
//!
//! | factor       | measures                                            |
//! |--------------|-----------------------------------------------------|
//! | priority     | mean rule priority, normalized over the grammar     |
//! | explicitness | share of tokens matched by literal words            |
//! | safety       | share of actions that do not destroy content        |
//! | specificity  | share of actions that are not vague                 |
//! | parsimony    | `1 / (1 + elisions)`                                |
//! | coherence    | share of actions continuing the recent discourse    |
//!
//! The ranking sorts scores in descending order (ties keep derivation
//! order) and derives one [`Confidence`] for the whole ranking from the top
//! score and its lead over the runner-up. Each [`ScoredParse`] carries a
//! per-factor [`ScoreBreakdown`] so diagnostics can explain the winner.

pub mod config;
pub mod factors;

pub use config::{ScoringConfig, ScoringWeights};
pub use factors::{
    CoherenceFactor, DiscourseContext, ExplicitnessFactor, Factor, ParsimonyFactor,
    PriorityFactor, SafetyFactor, ScoringContext, SpecificityFactor,
};

use crate::chart::Derivation;
use crate::grammar::Grammar;
use crate::token::Token;
use compact_str::CompactString;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// How sure the ranking is about its winner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum Confidence {
    High,
    Medium,
    Low,
    /// The top two readings are too close to call
    Ambiguous,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Ambiguous => "ambiguous",
        })
    }
}

/// One factor's contribution to a score
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct FactorScore {
    pub name: CompactString,
    /// Factor value in `[0, 1]`
    pub value: f64,
    pub weight: f64,
}

impl FactorScore {
    #[must_use]
    pub fn contribution(&self) -> f64 {
        self.value * self.weight
    }
}

/// Per-factor explanation of a score
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ScoreBreakdown {
    pub factors: Vec<FactorScore>,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FactorScore> {
        self.factors.iter().find(|f| f.name == name)
    }

    /// Weighted sum before clamping
    #[must_use]
    pub fn raw_total(&self) -> f64 {
        self.factors.iter().map(FactorScore::contribution).sum()
    }
}

/// A ranked derivation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ScoredParse {
    /// 1-based rank
    pub rank: usize,
    /// Index into the scored derivation list
    pub derivation: usize,
    pub score: f64,
    /// Confidence of the ranking as a whole
    pub confidence: Confidence,
    pub breakdown: ScoreBreakdown,
    pub needs_clarification: bool,
}

/// Scored derivations, best first
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Ranking {
    pub parses: Vec<ScoredParse>,
    pub confidence: Confidence,
    pub needs_clarification: bool,
}

impl Default for Ranking {
    fn default() -> Self {
        Self {
            parses: Vec::new(),
            confidence: Confidence::Low,
            needs_clarification: true,
        }
    }
}

impl Ranking {
    #[must_use]
    pub fn best(&self) -> Option<&ScoredParse> {
        self.parses.first()
    }

    /// Lead of the best parse over the runner-up; `None` with fewer than two
    #[must_use]
    pub fn margin(&self) -> Option<f64> {
        match self.parses.as_slice() {
            [first, second, ..] => Some(first.score - second.score),
            _ => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parses.is_empty()
    }
}

/// Weighted multi-factor scorer
pub struct Scorer {
    config: ScoringConfig,
    factors: Vec<(Box<dyn Factor>, f64)>,
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scorer")
            .field("config", &self.config)
            .field(
                "factors",
                &self
                    .factors
                    .iter()
                    .map(|(factor, weight)| (factor.name().to_string(), *weight))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl Scorer {
    /// Scorer with the six built-in factors weighted by `config.weights`
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        let weights = config.weights;
        let factors: Vec<(Box<dyn Factor>, f64)> = vec![
            (Box::new(PriorityFactor), weights.priority),
            (Box::new(ExplicitnessFactor), weights.explicitness),
            (Box::new(SafetyFactor), weights.safety),
            (Box::new(SpecificityFactor), weights.specificity),
            (Box::new(ParsimonyFactor), weights.parsimony),
            (Box::new(CoherenceFactor), weights.coherence),
        ];
        Self { config, factors }
    }

    /// Add a custom factor
    #[must_use]
    pub fn with_factor(mut self, factor: impl Factor + 'static, weight: f64) -> Self {
        self.factors.push((Box::new(factor), weight));
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one derivation
    #[must_use]
    pub fn score_one(&self, derivation: &Derivation, context: &ScoringContext<'_>) -> (f64, ScoreBreakdown) {
        let factors: Vec<FactorScore> = self
            .factors
            .iter()
            .map(|(factor, weight)| {
                let value = factor.evaluate(derivation, context);
                FactorScore {
                    name: factor.name().into(),
                    value: if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) },
                    weight: *weight,
                }
            })
            .collect();
        let breakdown = ScoreBreakdown { factors };
        let total = breakdown.raw_total();
        let score = if total.is_nan() { 0.0 } else { total.clamp(0.0, 1.0) };
        (score, breakdown)
    }

    /// Score and rank `derivations`
    #[must_use]
    pub fn rank(
        &self,
        grammar: &Grammar,
        tokens: &[Token],
        derivations: &[Derivation],
        discourse: Option<&DiscourseContext>,
    ) -> Ranking {
        let context = ScoringContext {
            grammar,
            tokens,
            config: &self.config,
            discourse,
        };

        let mut scored: Vec<(usize, f64, ScoreBreakdown)> = derivations
            .iter()
            .enumerate()
            .map(|(index, derivation)| {
                let (score, breakdown) = self.score_one(derivation, &context);
                (index, score, breakdown)
            })
            .collect();
        // Stable: equal scores keep derivation order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let top = scored.first().map(|s| s.1);
        let runner_up = scored.get(1).map(|s| s.1);
        let Some(top) = top else {
            return Ranking::default();
        };
        let confidence = self.confidence(top, runner_up);
        let needs_clarification =
            confidence == Confidence::Ambiguous || top < self.config.min_acceptable;

        tracing::debug!(
            parses = scored.len(),
            top,
            %confidence,
            needs_clarification,
            "ranked parses"
        );

        let parses = scored
            .into_iter()
            .enumerate()
            .map(|(position, (derivation, score, breakdown))| ScoredParse {
                rank: position + 1,
                derivation,
                score,
                confidence,
                breakdown,
                needs_clarification,
            })
            .collect();

        Ranking {
            parses,
            confidence,
            needs_clarification,
        }
    }

    /// Confidence from the top score and the runner-up, if any
    #[must_use]
    pub fn confidence(&self, top: f64, runner_up: Option<f64>) -> Confidence {
        let config = &self.config;
        let lead = runner_up.map(|second| top - second);
        if lead.is_some_and(|lead| lead <= config.ambiguity_margin) {
            return Confidence::Ambiguous;
        }
        if top >= config.high_threshold && lead.is_none_or(|lead| lead >= config.high_margin) {
            Confidence::High
        } else if top >= config.medium_threshold {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}
