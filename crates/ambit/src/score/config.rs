//! Scoring weights and confidence thresholds

use compact_str::CompactString;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Weight of each built-in factor in the total score
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ScoringWeights {
    pub priority: f64,
    pub explicitness: f64,
    pub safety: f64,
    pub specificity: f64,
    pub parsimony: f64,
    pub coherence: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            priority: 0.30,
            explicitness: 0.15,
            safety: 0.20,
            specificity: 0.15,
            parsimony: 0.10,
            coherence: 0.10,
        }
    }
}

impl ScoringWeights {
    #[must_use]
    pub const fn with_priority(mut self, weight: f64) -> Self {
        self.priority = weight;
        self
    }

    #[must_use]
    pub const fn with_explicitness(mut self, weight: f64) -> Self {
        self.explicitness = weight;
        self
    }

    #[must_use]
    pub const fn with_safety(mut self, weight: f64) -> Self {
        self.safety = weight;
        self
    }

    #[must_use]
    pub const fn with_specificity(mut self, weight: f64) -> Self {
        self.specificity = weight;
        self
    }

    #[must_use]
    pub const fn with_parsimony(mut self, weight: f64) -> Self {
        self.parsimony = weight;
        self
    }

    #[must_use]
    pub const fn with_coherence(mut self, weight: f64) -> Self {
        self.coherence = weight;
        self
    }

    /// Sum of all weights
    #[must_use]
    pub fn total(&self) -> f64 {
        self.priority
            + self.explicitness
            + self.safety
            + self.specificity
            + self.parsimony
            + self.coherence
    }
}

/// Configuration for the [`Scorer`](crate::score::Scorer)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ScoringConfig {
    pub weights: ScoringWeights,

    /// Minimum top score for high confidence
    pub high_threshold: f64,

    /// Minimum lead over the runner-up for high confidence
    pub high_margin: f64,

    /// Top two scores closer than this are ambiguous
    pub ambiguity_margin: f64,

    /// Minimum top score for medium confidence
    pub medium_threshold: f64,

    /// Below this top score the request needs clarification
    pub min_acceptable: f64,

    /// Action tags that destroy user content. An action matches an entry
    /// when it equals it or starts with it followed by `_`.
    pub destructive_actions: Vec<CompactString>,

    /// Action tags that leave the requested change underspecified
    pub vague_actions: Vec<CompactString>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            high_threshold: 0.75,
            high_margin: 0.15,
            ambiguity_margin: 0.05,
            medium_threshold: 0.5,
            min_acceptable: 0.4,
            destructive_actions: ["delete", "remove", "clear", "discard", "reset", "overwrite"]
                .into_iter()
                .map(CompactString::from)
                .collect(),
            vague_actions: ["adjust", "change", "modify", "improve", "fix"]
                .into_iter()
                .map(CompactString::from)
                .collect(),
        }
    }
}

impl ScoringConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub const fn with_high_threshold(mut self, threshold: f64) -> Self {
        self.high_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_high_margin(mut self, margin: f64) -> Self {
        self.high_margin = margin;
        self
    }

    #[must_use]
    pub const fn with_ambiguity_margin(mut self, margin: f64) -> Self {
        self.ambiguity_margin = margin;
        self
    }

    #[must_use]
    pub const fn with_medium_threshold(mut self, threshold: f64) -> Self {
        self.medium_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_min_acceptable(mut self, threshold: f64) -> Self {
        self.min_acceptable = threshold;
        self
    }

    #[must_use]
    pub fn with_destructive_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.destructive_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_vague_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.vague_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn is_destructive(&self, action: &str) -> bool {
        matches_action(&self.destructive_actions, action)
    }

    #[must_use]
    pub fn is_vague(&self, action: &str) -> bool {
        matches_action(&self.vague_actions, action)
    }
}

fn matches_action(list: &[CompactString], action: &str) -> bool {
    list.iter().any(|entry| {
        action == entry.as_str()
            || action
                .strip_prefix(entry.as_str())
                .is_some_and(|rest| rest.starts_with('_'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((ScoringWeights::default().total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_action_matching() {
        let config = ScoringConfig::default();
        assert!(config.is_destructive("delete"));
        assert!(config.is_destructive("delete_selection"));
        assert!(!config.is_destructive("deleted"));
        assert!(config.is_vague("adjust_brightness"));
        assert!(!config.is_vague("set_brightness"));
    }
}
