//! Configuration for the chart parser

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Safety caps for chart construction and derivation extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ChartConfig {
    /// Maximum number of items in a single chart set
    pub max_items_per_set: usize,

    /// Maximum number of items across the whole chart
    pub max_total_items: usize,

    /// Maximum number of derivations extracted from a successful chart
    pub max_derivations: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            max_items_per_set: 10_000,
            max_total_items: 200_000,
            max_derivations: 64,
        }
    }
}

impl ChartConfig {
    /// Create a new configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_max_items_per_set(mut self, limit: usize) -> Self {
        self.max_items_per_set = limit;
        self
    }

    #[must_use]
    pub const fn with_max_total_items(mut self, limit: usize) -> Self {
        self.max_total_items = limit;
        self
    }

    /// Set the derivation cap; zero is treated as one
    #[must_use]
    pub const fn with_max_derivations(mut self, limit: usize) -> Self {
        self.max_derivations = if limit == 0 { 1 } else { limit };
        self
    }
}
