//! # Incremental Parsing
//!
//! Reuse of parse results across successive edits of one request.
//!
//! ## Overview
//!
//! While the user types, the same request is parsed again and again with
//! small changes. [`IncrementalParser`] wraps the chart parser with a
//! [`SessionCache`]:
//!
//! - **Full hit**: the token fingerprints equal a cached entry; the cached
//!   chart and derivations are returned unchanged.
//! - **Partial hit**: a cached entry shares a leading run of tokens. The
//!   request is parsed again in full and the reusable prefix is reported
//!   together with a [`TokenDiff`]. Charts are never spliced.
//! - **Miss**: the request is parsed and stored.
//!
//! Fingerprints ignore token spans, so inserting whitespace before a word
//! still hits the cache.
//!
//! [`DebouncePolicy`] decides when a keystroke should trigger a parse at
//! all.
//!
//! ## Usage
//!
//! ```rust
//! use ambit::chart::ChartConfig;
//! use ambit::grammar::{GrammarBuilder, RuleSpec, word};
//! use ambit::incremental::{CacheConfig, CacheOutcome, IncrementalParser};
//! use ambit::token::{TagSet, tokenize_words};
//!
//! let grammar = GrammarBuilder::new("demo", "1")
//!     .start("S")
//!     .rule(RuleSpec::new("S", [word("undo"), word("that")]))
//!     .build()?;
//! let mut parser = IncrementalParser::new(ChartConfig::default(), CacheConfig::default());
//! let tokens = tokenize_words("undo that", |_| ("WORD".into(), TagSet::new()));
//!
//! let first = parser.parse(&grammar, &tokens)?;
//! assert_eq!(first.reuse.outcome, CacheOutcome::Miss);
//! let second = parser.parse(&grammar, &tokens)?;
//! assert_eq!(second.reuse.outcome, CacheOutcome::FullHit);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod clock;
pub mod debounce;
pub mod fingerprint;

pub use cache::{CacheConfig, CacheEntry, CacheError, CacheLookup, CacheStats, SessionCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use debounce::{DebounceDecision, DebouncePolicy, DebounceSnapshot, DebounceTracker, ParseReason};
pub use fingerprint::{Fingerprint, TokenDiff, common_prefix, common_suffix, fingerprint};

use crate::chart::{ChartConfig, ChartParser, ParseResult};
use crate::grammar::Grammar;
use crate::token::Token;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How the cache took part in a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum CacheOutcome {
    FullHit,
    PartialHit { reusable_prefix: usize },
    Miss,
    /// Caching is disabled
    Bypassed,
}

/// Reuse accounting for one incremental parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReuseInfo {
    pub outcome: CacheOutcome,
    /// Tokens whose work was reused or could have been
    pub reused_tokens: usize,
    pub total_tokens: usize,
    /// Difference to the best cached candidate on a partial hit
    pub diff: Option<TokenDiff>,
}

impl ReuseInfo {
    fn fresh(outcome: CacheOutcome, total_tokens: usize) -> Self {
        Self {
            outcome,
            reused_tokens: 0,
            total_tokens,
            diff: None,
        }
    }

    /// Share of tokens reused, in `[0, 1]`
    #[must_use]
    pub fn reuse_ratio(&self) -> f64 {
        if self.total_tokens == 0 {
            return match self.outcome {
                CacheOutcome::FullHit => 1.0,
                _ => 0.0,
            };
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.reused_tokens as f64 / self.total_tokens as f64;
        ratio
    }
}

/// A parse result with its reuse accounting
#[derive(Debug, Clone)]
pub struct IncrementalParse {
    pub result: Arc<ParseResult>,
    pub reuse: ReuseInfo,
}

/// Chart parser fronted by a [`SessionCache`]
#[derive(Debug)]
pub struct IncrementalParser {
    chart: ChartConfig,
    cache: SessionCache,
}

impl IncrementalParser {
    /// Parser with a wall-clock cache
    #[must_use]
    pub fn new(chart: ChartConfig, cache: CacheConfig) -> Self {
        Self::with_clock(chart, cache, Arc::new(SystemClock::new()))
    }

    #[must_use]
    pub fn with_clock(chart: ChartConfig, cache: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            chart,
            cache: SessionCache::new(cache, clock),
        }
    }

    #[must_use]
    pub const fn chart_config(&self) -> &ChartConfig {
        &self.chart
    }

    #[must_use]
    pub const fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SessionCache {
        &mut self.cache
    }

    /// Parse `tokens`, reusing cached work where possible.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Corrupted`] when the cache holds an entry that
    /// breaks its invariants.
    pub fn parse(&mut self, grammar: &Grammar, tokens: &[Token]) -> Result<IncrementalParse, CacheError> {
        let total = tokens.len();
        if !self.cache.config().incremental {
            tracing::debug!(grammar = %grammar.key(), "incremental caching disabled, parsing fully");
            return Ok(IncrementalParse {
                result: Arc::new(self.parse_fully(grammar, tokens)),
                reuse: ReuseInfo::fresh(CacheOutcome::Bypassed, total),
            });
        }

        let fingerprints = fingerprint(tokens);
        let reuse = match self.cache.lookup(grammar.key(), &fingerprints)? {
            CacheLookup::Full(result) => {
                return Ok(IncrementalParse {
                    result,
                    reuse: ReuseInfo {
                        outcome: CacheOutcome::FullHit,
                        reused_tokens: total,
                        total_tokens: total,
                        diff: None,
                    },
                });
            }
            CacheLookup::Partial { prefix, diff } => ReuseInfo {
                outcome: CacheOutcome::PartialHit {
                    reusable_prefix: prefix,
                },
                reused_tokens: prefix,
                total_tokens: total,
                diff: Some(diff),
            },
            CacheLookup::Miss => ReuseInfo::fresh(CacheOutcome::Miss, total),
        };

        let result = Arc::new(self.parse_fully(grammar, tokens));
        self.cache
            .insert(grammar.key(), tokens, fingerprints, Arc::clone(&result));
        Ok(IncrementalParse { result, reuse })
    }

    fn parse_fully(&self, grammar: &Grammar, tokens: &[Token]) -> ParseResult {
        ChartParser::new(grammar, self.chart).parse_and_extract(tokens)
    }
}
