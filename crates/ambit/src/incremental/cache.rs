//! # Session Cache
//!
//! Parse results keyed by grammar and token fingerprints.
//!
//! ## Overview
//!
//! Entries are grouped per grammar name. A lookup first purges expired
//! entries and drops entries built with another version of the grammar,
//! then compares fingerprint sequences: an identical sequence is a full
//! hit, otherwise the longest common prefix over all entries decides
//! between a partial hit and a miss.
//!
//! Eviction is by lowest `(hit_count, created_at)` once a grammar holds more
//! than `max_entries` entries.

use crate::chart::ParseResult;
use crate::grammar::GrammarKey;
use crate::incremental::clock::Clock;
use crate::incremental::fingerprint::{Fingerprint, TokenDiff, common_prefix};
use crate::token::Token;
use compact_str::CompactString;
use hashbrown::HashMap;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Cache state that breaks its own invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum CacheError {
    #[error("Corrupted cache entry for {grammar}: {reason}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(cache::corrupted)))]
    Corrupted { grammar: GrammarKey, reason: String },
}

/// Configuration for the session cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct CacheConfig {
    /// When false every call parses fully and nothing is stored
    pub incremental: bool,
    /// Maximum entries kept per grammar
    pub max_entries: usize,
    /// Entries older than this are purged on the next lookup
    pub ttl: Duration,
    /// Shortest common prefix that counts as a partial hit
    pub min_prefix: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            incremental: true,
            max_entries: 32,
            ttl: Duration::from_secs(300),
            min_prefix: 1,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_incremental(mut self, enabled: bool) -> Self {
        self.incremental = enabled;
        self
    }

    /// Set the per-grammar capacity; zero is treated as one
    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = if max_entries == 0 { 1 } else { max_entries };
        self
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub const fn with_min_prefix(mut self, min_prefix: usize) -> Self {
        self.min_prefix = min_prefix;
        self
    }
}

/// A cached parse
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub grammar: GrammarKey,
    pub tokens: Vec<Token>,
    pub fingerprints: Vec<Fingerprint>,
    pub result: Arc<ParseResult>,
    /// Clock time at insertion
    pub created_at: Duration,
    pub hit_count: u32,
    /// Insertion sequence number; breaks `created_at` ties
    sequence: u64,
}

impl CacheEntry {
    /// Record a cache hit
    pub fn record_hit(&mut self) {
        self.hit_count = self.hit_count.saturating_add(1);
    }

    fn eviction_key(&self) -> (u32, Duration, u64) {
        (self.hit_count, self.created_at, self.sequence)
    }

    fn validate(&self) -> Result<(), CacheError> {
        let corrupted = |reason: String| CacheError::Corrupted {
            grammar: self.grammar.clone(),
            reason,
        };
        if self.tokens.len() != self.fingerprints.len() {
            return Err(corrupted(format!(
                "{} tokens but {} fingerprints",
                self.tokens.len(),
                self.fingerprints.len()
            )));
        }
        if self.result.chart.token_count() != self.tokens.len() {
            return Err(corrupted(format!(
                "chart covers {} tokens, entry holds {}",
                self.result.chart.token_count(),
                self.tokens.len()
            )));
        }
        if self.result.chart.grammar() != &self.grammar {
            return Err(corrupted(format!(
                "chart was built with grammar {}",
                self.result.chart.grammar()
            )));
        }
        if self.result.chart.is_limit_exceeded() {
            return Err(corrupted("entry holds a chart that hit a resource limit".into()));
        }
        Ok(())
    }
}

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct CacheStats {
    pub hits: usize,
    pub partial_hits: usize,
    pub misses: usize,
    /// Entries removed to respect `max_entries`
    pub evictions: usize,
    /// Entries dropped because their grammar version changed
    pub invalidations: usize,
    /// Entries purged after their TTL
    pub expirations: usize,
    /// Results not stored because their chart hit a resource limit
    pub uncacheable: usize,
    /// Current number of entries
    pub entries: usize,
}

impl CacheStats {
    /// Share of lookups answered without parsing
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.partial_hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let ratio = self.hits as f64 / total as f64;
            ratio
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self {
            entries: self.entries,
            ..Self::default()
        };
    }
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub enum CacheLookup {
    /// Identical fingerprint sequence
    Full(Arc<ParseResult>),
    /// Best candidate shares `prefix` leading tokens
    Partial { prefix: usize, diff: TokenDiff },
    Miss,
}

/// Per-session parse cache. Not internally synchronized.
#[derive(Debug)]
pub struct SessionCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    entries: HashMap<CompactString, Vec<CacheEntry>, ahash::RandomState>,
    stats: CacheStats,
    next_sequence: u64,
}

impl SessionCache {
    #[must_use]
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            entries: HashMap::default(),
            stats: CacheStats::default(),
            next_sequence: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    #[must_use]
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Total number of entries across grammars
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries cached for grammar `name`, oldest first
    #[must_use]
    pub fn entries_for(&self, name: &str) -> &[CacheEntry] {
        self.entries.get(name).map_or(&[], Vec::as_slice)
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.entries = 0;
    }

    /// Remove entries older than the TTL
    pub fn purge_expired(&mut self) {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let mut purged = 0;
        for entries in self.entries.values_mut() {
            let before = entries.len();
            entries.retain(|entry| now.saturating_sub(entry.created_at) < ttl);
            purged += before - entries.len();
        }
        if purged > 0 {
            tracing::debug!(purged, "purged expired cache entries");
        }
        self.stats.expirations += purged;
        self.refresh_count();
    }

    /// Drop entries of `key.name` built with a version other than
    /// `key.version`
    pub fn invalidate_other_versions(&mut self, key: &GrammarKey) {
        let Some(entries) = self.entries.get_mut(key.name.as_str()) else {
            return;
        };
        let before = entries.len();
        entries.retain(|entry| entry.grammar.version == key.version);
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::debug!(grammar = %key, dropped, "grammar version changed, invalidated entries");
        }
        self.stats.invalidations += dropped;
        self.refresh_count();
    }

    /// Look up `fingerprints` for grammar `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Corrupted`] when a candidate entry breaks its
    /// invariants.
    pub fn lookup(&mut self, key: &GrammarKey, fingerprints: &[Fingerprint]) -> Result<CacheLookup, CacheError> {
        self.purge_expired();
        self.invalidate_other_versions(key);

        let min_prefix = self.config.min_prefix;
        let Some(entries) = self.entries.get_mut(key.name.as_str()) else {
            self.stats.misses += 1;
            return Ok(CacheLookup::Miss);
        };

        for entry in entries.iter() {
            entry.validate()?;
        }

        if let Some(entry) = entries
            .iter_mut()
            .find(|entry| entry.fingerprints.as_slice() == fingerprints)
        {
            entry.record_hit();
            self.stats.hits += 1;
            tracing::debug!(grammar = %key, hits = entry.hit_count, "cache hit");
            return Ok(CacheLookup::Full(Arc::clone(&entry.result)));
        }

        let mut best: Option<(usize, usize)> = None;
        for (index, entry) in entries.iter().enumerate() {
            let prefix = common_prefix(&entry.fingerprints, fingerprints);
            if best.is_none_or(|(_, longest)| prefix > longest) {
                best = Some((index, prefix));
            }
        }

        match best {
            Some((index, prefix)) if prefix >= min_prefix && prefix > 0 => {
                let diff = TokenDiff::between(&entries[index].fingerprints, fingerprints);
                self.stats.partial_hits += 1;
                tracing::debug!(grammar = %key, prefix, "partial cache hit");
                Ok(CacheLookup::Partial { prefix, diff })
            }
            _ => {
                self.stats.misses += 1;
                tracing::debug!(grammar = %key, "cache miss");
                Ok(CacheLookup::Miss)
            }
        }
    }

    /// Store a parse result. Results whose chart hit a resource limit are
    /// not stored; returns whether the result was stored.
    pub fn insert(
        &mut self,
        key: &GrammarKey,
        tokens: &[Token],
        fingerprints: Vec<Fingerprint>,
        result: Arc<ParseResult>,
    ) -> bool {
        if result.chart.is_limit_exceeded() {
            self.stats.uncacheable += 1;
            tracing::debug!(grammar = %key, "not caching a chart that hit a resource limit");
            return false;
        }

        let entry = CacheEntry {
            grammar: key.clone(),
            tokens: tokens.to_vec(),
            fingerprints,
            result,
            created_at: self.clock.now(),
            hit_count: 0,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        let entries = self.entries.entry(key.name.clone()).or_default();
        entries.retain(|existing| existing.fingerprints != entry.fingerprints);
        entries.push(entry);

        let capacity = self.config.max_entries.max(1);
        let mut evicted = 0;
        while entries.len() > capacity {
            let Some(victim) = entries
                .iter()
                .enumerate()
                .min_by_key(|(_, entry)| entry.eviction_key())
                .map(|(index, _)| index)
            else {
                break;
            };
            entries.remove(victim);
            evicted += 1;
        }
        if evicted > 0 {
            tracing::debug!(grammar = %key, evicted, "evicted cache entries");
        }
        self.stats.evictions += evicted;
        self.refresh_count();
        true
    }

    fn refresh_count(&mut self) {
        self.entries.retain(|_, entries| !entries.is_empty());
        self.stats.entries = self.len();
    }
}
