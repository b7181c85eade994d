//! # Analysis Pipeline
//!
//! Runs tokens through the whole core: chart, forest, ambiguity points,
//! optional pruning and ranking.
//!
//! [`Analyzer`] analyses one request at a time against a fixed grammar.
//! [`Session`] does the same through an [`IncrementalParser`] and tracks
//! keystrokes for the [`DebouncePolicy`], for the live-typing path.

use crate::chart::{ChartConfig, ChartParser, Derivation, ParseResult};
use crate::error::ParseError;
use crate::forest::{AmbiguityPoint, Forest};
use crate::grammar::Grammar;
use crate::incremental::{
    CacheConfig, CacheError, Clock, DebounceDecision, DebouncePolicy, DebounceTracker,
    IncrementalParser, ReuseInfo, SystemClock,
};
use crate::score::{DiscourseContext, Ranking, ScoredParse, Scorer, ScoringConfig};
use crate::token::Token;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct AnalyzerConfig {
    pub chart: ChartConfig,
    pub scoring: ScoringConfig,
    /// Drop forest alternatives below this priority before ranking
    pub prune: Option<i32>,
}

impl AnalyzerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_chart(mut self, chart: ChartConfig) -> Self {
        self.chart = chart;
        self
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    #[must_use]
    pub const fn with_prune(mut self, min_priority: Option<i32>) -> Self {
        self.prune = min_priority;
        self
    }
}

/// Everything the core produces for one request
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Chart and extracted derivations
    pub result: Arc<ParseResult>,
    /// Packed forest, pruned when the analyzer prunes
    pub forest: Forest,
    /// Ambiguity points of `forest`
    pub ambiguity_points: Vec<AmbiguityPoint>,
    /// Derivations that were ranked; `ranking` indexes into this list
    pub derivations: Vec<Derivation>,
    pub ranking: Ranking,
    /// Why the parse failed, if it did
    pub error: Option<ParseError>,
    /// Set when some derivations were cut off by the derivation cap
    pub truncated: bool,
}

impl Analysis {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    #[must_use]
    pub fn best(&self) -> Option<(&ScoredParse, &Derivation)> {
        let best = self.ranking.best()?;
        Some((best, self.derivations.get(best.derivation)?))
    }

    #[must_use]
    pub const fn needs_clarification(&self) -> bool {
        self.ranking.needs_clarification
    }
}

/// Analysis pipeline over one grammar
#[derive(Debug)]
pub struct Analyzer<'g> {
    grammar: &'g Grammar,
    config: AnalyzerConfig,
    scorer: Scorer,
}

impl<'g> Analyzer<'g> {
    #[must_use]
    pub fn new(grammar: &'g Grammar, config: AnalyzerConfig) -> Self {
        let scorer = Scorer::new(config.scoring.clone());
        Self {
            grammar,
            config,
            scorer,
        }
    }

    /// Replace the scorer, e.g. one with extra factors
    #[must_use]
    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    #[must_use]
    pub const fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    #[must_use]
    pub const fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Analyse `tokens` without discourse context
    #[must_use]
    pub fn analyze(&self, tokens: &[Token]) -> Analysis {
        self.analyze_with(tokens, None)
    }

    #[must_use]
    pub fn analyze_with(&self, tokens: &[Token], discourse: Option<&DiscourseContext>) -> Analysis {
        let result = ChartParser::new(self.grammar, self.config.chart).parse_and_extract(tokens);
        self.assemble(tokens, Arc::new(result), discourse)
    }

    /// Build forest, ambiguity points and ranking for an existing parse
    #[must_use]
    pub fn assemble(
        &self,
        tokens: &[Token],
        result: Arc<ParseResult>,
        discourse: Option<&DiscourseContext>,
    ) -> Analysis {
        let grammar = self.grammar;
        let mut forest = Forest::build(grammar, &result.derivations, tokens.len());
        let mut truncated = result.truncated;

        let derivations = match self.config.prune {
            Some(min_priority) => {
                forest = forest.pruned(min_priority);
                let enumeration = forest.derivations(self.config.chart.max_derivations);
                truncated |= enumeration.truncated;
                enumeration.derivations
            }
            None => result.derivations.clone(),
        };

        let ambiguity_points = forest.ambiguity_points(grammar, tokens);
        let ranking = self.scorer.rank(grammar, tokens, &derivations, discourse);
        let error = result.chart.error(tokens);

        tracing::debug!(
            grammar = %grammar.key(),
            tokens = tokens.len(),
            success = result.is_success(),
            derivations = derivations.len(),
            ambiguity_points = ambiguity_points.len(),
            confidence = %ranking.confidence,
            "analysis complete"
        );

        Analysis {
            result,
            forest,
            ambiguity_points,
            derivations,
            ranking,
            error,
            truncated,
        }
    }
}

/// Result of a session analysis with its cache accounting
#[derive(Debug, Clone)]
pub struct SessionAnalysis {
    pub analysis: Analysis,
    pub reuse: ReuseInfo,
}

/// Live-typing session over one grammar
#[derive(Debug)]
pub struct Session<'g> {
    analyzer: Analyzer<'g>,
    parser: IncrementalParser,
    policy: DebouncePolicy,
    tracker: DebounceTracker,
    clock: Arc<dyn Clock>,
    discourse: Option<DiscourseContext>,
}

impl<'g> Session<'g> {
    /// Session on the wall clock
    #[must_use]
    pub fn new(grammar: &'g Grammar, config: AnalyzerConfig, cache: CacheConfig) -> Self {
        Self::with_clock(grammar, config, cache, Arc::new(SystemClock::new()))
    }

    #[must_use]
    pub fn with_clock(
        grammar: &'g Grammar,
        config: AnalyzerConfig,
        cache: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let parser = IncrementalParser::with_clock(config.chart, cache, Arc::clone(&clock));
        Self {
            analyzer: Analyzer::new(grammar, config),
            parser,
            policy: DebouncePolicy::default(),
            tracker: DebounceTracker::new(),
            clock,
            discourse: None,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: DebouncePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_discourse(mut self, discourse: DiscourseContext) -> Self {
        self.discourse = Some(discourse);
        self
    }

    pub fn set_discourse(&mut self, discourse: Option<DiscourseContext>) {
        self.discourse = discourse;
    }

    #[must_use]
    pub const fn analyzer(&self) -> &Analyzer<'g> {
        &self.analyzer
    }

    #[must_use]
    pub const fn parser(&self) -> &IncrementalParser {
        &self.parser
    }

    #[must_use]
    pub const fn policy(&self) -> &DebouncePolicy {
        &self.policy
    }

    /// Record a keystroke at the current time
    pub fn keystroke(&mut self) {
        self.tracker.record_keystroke(self.clock.now());
    }

    /// Debounce decision for pending keystrokes; `None` when nothing is
    /// pending
    #[must_use]
    pub fn poll(&self) -> Option<DebounceDecision> {
        if !self.tracker.has_pending() {
            return None;
        }
        Some(self.policy.decide(self.tracker.snapshot(self.clock.now())))
    }

    /// Analyse `tokens` through the session cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Corrupted`] when the cache is inconsistent.
    pub fn analyze(&mut self, tokens: &[Token]) -> Result<SessionAnalysis, CacheError> {
        let parse = self.parser.parse(self.analyzer.grammar(), tokens)?;
        self.tracker.record_parse(self.clock.now());
        let analysis = self
            .analyzer
            .assemble(tokens, parse.result, self.discourse.as_ref());
        Ok(SessionAnalysis {
            analysis,
            reuse: parse.reuse,
        })
    }
}
