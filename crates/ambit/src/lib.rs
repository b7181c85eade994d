//! # Ambit
//!
//! Ambiguity-preserving parsing of natural-language edit requests.
//!
//! ## Overview
//!
//! Ambit turns a tagged token stream into every reading a grammar allows,
//! keeps those readings side by side instead of guessing early, and ranks
//! them so that a caller can either act on a clear winner or ask the user.
//!
//! - **Chart parsing**: Earley construction over ambiguous grammars with
//!   nullable rules and item caps
//! - **Packed forests**: shared Or/And/Leaf arena with classified ambiguity
//!   points and priority pruning
//! - **Scoring**: six weighted factors, confidence and a clarification flag
//! - **Incremental sessions**: fingerprint cache and debounce policy for
//!   live typing
//!
//! ## Quick Start
//!
//! Two equally preferred readings of "make it brighter" stay ambiguous:
//!
//! ```rust
//! use ambit::analysis::{Analyzer, AnalyzerConfig};
//! use ambit::forest::Severity;
//! use ambit::grammar::{GrammarBuilder, RuleSpec, nt, word};
//! use ambit::score::Confidence;
//! use ambit::token::{TagSet, tokenize_words};
//!
//! let grammar = GrammarBuilder::new("edits", "1")
//!     .start("Command")
//!     .rule(
//!         RuleSpec::new("Command", [word("make"), nt("Target"), nt("Quality")])
//!             .priority(5)
//!             .action("adjust_brightness"),
//!     )
//!     .rule(
//!         RuleSpec::new("Command", [word("make"), nt("Target"), nt("Quality")])
//!             .priority(5)
//!             .action("adjust_contrast"),
//!     )
//!     .rule(RuleSpec::new("Target", [word("it")]))
//!     .rule(RuleSpec::new("Quality", [word("brighter")]))
//!     .build()?;
//!
//! let tokens = tokenize_words("make it brighter", |_| ("WORD".into(), TagSet::new()));
//! let analysis = Analyzer::new(&grammar, AnalyzerConfig::default()).analyze(&tokens);
//!
//! assert!(analysis.is_success());
//! assert_eq!(analysis.ambiguity_points.len(), 1);
//! assert_eq!(analysis.ambiguity_points[0].severity, Severity::High);
//! assert_eq!(analysis.ranking.confidence, Confidence::Ambiguous);
//! assert!(analysis.needs_clarification());
//! # Ok::<(), ambit::grammar::GrammarError>(())
//! ```
//!
//! ## Modules
//!
//! - [`token`] - Tagged tokens and normalization
//! - [`grammar`] - Grammar definition and validation
//! - [`chart`] - Earley chart construction and derivation extraction
//! - [`forest`] - Packed parse forests and ambiguity classification
//! - [`score`] - Multi-factor ranking
//! - [`incremental`] - Session cache and debounce policy
//! - [`analysis`] - The whole pipeline behind one call
//! - [`error`] - Error types and diagnostics
//!
//! ## Feature Flags
//!
//! - `serialize`: serde support for tokens, grammar specs, configs and results
//! - `diagnostics`: `miette` diagnostics for error types
//! - `parallel`: batch analysis on a rayon pool

pub mod analysis;
#[cfg(feature = "parallel")]
pub mod batch;
pub mod chart;
pub mod error;
pub mod forest;
pub mod grammar;
pub mod incremental;
pub mod score;
pub mod text;
pub mod token;

pub use analysis::{Analysis, Analyzer, AnalyzerConfig, Session, SessionAnalysis};
pub use chart::{Chart, ChartConfig, ChartOutcome, ChartParser, Derivation, ParseResult};
pub use error::ParseError;
pub use forest::{AmbiguityPoint, Forest, ForestNode, NodeId, Severity};
pub use grammar::{Grammar, GrammarBuilder, GrammarError, GrammarKey, RuleSpec};
pub use incremental::{CacheConfig, DebouncePolicy, Fingerprint, IncrementalParser};
pub use score::{Confidence, Ranking, ScoredParse, Scorer, ScoringConfig};
pub use text::{TextRange, TextSize, TokenSpan};
pub use token::Token;
