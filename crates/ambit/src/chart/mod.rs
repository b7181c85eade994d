//! # Chart Parser
//!
//! Earley chart construction over ambiguous grammars.
//!
//! ## Overview
//!
//! For each token boundary `k` the parser runs a worklist over the chart set
//! at `k`:
//!
//! - **PREDICT** adds dot-zero items for every rule of a pending
//!   non-terminal, with origin `k`.
//! - **COMPLETE** advances items waiting at the completed item's origin.
//!   Non-terminals that complete without consuming input are remembered for
//!   the rest of the set so that later waiters are advanced too.
//! - **SCAN** advances items whose next terminal matches token `k` into the
//!   set at `k + 1`.
//!
//! Every item keeps its derivation [`Link`]s. An item reached along several
//! paths records one link per path; [`extract`] walks the links back to
//! rebuild bounded lists of [`Derivation`]s.
//!
//! ## Failure
//!
//! Construction stops at the first position whose successor set stays empty.
//! The [`Chart`] records the stall position and the terminals expected there,
//! and [`Chart::error`] turns that into a [`ParseError`](crate::error::ParseError).
//! Item caps from [`ChartConfig`] turn runaway grammars into a reported
//! [`ChartOutcome::LimitExceeded`] instead of unbounded work.
//!
//! ## Usage
//!
//! ```rust
//! use ambit::chart::{ChartConfig, parse};
//! use ambit::grammar::{GrammarBuilder, RuleSpec, word, nt};
//! use ambit::token::{TagSet, tokenize_words};
//!
//! let grammar = GrammarBuilder::new("demo", "1")
//!     .start("S")
//!     .rule(RuleSpec::new("S", [word("undo"), nt("Obj")]))
//!     .rule(RuleSpec::new("Obj", [word("that")]))
//!     .build()?;
//! let tokens = tokenize_words("undo that", |_| ("WORD".into(), TagSet::new()));
//! let result = parse(&grammar, &tokens, &ChartConfig::default());
//! assert!(result.is_success());
//! assert_eq!(result.derivations.len(), 1);
//! # Ok::<(), ambit::grammar::GrammarError>(())
//! ```

pub mod config;
pub mod extract;
pub mod item;
pub mod parser;

pub use config::ChartConfig;
pub use extract::{Derivation, DerivationChild, DerivationNode, Extraction, extract};
pub use item::{ChartSet, EarleyItem, Link};
pub use parser::{Chart, ChartOutcome, ChartParser};

use crate::grammar::Grammar;
use crate::token::Token;

/// A chart together with the derivations extracted from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub chart: Chart,
    pub derivations: Vec<Derivation>,
    /// Set when the derivation cap cut off alternatives
    pub truncated: bool,
}

impl ParseResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.chart.is_success()
    }
}

impl ChartParser<'_> {
    /// Build the chart and extract up to `max_derivations` derivations
    #[must_use]
    pub fn parse_and_extract(&self, tokens: &[Token]) -> ParseResult {
        let chart = self.parse(tokens);
        let Extraction {
            derivations,
            truncated,
        } = extract(&chart, self.grammar(), self.config().max_derivations);
        ParseResult {
            chart,
            derivations,
            truncated,
        }
    }
}

/// Parse `tokens` with `grammar` and extract derivations
#[must_use]
pub fn parse(grammar: &Grammar, tokens: &[Token], config: &ChartConfig) -> ParseResult {
    ChartParser::new(grammar, *config).parse_and_extract(tokens)
}
