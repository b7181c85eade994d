//! # Error Types
//!
//! Outcome and error types for chart parsing.
//!
//! ## Overview
//!
//! Expected conditions are values, not panics:
//!
//! - **Parse failure**: the input does not derive from the start symbol.
//!   [`ParseError::UnexpectedToken`] and [`ParseError::UnexpectedEnd`] carry
//!   the stall position and the symbols that would have advanced there, which
//!   feeds "I didn't understand X" feedback.
//! - **Resource limits**: [`ParseError::ResourceLimit`] is a recoverable,
//!   reported condition; the partial chart is discarded.
//!
//! Ambiguity is deliberately absent: it is data routed to the forest and the
//! scorer, never an error.
//!
//! Contract violations live next to what they protect:
//! [`GrammarError`](crate::grammar::GrammarError) for malformed grammars and
//! [`CacheError`](crate::incremental::CacheError) for corrupted cache state.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with `miette`
//! for rich reporting with source snippets.

pub mod diagnostics;

use crate::text::TextRange;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    #[error("Unexpected '{found}' at token {position}, expected {}", format_expected_list(expected))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::unexpected_token)))]
    UnexpectedToken {
        #[cfg_attr(feature = "diagnostics", label("not understood"))]
        span: TextRange,
        /// Token index where parsing stalled
        position: usize,
        found: String,
        expected: Vec<String>,
    },

    #[error("Unexpected end of input, expected {}", format_expected_list(expected))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::unexpected_end)))]
    UnexpectedEnd {
        #[cfg_attr(feature = "diagnostics", label("input ends here"))]
        span: TextRange,
        position: usize,
        expected: Vec<String>,
    },

    #[error("Chart limit exceeded at token {position}: {items} items (limit {limit})")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(parser::resource_limit),
            help("the grammar is too ambiguous for this input; raise the chart limits or simplify the request")
        )
    )]
    ResourceLimit {
        position: usize,
        items: usize,
        limit: usize,
    },
}

impl ParseError {
    /// Source span of the offending token (or end of input)
    #[must_use]
    pub const fn span(&self) -> Option<TextRange> {
        match self {
            Self::UnexpectedToken { span, .. } | Self::UnexpectedEnd { span, .. } => Some(*span),
            Self::ResourceLimit { .. } => None,
        }
    }

    /// Token index where parsing stopped
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::UnexpectedToken { position, .. }
            | Self::UnexpectedEnd { position, .. }
            | Self::ResourceLimit { position, .. } => *position,
        }
    }

    /// Symbols that would have advanced the parse at the stall position
    #[must_use]
    pub fn expected(&self) -> &[String] {
        match self {
            Self::UnexpectedToken { expected, .. } | Self::UnexpectedEnd { expected, .. } => {
                expected
            }
            Self::ResourceLimit { .. } => &[],
        }
    }

    #[must_use]
    pub const fn is_resource_limit(&self) -> bool {
        matches!(self, Self::ResourceLimit { .. })
    }

    /// Short user-facing feedback sentence
    #[must_use]
    pub fn feedback(&self) -> String {
        match self {
            Self::UnexpectedToken { found, .. } => {
                let mut message = format!("I didn't understand \"{found}\"");
                if let Some(suggestion) = self.did_you_mean(found) {
                    message.push_str(". ");
                    message.push_str(&suggestion);
                }
                message
            }
            Self::UnexpectedEnd { expected, .. } => {
                format!(
                    "The request seems incomplete; I expected {}",
                    format_expected_list(expected)
                )
            }
            Self::ResourceLimit { .. } => {
                "The request has too many possible readings to analyse".to_string()
            }
        }
    }

    /// "Did you mean" suggestion among the expected literal words
    #[must_use]
    pub fn did_you_mean(&self, actual: &str) -> Option<String> {
        let literals: Vec<String> = self
            .expected()
            .iter()
            .filter_map(|symbol| {
                symbol
                    .strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .map(str::to_string)
            })
            .collect();
        diagnostics::did_you_mean(actual, &literals)
            .map(|suggestion| format!("Did you mean '{suggestion}'?"))
    }
}

/// Format a list of expected symbols as a human-readable string
#[must_use]
pub fn format_expected_list(expected: &[String]) -> String {
    match expected {
        [] => "nothing".to_string(),
        [only] => only.clone(),
        [first, second] => format!("{first} or {second}"),
        [init @ .., last] => {
            let mut result = init
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            result.push_str(", or ");
            result.push_str(last);
            result
        }
    }
}
