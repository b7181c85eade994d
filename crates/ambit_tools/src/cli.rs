//! CLI interface for ambit

use crate::report::{render_report, snapshot};
use crate::visualize::{derivation_trace, forest_to_dot, render_chart};
use ambit::analysis::Analysis;
use ambit::error::ParseError;
use ambit::grammar::{Grammar, GrammarSpec, RhsSymbol};
use ambit::text::{TextRange, TextSize};
use ambit::token::{TagSet, Token, tokenize_words};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ambit")]
#[command(about = "Analyze edit requests against an ambiguity-preserving grammar")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse one request and report its readings
    Parse {
        /// Grammar specification (JSON)
        #[arg(short, long)]
        grammar: PathBuf,

        /// Token list (JSON), either an array or `{"text": ..., "tokens": [...]}`
        #[arg(short, long, required_unless_present = "text", conflicts_with = "text")]
        tokens: Option<PathBuf>,

        /// Plain request text, split on whitespace into `WORD` tokens
        #[arg(long)]
        text: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Cap on extracted derivations
        #[arg(long)]
        max_derivations: Option<usize>,

        /// Drop readings below this rule priority
        #[arg(long, allow_negative_numbers = true)]
        prune: Option<i32>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a grammar and list its rules
    Check {
        /// Grammar specification (JSON)
        #[arg(short, long)]
        grammar: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Dot,
    Json,
    Chart,
    Trace,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "report" => Ok(Self::Text),
            "dot" | "graphviz" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            "chart" => Ok(Self::Chart),
            "trace" => Ok(Self::Trace),
            _ => Err(format!(
                "Unknown format: {s}. Supported: text, dot, json, chart, trace"
            )),
        }
    }
}

/// A tokenized request plus the text its spans point into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub tokens: Vec<Token>,
    pub source: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenFile {
    WithSource { text: String, tokens: Vec<Token> },
    Plain(Vec<Token>),
}

impl Request {
    /// Split `text` on whitespace; every token gets kind `WORD` and no tags
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            tokens: tokenize_words(text, |_| ("WORD".into(), TagSet::new())),
            source: text.to_string(),
        }
    }

    /// Parse a token file's JSON
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON matches neither accepted shape.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let file: TokenFile = serde_json::from_str(json)
            .context("expected a token array or an object with `text` and `tokens`")?;
        Ok(match file {
            TokenFile::WithSource { text, tokens } => Self {
                tokens,
                source: text,
            },
            TokenFile::Plain(tokens) => {
                let source = reconstruct_source(&tokens);
                Self { tokens, source }
            }
        })
    }
}

/// Lay token texts out at their span offsets, padding gaps with spaces
#[must_use]
pub fn reconstruct_source(tokens: &[Token]) -> String {
    let mut source = String::new();
    let mut chars = 0;
    for token in tokens {
        let start = token.span.start().into() as usize;
        while chars < start {
            source.push(' ');
            chars += 1;
        }
        source.push_str(&token.text);
        chars += token.text.chars().count();
    }
    source
}

/// Rewrite an error's character span as byte offsets into `source`,
/// the unit miette expects for its labels
#[must_use]
pub fn byte_span_error(error: &ParseError, source: &str) -> ParseError {
    let byte_offset = |offset: TextSize| {
        let chars = offset.into() as usize;
        let byte = source
            .char_indices()
            .nth(chars)
            .map_or(source.len(), |(index, _)| index);
        TextSize::from(u32::try_from(byte).unwrap_or(u32::MAX))
    };
    let to_bytes = |span: &TextRange| TextRange::new(byte_offset(span.start()), byte_offset(span.end()));
    let mut error = error.clone();
    match &mut error {
        ParseError::UnexpectedToken { span, .. } | ParseError::UnexpectedEnd { span, .. } => {
            *span = to_bytes(span);
        }
        ParseError::ResourceLimit { .. } => {}
    }
    error
}

/// Read and validate a grammar specification
///
/// # Errors
///
/// Fails when the file cannot be read or does not hold a valid grammar
/// specification.
pub fn load_grammar(path: &Path) -> anyhow::Result<Grammar> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("cannot read grammar {}", path.display()))?;
    let spec: GrammarSpec = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a grammar specification", path.display()))?;
    spec.build()
        .with_context(|| format!("grammar {} is invalid", path.display()))
}

/// Read a token file
///
/// # Errors
///
/// Fails when the file cannot be read or parsed.
pub fn load_request(path: &Path) -> anyhow::Result<Request> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("cannot read tokens {}", path.display()))?;
    Request::from_json(&json).with_context(|| format!("invalid token file {}", path.display()))
}

/// Render an analysis in the requested format
///
/// # Errors
///
/// Fails only when JSON serialization fails.
pub fn render(
    analysis: &Analysis,
    grammar: &Grammar,
    request: &Request,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let tokens = &request.tokens;
    Ok(match format {
        OutputFormat::Text => render_report(analysis, grammar, tokens, &request.source),
        OutputFormat::Dot => forest_to_dot(&analysis.forest, grammar, tokens),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&snapshot(analysis, grammar, tokens))?;
            json.push('\n');
            json
        }
        OutputFormat::Chart => render_chart(&analysis.result.chart, grammar, tokens),
        OutputFormat::Trace => {
            let mut out = String::new();
            for (index, derivation) in analysis.derivations.iter().enumerate() {
                let _ = writeln!(out, "reading {}:", index + 1);
                for step in derivation_trace(derivation, grammar, tokens) {
                    let _ = writeln!(out, "  => {step}");
                }
            }
            out
        }
    })
}

/// Grammar header followed by one line per rule in declaration order
#[must_use]
pub fn describe_grammar(grammar: &Grammar) -> String {
    let mut out = String::new();
    let (low, high) = grammar.priority_range();
    let _ = writeln!(
        out,
        "{}: {} rules, start {}, priorities {low}..={high}",
        grammar.key(),
        grammar.rules().len(),
        grammar.symbol_name(grammar.start())
    );
    for rule in grammar.rules() {
        let rhs: Vec<String> = rule
            .rhs
            .iter()
            .map(|symbol| match symbol {
                RhsSymbol::NonTerminal(nt) => grammar.symbol_name(*nt).to_string(),
                RhsSymbol::Terminal(terminal) => terminal.to_string(),
            })
            .collect();
        let rhs = if rhs.is_empty() {
            String::from("ε")
        } else {
            rhs.join(" ")
        };
        let _ = write!(
            out,
            "  {:<16} {} -> {rhs} (p{})",
            rule.name,
            grammar.symbol_name(rule.lhs),
            rule.priority
        );
        if let Some(action) = &rule.action {
            let _ = write!(out, " => {action}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from([
            "ambit", "parse", "-g", "g.json", "--text", "undo that", "-f", "dot", "--prune", "-2",
        ])
        .unwrap();
        let Commands::Parse {
            text,
            tokens,
            format,
            prune,
            ..
        } = cli.command
        else {
            panic!("expected the parse command");
        };
        assert_eq!(text.as_deref(), Some("undo that"));
        assert!(tokens.is_none());
        assert_eq!(format, OutputFormat::Dot);
        assert_eq!(prune, Some(-2));
    }

    #[test]
    fn test_tokens_or_text_required() {
        assert!(Cli::try_parse_from(["ambit", "parse", "-g", "g.json"]).is_err());
        assert!(
            Cli::try_parse_from(["ambit", "parse", "-g", "g.json", "-t", "t.json", "--text", "x"])
                .is_err()
        );
    }

    #[test]
    fn test_output_format_names() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("graphviz".parse::<OutputFormat>(), Ok(OutputFormat::Dot));
        assert_eq!("trace".parse::<OutputFormat>(), Ok(OutputFormat::Trace));
        assert!("html".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_request_shapes() {
        let plain = r#"[
            {"text": "undo", "kind": "VERB", "span": {"start": 2, "end": 6}},
            {"text": "that", "kind": "PRON", "span": {"start": 8, "end": 12}}
        ]"#;
        let request = Request::from_json(plain).unwrap();
        assert_eq!(request.tokens.len(), 2);
        assert_eq!(request.source, "  undo  that");

        let with_source = r#"{"text": "Undo that!", "tokens": [
            {"text": "Undo", "kind": "VERB", "span": {"start": 0, "end": 4}}
        ]}"#;
        let request = Request::from_json(with_source).unwrap();
        assert_eq!(request.source, "Undo that!");
        assert_eq!(request.tokens[0].kind, "VERB");

        assert!(Request::from_json(r#"{"tokens": 3}"#).is_err());
    }

    #[test]
    fn test_text_request() {
        let request = Request::from_text("undo  that");
        assert_eq!(request.tokens.len(), 2);
        assert_eq!(request.tokens[1].kind, "WORD");
        assert_eq!(reconstruct_source(&request.tokens), "undo  that");
    }

    #[test]
    fn test_reconstruct_non_ascii_offsets() {
        let request = Request::from_text("résumé  naïve  text");
        assert_eq!(reconstruct_source(&request.tokens), "résumé  naïve  text");

        let plain = r#"[
            {"text": "café", "kind": "WORD", "span": {"start": 0, "end": 4}},
            {"text": "noir", "kind": "WORD", "span": {"start": 6, "end": 10}}
        ]"#;
        let request = Request::from_json(plain).unwrap();
        assert_eq!(request.source, "café  noir");
        let span = request.tokens[1].span;
        let shown: String = request
            .source
            .chars()
            .skip(span.start().into() as usize)
            .take(span.len().into() as usize)
            .collect();
        assert_eq!(shown, "noir");
    }

    #[test]
    fn test_error_span_in_bytes() {
        let source = "café noir";
        let error = ParseError::UnexpectedToken {
            span: TextRange::new(TextSize::from(5), TextSize::from(9)),
            position: 1,
            found: "noir".into(),
            expected: vec!["END".into()],
        };
        let ParseError::UnexpectedToken { span, .. } = byte_span_error(&error, source) else {
            panic!("variant changed");
        };
        assert_eq!(span.start().into(), 6);
        assert_eq!(span.end().into(), 10);
        let start = span.start().into() as usize;
        let end = span.end().into() as usize;
        assert_eq!(&source[start..end], "noir");

        let end_error = ParseError::UnexpectedEnd {
            span: TextRange::empty(TextSize::from(9)),
            position: 2,
            expected: vec!["WORD".into()],
        };
        let ParseError::UnexpectedEnd { span, .. } = byte_span_error(&end_error, source) else {
            panic!("variant changed");
        };
        assert_eq!(span.start().into() as usize, source.len());
    }
}
