//! Analysis reports: summary statistics, human-readable text and JSON
//! snapshots.

use ambit::analysis::Analysis;
use ambit::chart::ChartOutcome;
use ambit::error::diagnostics::format_error_with_context;
use ambit::forest::ForestStats;
use ambit::grammar::Grammar;
use ambit::incremental::CacheStats;
use ambit::score::Confidence;
use ambit::token::Token;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt::Write;

use crate::visualize::render_derivation;

/// Characters of request text shown on each side of an error
const ERROR_CONTEXT: usize = 24;

/// Condensed statistics for one analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub grammar: String,
    pub tokens: usize,
    pub outcome: &'static str,
    pub chart_sets: usize,
    pub chart_items: usize,
    pub derivations: usize,
    pub truncated: bool,
    pub forest: ForestStats,
    pub ambiguity_points: usize,
    pub confidence: Confidence,
    pub top_score: Option<f64>,
    pub margin: Option<f64>,
    pub needs_clarification: bool,
}

impl Summary {
    #[must_use]
    pub fn of(analysis: &Analysis) -> Self {
        let chart = &analysis.result.chart;
        let outcome = match chart.outcome() {
            ChartOutcome::Success => "success",
            ChartOutcome::Failed { .. } => "failed",
            ChartOutcome::LimitExceeded { .. } => "limit_exceeded",
        };
        Self {
            grammar: chart.grammar().to_string(),
            tokens: chart.token_count(),
            outcome,
            chart_sets: chart.sets().len(),
            chart_items: chart.total_items(),
            derivations: analysis.derivations.len(),
            truncated: analysis.truncated,
            forest: analysis.forest.stats(),
            ambiguity_points: analysis.ambiguity_points.len(),
            confidence: analysis.ranking.confidence,
            top_score: analysis.ranking.best().map(|best| best.score),
            margin: analysis.ranking.margin(),
            needs_clarification: analysis.needs_clarification(),
        }
    }
}

/// Render a summary as aligned `key: value` lines
#[must_use]
pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "grammar:        {}", summary.grammar);
    let _ = writeln!(out, "tokens:         {}", summary.tokens);
    let _ = writeln!(out, "outcome:        {}", summary.outcome);
    let _ = writeln!(
        out,
        "chart:          {} sets, {} items",
        summary.chart_sets, summary.chart_items
    );
    let _ = write!(out, "derivations:    {}", summary.derivations);
    if summary.truncated {
        out.push_str(" (truncated)");
    }
    out.push('\n');
    let forest = &summary.forest;
    let _ = writeln!(
        out,
        "forest:         {} nodes ({} or, {} and, {} leaves), {} readings",
        forest.nodes, forest.or_nodes, forest.and_nodes, forest.leaves, forest.derivations
    );
    let _ = writeln!(out, "ambiguities:    {}", summary.ambiguity_points);
    let _ = write!(out, "confidence:     {}", summary.confidence);
    if let Some(score) = summary.top_score {
        let _ = write!(out, " (top {score:.3}");
        if let Some(margin) = summary.margin {
            let _ = write!(out, ", lead {margin:.3}");
        }
        out.push(')');
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "clarify:        {}",
        if summary.needs_clarification { "yes" } else { "no" }
    );
    out
}

/// Render session cache counters
#[must_use]
pub fn render_cache_stats(stats: &CacheStats) -> String {
    format!(
        "cache: {} entries, {} hits, {} partial, {} misses ({:.0}% hit ratio), \
         {} evicted, {} expired, {} invalidated, {} uncacheable\n",
        stats.entries,
        stats.hits,
        stats.partial_hits,
        stats.misses,
        stats.hit_ratio() * 100.0,
        stats.evictions,
        stats.expirations,
        stats.invalidations,
        stats.uncacheable,
    )
}

/// Full human-readable report: summary, error with request context,
/// ambiguity points, ranking and the best derivation.
#[must_use]
pub fn render_report(analysis: &Analysis, grammar: &Grammar, tokens: &[Token], source: &str) -> String {
    let mut out = render_summary(&Summary::of(analysis));

    if let Some(error) = &analysis.error {
        let _ = writeln!(out, "\nerror: {}", format_error_with_context(error, source, ERROR_CONTEXT));
        let _ = writeln!(out, "feedback: {}", error.feedback());
        return out;
    }

    if !analysis.ambiguity_points.is_empty() {
        out.push_str("\nambiguity points:\n");
        for point in &analysis.ambiguity_points {
            let _ = writeln!(
                out,
                "  {} over {:?} [{}, {}): {} severity, {} readings",
                point.symbol,
                point.source_text,
                point.span.start,
                point.span.end,
                point.severity,
                point.alternative_count()
            );
            for alternative in &point.alternatives {
                let _ = write!(
                    out,
                    "    - {} (p{})",
                    alternative.rule_name, alternative.priority
                );
                if let Some(action) = &alternative.action {
                    let _ = write!(out, " => {action}");
                }
                if !alternative.description.is_empty() {
                    let _ = write!(out, ": {}", alternative.description);
                }
                out.push('\n');
            }
        }
    }

    if !analysis.ranking.is_empty() {
        out.push_str("\nranking:\n");
        for parse in &analysis.ranking.parses {
            let Some(derivation) = analysis.derivations.get(parse.derivation) else {
                continue;
            };
            let _ = writeln!(
                out,
                "  #{} {:.3} {}",
                parse.rank,
                parse.score,
                derivation.bracketed(grammar, tokens)
            );
            let factors: Vec<String> = parse
                .breakdown
                .factors
                .iter()
                .map(|factor| format!("{} {:.2}x{:.2}", factor.name, factor.value, factor.weight))
                .collect();
            let _ = writeln!(out, "     {}", factors.join(", "));
        }
    }

    if let Some((_, derivation)) = analysis.best() {
        out.push_str("\nbest derivation:\n");
        for line in render_derivation(derivation, grammar, tokens).lines() {
            let _ = writeln!(out, "  {line}");
        }
    }

    out
}

/// JSON snapshot of an analysis, suitable for golden files and tooling
#[must_use]
pub fn snapshot(analysis: &Analysis, grammar: &Grammar, tokens: &[Token]) -> Value {
    let derivations: Vec<String> = analysis
        .derivations
        .iter()
        .map(|derivation| derivation.bracketed(grammar, tokens))
        .collect();
    json!({
        "summary": Summary::of(analysis),
        "tokens": tokens,
        "error": analysis.error.as_ref().map(|error| json!({
            "message": error.to_string(),
            "position": error.position(),
            "expected": error.expected(),
            "feedback": error.feedback(),
        })),
        "derivations": derivations,
        "forest": &analysis.forest,
        "ambiguity_points": &analysis.ambiguity_points,
        "ranking": &analysis.ranking,
    })
}
