//! # Diagnostic Utilities
//!
//! Helpers for turning a stalled parse into useful feedback:
//! - "Did you mean?" suggestions against the expected literal words
//! - Excerpts of the request around the offending token
//! - Similarity-based word matching

use crate::error::ParseError;
use crate::text::TextRange;
use std::fmt::Write;

/// Minimum similarity for a single "did you mean" suggestion
const SUGGESTION_THRESHOLD: f64 = 0.6;
/// Looser threshold when listing several candidates
const CANDIDATE_THRESHOLD: f64 = 0.4;

/// Suggest the expected word most similar to `actual`.
///
/// # Example
///
/// ```rust
/// use ambit::error::diagnostics::did_you_mean;
///
/// let expected = vec!["brighter".to_string(), "darker".to_string()];
/// assert_eq!(did_you_mean("brigter", &expected).as_deref(), Some("brighter"));
/// ```
#[must_use]
pub fn did_you_mean(actual: &str, expected: &[String]) -> Option<String> {
    let actual_lower = actual.to_lowercase();
    let mut best_match: Option<(&String, f64)> = None;

    for candidate in expected {
        let similarity = string_similarity(&actual_lower, &candidate.to_lowercase());
        if similarity < SUGGESTION_THRESHOLD {
            continue;
        }
        match best_match {
            Some((_, best)) if similarity <= best => {}
            _ => best_match = Some((candidate, similarity)),
        }
    }

    best_match.map(|(suggestion, _)| suggestion.clone())
}

/// Up to `max_suggestions` expected words, most similar first
#[must_use]
pub fn suggest_words(actual: &str, expected: &[String], max_suggestions: usize) -> Vec<String> {
    let actual_lower = actual.to_lowercase();
    let mut candidates: Vec<(&String, f64)> = expected
        .iter()
        .map(|candidate| {
            let similarity = string_similarity(&actual_lower, &candidate.to_lowercase());
            (candidate, similarity)
        })
        .filter(|(_, similarity)| *similarity >= CANDIDATE_THRESHOLD)
        .collect();

    // Stable sort keeps the expected-list order among equal candidates.
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    candidates
        .into_iter()
        .take(max_suggestions)
        .map(|(candidate, _)| candidate.clone())
        .collect()
}

/// Split `source` around `span` into `(before, inside, after)`.
///
/// Spans are character offsets, so slicing goes through `chars()` rather
/// than byte indices. Returns `None` when the span lies outside the source.
#[must_use]
pub fn extract_context(
    source: &str,
    span: TextRange,
    context_chars: usize,
) -> Option<(String, String, String)> {
    let start = usize::from(span.start());
    let end = usize::from(span.end());
    let length = source.chars().count();
    if end > length {
        return None;
    }

    let context_start = start.saturating_sub(context_chars);
    let context_end = (end + context_chars).min(length);
    let slice = |from: usize, to: usize| -> String {
        source.chars().skip(from).take(to - from).collect()
    };

    Some((
        slice(context_start, start),
        slice(start, end),
        slice(end, context_end),
    ))
}

/// Render an error followed by an excerpt of the request with the offending
/// token marked by carets.
#[must_use]
pub fn format_error_with_context(error: &ParseError, source: &str, context_chars: usize) -> String {
    let mut result = error.to_string();

    if let Some(span) = error.span()
        && let Some((before, inside, after)) = extract_context(source, span, context_chars)
    {
        let _ = write!(result, "\n  {before}{inside}{after}");
        let marker_width = inside.chars().count().max(1);
        let _ = write!(
            result,
            "\n  {}{}",
            " ".repeat(before.chars().count()),
            "^".repeat(marker_width)
        );
    }

    if let ParseError::UnexpectedToken { found, expected, .. } = error {
        let literals: Vec<String> = expected
            .iter()
            .filter_map(|symbol| {
                symbol
                    .strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .map(str::to_string)
            })
            .collect();
        let suggestions = suggest_words(found, &literals, 3);
        if !suggestions.is_empty() {
            let _ = write!(result, "\n  hint: try {}", suggestions.join(", "));
        }
    }

    result
}

/// Normalized similarity in `[0, 1]`, where 1 means identical
#[must_use]
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = levenshtein_distance(a, b) as f64 / longest as f64;
    1.0 - ratio
}

/// Edit distance with unit insert, delete and substitute costs
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}
