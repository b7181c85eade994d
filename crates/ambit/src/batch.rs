//! # Batch Analysis
//!
//! Analyses many independent requests against one grammar on the rayon
//! pool. Every input gets its own chart, forest and ranking; nothing is
//! shared between inputs except the read-only grammar and scorer.

use crate::analysis::{Analysis, Analyzer};
use crate::token::Token;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Progress callback: `(completed, total)`
pub type ProgressCallback<'a> = &'a (dyn Fn(usize, usize) + Sync);

/// Analysis of one batch input
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Position of the input in the batch
    pub index: usize,
    pub analysis: Analysis,
    pub duration: Duration,
}

/// Aggregate counts over a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub needs_clarification: usize,
}

impl BatchSummary {
    #[must_use]
    pub fn of(items: &[BatchItem]) -> Self {
        items.iter().fold(
            Self {
                total: items.len(),
                ..Self::default()
            },
            |mut summary, item| {
                if item.analysis.is_success() {
                    summary.succeeded += 1;
                } else {
                    summary.failed += 1;
                }
                if item.analysis.needs_clarification() {
                    summary.needs_clarification += 1;
                }
                summary
            },
        )
    }
}

/// Analyse every input in parallel; results keep input order
#[must_use]
pub fn analyze_batch<I>(analyzer: &Analyzer<'_>, inputs: &[I]) -> Vec<BatchItem>
where
    I: AsRef<[Token]> + Sync,
{
    run(analyzer, inputs, None)
}

/// [`analyze_batch`] reporting progress after each input
#[must_use]
pub fn analyze_batch_with_progress<I>(
    analyzer: &Analyzer<'_>,
    inputs: &[I],
    progress: ProgressCallback<'_>,
) -> Vec<BatchItem>
where
    I: AsRef<[Token]> + Sync,
{
    run(analyzer, inputs, Some(progress))
}

fn run<I>(analyzer: &Analyzer<'_>, inputs: &[I], progress: Option<ProgressCallback<'_>>) -> Vec<BatchItem>
where
    I: AsRef<[Token]> + Sync,
{
    let total = inputs.len();
    let completed = AtomicUsize::new(0);
    let items: Vec<BatchItem> = inputs
        .par_iter()
        .enumerate()
        .map(|(index, tokens)| {
            let start = Instant::now();
            let analysis = analyzer.analyze(tokens.as_ref());
            let item = BatchItem {
                index,
                analysis,
                duration: start.elapsed(),
            };
            if let Some(progress) = progress {
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                progress(done, total);
            }
            item
        })
        .collect();
    tracing::debug!(inputs = total, "batch analysis complete");
    items
}
