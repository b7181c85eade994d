//! Batch analysis on the rayon pool

mod common;

use ambit::analysis::{Analyzer, AnalyzerConfig};
use ambit::batch::{BatchSummary, analyze_batch, analyze_batch_with_progress};
use common::{editing, tokens};
use std::sync::atomic::{AtomicUsize, Ordering};

const REQUESTS: [&str; 5] = [
    "delete the clip",
    "make it brighter",
    "delete tha clip",
    "delete clip",
    "make it",
];

#[test]
fn test_batch_matches_sequential_analysis() {
    let grammar = editing();
    let analyzer = Analyzer::new(&grammar, AnalyzerConfig::default());
    let inputs: Vec<_> = REQUESTS.iter().map(|r| tokens(r)).collect();

    let batch = analyze_batch(&analyzer, &inputs);
    assert_eq!(batch.len(), inputs.len());
    for (position, item) in batch.iter().enumerate() {
        assert_eq!(item.index, position);
        let sequential = analyzer.analyze(&inputs[position]);
        assert_eq!(item.analysis.is_success(), sequential.is_success());
        assert_eq!(item.analysis.forest, sequential.forest);
        assert_eq!(item.analysis.ranking, sequential.ranking);
    }

    let summary = BatchSummary::of(&batch);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 2);
}

#[test]
fn test_progress_reaches_total() {
    let grammar = editing();
    let analyzer = Analyzer::new(&grammar, AnalyzerConfig::default());
    let inputs: Vec<_> = REQUESTS.iter().map(|r| tokens(r)).collect();
    let calls = AtomicUsize::new(0);
    let highest = AtomicUsize::new(0);

    let progress = |done: usize, total: usize| {
        assert_eq!(total, REQUESTS.len());
        calls.fetch_add(1, Ordering::SeqCst);
        highest.fetch_max(done, Ordering::SeqCst);
    };
    let batch = analyze_batch_with_progress(&analyzer, &inputs, &progress);

    assert_eq!(batch.len(), REQUESTS.len());
    assert_eq!(calls.load(Ordering::SeqCst), REQUESTS.len());
    assert_eq!(highest.load(Ordering::SeqCst), REQUESTS.len());
}
