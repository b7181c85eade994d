#![no_main]
use ambit::analysis::{Analyzer, AnalyzerConfig};
use ambit::chart::{ChartConfig, ChartOutcome};
use ambit::grammar::{Grammar, GrammarBuilder, RuleSpec, nt, word};
use ambit::token::{TagSet, Token, tokenize_words};
use libfuzzer_sys::fuzz_target;

const WORDS: [&str; 4] = ["one", "plus", "times", "two"];

fn grammar() -> Option<Grammar> {
    GrammarBuilder::new("fuzz", "1")
        .start("E")
        .rule(RuleSpec::new("E", [nt("E"), word("plus"), nt("E")]).priority(1).action("add"))
        .rule(RuleSpec::new("E", [nt("E"), word("times"), nt("E")]).priority(2).action("mul"))
        .rule(RuleSpec::new("E", [nt("N")]))
        .rule(RuleSpec::new("N", [word("one")]))
        .rule(RuleSpec::new("N", [word("two")]))
        .rule(RuleSpec::new("N", []))
        .build()
        .ok()
}

fn tokens(data: &[u8]) -> Vec<Token> {
    let text: Vec<&str> = data
        .iter()
        .take(24)
        .map(|byte| WORDS[usize::from(*byte) % WORDS.len()])
        .collect();
    tokenize_words(&text.join(" "), |_| ("WORD".into(), TagSet::new()))
}

fuzz_target!(|data: &[u8]| {
    let Some(grammar) = grammar() else {
        return;
    };
    let tokens = tokens(data);
    let config = AnalyzerConfig::default().with_chart(
        ChartConfig::default()
            .with_max_total_items(20_000)
            .with_max_derivations(32),
    );
    let analysis = Analyzer::new(&grammar, config).analyze(&tokens);

    assert_eq!(analysis.is_success(), analysis.error.is_none());
    for derivation in &analysis.derivations {
        assert!(derivation.is_sound(&grammar, tokens.len()));
    }
    assert!(analysis.forest.check_invariants());
    assert!(analysis.derivations.len() <= 32);
    for parse in &analysis.ranking.parses {
        assert!((0.0..=1.0).contains(&parse.score));
    }
    if let ChartOutcome::Failed { position, .. } = analysis.result.chart.outcome() {
        assert!(*position <= tokens.len());
    }
});
