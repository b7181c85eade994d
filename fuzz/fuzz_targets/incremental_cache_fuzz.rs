#![no_main]
use ambit::chart::ChartConfig;
use ambit::grammar::{GrammarBuilder, RuleSpec, nt, word};
use ambit::incremental::{CacheConfig, CacheOutcome, IncrementalParser, ManualClock};
use ambit::token::{TagSet, tokenize_words};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use std::time::Duration;

const WORDS: [&str; 3] = ["undo", "that", "again"];

fuzz_target!(|data: &[u8]| {
    let Ok(grammar) = GrammarBuilder::new("fuzz", "1")
        .start("S")
        .rule(RuleSpec::new("S", [word("undo"), nt("O")]).action("undo_last"))
        .rule(RuleSpec::new("S", [nt("S"), word("again")]))
        .rule(RuleSpec::new("O", [word("that")]))
        .build()
    else {
        return;
    };
    let clock = ManualClock::new();
    let capacity = 4;
    let mut parser = IncrementalParser::with_clock(
        ChartConfig::default(),
        CacheConfig::default().with_max_entries(capacity),
        Arc::new(clock.clone()),
    );

    // Each chunk is one edit: a time step followed by the new request.
    for chunk in data.chunks(6).take(64) {
        let Some((step, words)) = chunk.split_first() else {
            continue;
        };
        clock.advance(Duration::from_secs(u64::from(*step)));
        let text: Vec<&str> = words
            .iter()
            .map(|byte| WORDS[usize::from(*byte) % WORDS.len()])
            .collect();
        let tokens = tokenize_words(&text.join(" "), |_| ("WORD".into(), TagSet::new()));

        let Ok(parse) = parser.parse(&grammar, &tokens) else {
            return;
        };
        assert_eq!(parse.result.chart.token_count(), tokens.len());
        assert!(parse.reuse.reused_tokens <= tokens.len());
        if parse.reuse.outcome == CacheOutcome::FullHit {
            assert_eq!(parse.reuse.reused_tokens, tokens.len());
        }
        assert!(parser.cache().entries_for("fuzz").len() <= capacity);
    }
});
