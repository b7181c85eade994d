//! Walk through an editing session: a request typed word by word, then an
//! ambiguous request that needs clarification.
//!
//! Run with `cargo run --example edit_session`.

use ambit::analysis::{AnalyzerConfig, Session};
use ambit::grammar::{GrammarBuilder, GrammarError, RuleSpec, kind, nt, tag, word};
use ambit::incremental::CacheConfig;
use ambit::token::{TagSet, Token, tokenize_words};

fn tokens(input: &str) -> Vec<Token> {
    tokenize_words(input, |word| match word {
        "brighter" | "warmer" => {
            let mut tags = TagSet::new();
            tags.push("comparative".into());
            ("ADJ".into(), tags)
        }
        "clip" | "photo" => ("NOUN".into(), TagSet::new()),
        _ => ("WORD".into(), TagSet::new()),
    })
}

fn main() -> Result<(), GrammarError> {
    let grammar = GrammarBuilder::new("editing", "1")
        .start("Command")
        .rule(
            RuleSpec::new("Command", [word("delete"), nt("Object")])
                .priority(3)
                .action("delete_clip")
                .describe("Remove the clip from the timeline"),
        )
        .rule(
            RuleSpec::new("Command", [word("make"), nt("Object"), tag("comparative")])
                .named("brightness")
                .priority(5)
                .action("adjust_brightness"),
        )
        .rule(
            RuleSpec::new("Command", [word("make"), nt("Object"), tag("comparative")])
                .named("contrast")
                .priority(5)
                .action("adjust_contrast"),
        )
        .rule(RuleSpec::new("Object", [word("the"), kind("NOUN")]))
        .rule(RuleSpec::new("Object", [word("it")]))
        .build()?;

    let mut session = Session::new(&grammar, AnalyzerConfig::default(), CacheConfig::default());

    for request in ["delete", "delete the", "delete the clip", "make it brighter"] {
        session.keystroke();
        let Ok(result) = session.analyze(&tokens(request)) else {
            continue;
        };
        let analysis = &result.analysis;
        println!("{request:?}: {:?}", result.reuse.outcome);
        match &analysis.error {
            Some(error) => println!("  {}", error.feedback()),
            None => {
                for point in &analysis.ambiguity_points {
                    println!(
                        "  {} readings of {:?} ({} severity): {}",
                        point.alternative_count(),
                        point.source_text,
                        point.severity,
                        point.actions().join(" / ")
                    );
                }
                println!(
                    "  confidence {}, clarify: {}",
                    analysis.ranking.confidence,
                    analysis.needs_clarification()
                );
            }
        }
    }
    Ok(())
}
