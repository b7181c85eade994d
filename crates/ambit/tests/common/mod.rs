//! Grammars and token helpers shared by the integration tests

#![allow(dead_code)]

use ambit::grammar::{Grammar, GrammarBuilder, RuleSpec, kind, nt, tag, word};
use ambit::token::{TagSet, Token, tokenize_words};

/// Tokenize with a tiny lexicon: comparatives are `ADJ` tagged
/// `comparative`, a few nouns are `NOUN`, everything else is `WORD`.
pub fn tokens(input: &str) -> Vec<Token> {
    tokenize_words(input, |w| {
        let lower = w.to_lowercase();
        match lower.as_str() {
            "brighter" | "darker" | "warmer" | "louder" => {
                let mut tags = TagSet::new();
                tags.push("comparative".into());
                ("ADJ".into(), tags)
            }
            "clip" | "photo" | "track" | "sky" => ("NOUN".into(), TagSet::new()),
            _ => ("WORD".into(), TagSet::new()),
        }
    })
}

/// `E -> E "plus" E | "one"`; n operands have Catalan(n - 1) bracketings
pub fn arithmetic() -> Grammar {
    GrammarBuilder::new("arith", "1")
        .start("E")
        .rule(RuleSpec::new("E", [nt("E"), word("plus"), nt("E")]).named("add"))
        .rule(RuleSpec::new("E", [word("one")]).named("one"))
        .build()
        .unwrap()
}

/// "make it brighter" with two equally preferred readings
pub fn brighter_or_contrast() -> Grammar {
    GrammarBuilder::new("edits", "1")
        .start("Command")
        .rule(
            RuleSpec::new("Command", [word("make"), nt("Target"), nt("Quality")])
                .named("brightness")
                .priority(5)
                .action("adjust_brightness")
                .describe("Raise the exposure"),
        )
        .rule(
            RuleSpec::new("Command", [word("make"), nt("Target"), nt("Quality")])
                .named("contrast")
                .priority(5)
                .action("adjust_contrast")
                .describe("Raise the contrast"),
        )
        .rule(RuleSpec::new("Target", [word("it")]))
        .rule(RuleSpec::new("Quality", [tag("comparative")]))
        .build()
        .unwrap()
}

/// Request grammar with one ambiguous verb and an optional determiner
pub fn editing() -> Grammar {
    GrammarBuilder::new("editing", "1")
        .start("Command")
        .rule(
            RuleSpec::new("Command", [word("delete"), nt("Object")])
                .named("delete")
                .priority(3)
                .action("delete_clip"),
        )
        .rule(
            RuleSpec::new("Command", [word("delete"), nt("Object")])
                .named("mute")
                .priority(1)
                .action("mute_clip"),
        )
        .rule(
            RuleSpec::new("Command", [word("make"), nt("Object"), kind("ADJ")])
                .named("make")
                .priority(2)
                .action("adjust"),
        )
        .rule(RuleSpec::new("Object", [nt("Det"), kind("NOUN")]))
        .rule(RuleSpec::new("Object", [word("it")]))
        .rule(RuleSpec::new("Det", [word("the")]))
        .rule(RuleSpec::new("Det", []).named("no_det"))
        .build()
        .unwrap()
}

/// Three readings of one slot with the given priorities
pub fn three_way(priorities: [i32; 3]) -> Grammar {
    let mut builder = GrammarBuilder::new("three", "1").start("S");
    for (index, priority) in priorities.into_iter().enumerate() {
        builder = builder.rule(
            RuleSpec::new("S", [word("undo"), word("that")])
                .named(format!("reading{index}"))
                .priority(priority)
                .action(format!("undo_{index}")),
        );
    }
    builder.build().unwrap()
}
