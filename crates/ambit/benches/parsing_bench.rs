use ambit::analysis::{Analyzer, AnalyzerConfig};
use ambit::chart::{ChartConfig, ChartParser};
use ambit::forest::Forest;
use ambit::grammar::{Grammar, GrammarBuilder, RuleSpec, kind, nt, word};
use ambit::incremental::{CacheConfig, IncrementalParser};
use ambit::token::{TagSet, Token, tokenize_words};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn arithmetic() -> Grammar {
    GrammarBuilder::new("arith", "1")
        .start("E")
        .rule(RuleSpec::new("E", [nt("E"), word("plus"), nt("E")]))
        .rule(RuleSpec::new("E", [word("one")]))
        .build()
        .unwrap()
}

fn editing() -> Grammar {
    GrammarBuilder::new("editing", "1")
        .start("Command")
        .rule(
            RuleSpec::new("Command", [word("make"), nt("Object"), kind("ADJ")])
                .priority(2)
                .action("adjust_brightness"),
        )
        .rule(
            RuleSpec::new("Command", [word("make"), nt("Object"), kind("ADJ")])
                .priority(2)
                .action("adjust_contrast"),
        )
        .rule(RuleSpec::new("Object", [nt("Det"), kind("NOUN")]))
        .rule(RuleSpec::new("Object", [word("it")]))
        .rule(RuleSpec::new("Det", [word("the")]))
        .rule(RuleSpec::new("Det", []))
        .build()
        .unwrap()
}

fn tokens(input: &str) -> Vec<Token> {
    tokenize_words(input, |w| {
        let kind = match w {
            "brighter" | "warmer" => "ADJ",
            "sky" | "photo" => "NOUN",
            _ => "WORD",
        };
        (kind.into(), TagSet::new())
    })
}

fn operands(count: usize) -> Vec<Token> {
    tokens(&vec!["one"; count].join(" plus "))
}

fn bench_chart_construction(c: &mut Criterion) {
    let grammar = arithmetic();
    let mut group = c.benchmark_group("chart_ambiguous_sum");
    for count in [4, 8, 12] {
        let input = operands(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            let parser = ChartParser::new(&grammar, ChartConfig::default());
            b.iter(|| black_box(parser.parse_and_extract(black_box(input))));
        });
    }
    group.finish();
}

fn bench_forest_packing(c: &mut Criterion) {
    let grammar = arithmetic();
    let input = operands(7);
    let config = ChartConfig::default().with_max_derivations(256);
    let result = ChartParser::new(&grammar, config).parse_and_extract(&input);

    c.bench_function("forest_pack_seven_operands", |b| {
        b.iter(|| black_box(Forest::build(&grammar, black_box(&result.derivations), input.len())));
    });
}

fn bench_analysis(c: &mut Criterion) {
    let grammar = editing();
    let analyzer = Analyzer::new(&grammar, AnalyzerConfig::default());
    let input = tokens("make the photo warmer");

    c.bench_function("analyze_edit_request", |b| {
        b.iter(|| black_box(analyzer.analyze(black_box(&input))));
    });
}

fn bench_incremental_typing(c: &mut Criterion) {
    let grammar = editing();
    let steps: Vec<Vec<Token>> = ["make", "make the", "make the sky", "make the sky brighter"]
        .iter()
        .map(|step| tokens(step))
        .collect();

    c.bench_function("incremental_typing_session", |b| {
        b.iter(|| {
            let mut parser = IncrementalParser::new(ChartConfig::default(), CacheConfig::default());
            for step in &steps {
                black_box(parser.parse(&grammar, step).unwrap());
            }
            // Re-typing the final request is a full hit.
            black_box(parser.parse(&grammar, &steps[steps.len() - 1]).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_chart_construction,
    bench_forest_packing,
    bench_analysis,
    bench_incremental_typing
);
criterion_main!(benches);
