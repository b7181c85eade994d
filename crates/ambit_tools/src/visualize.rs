//! Forest, derivation and chart visualization
//!
//! Everything here renders into a `String`: DOT/Graphviz for the packed
//! forest, indented text for derivations and forests, a per-position dump
//! of the Earley chart, and leftmost derivation traces.

use ambit::chart::{Chart, Derivation, DerivationChild, DerivationNode, Link};
use ambit::forest::{Forest, ForestNode, NodeId};
use ambit::grammar::Grammar;
use ambit::token::Token;
use std::collections::HashSet;
use std::fmt::Write;

fn token_text(tokens: &[Token], index: usize) -> &str {
    tokens.get(index).map_or("?", |t| t.text.as_str())
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Generate a DOT/Graphviz representation of a packed forest.
///
/// Or nodes are drawn as diamonds, rule applications as boxes and tokens as
/// ellipses. The root is outlined in bold.
///
/// # Example
///
/// ```rust,ignore
/// use ambit_tools::visualize::forest_to_dot;
///
/// let dot = forest_to_dot(&analysis.forest, &grammar, &tokens);
/// std::fs::write("forest.dot", dot)?;
/// ```
#[must_use]
pub fn forest_to_dot(forest: &Forest, grammar: &Grammar, tokens: &[Token]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "digraph Forest {{");
    let _ = writeln!(output, "  rankdir=TB;");
    let _ = writeln!(output, "  node [fontname=\"Helvetica\"];");
    let _ = writeln!(output);

    for (id, node) in forest.iter() {
        let bold = if forest.root() == Some(id) {
            ", penwidth=2"
        } else {
            ""
        };
        match node {
            ForestNode::Or {
                symbol,
                span,
                alternatives,
            } => {
                let _ = writeln!(
                    output,
                    "  {id} [label=\"{} [{}, {})\\n{} readings\", shape=diamond, style=filled, fillcolor=lightsalmon{bold}];",
                    escape(grammar.symbol_name(*symbol)),
                    span.start,
                    span.end,
                    alternatives.len()
                );
            }
            ForestNode::And {
                rule,
                priority,
                action,
                ..
            } => {
                let name = escape(&grammar.rule(*rule).name);
                let label = match action {
                    Some(action) => format!("{name}\\np{priority} / {}", escape(action)),
                    None => format!("{name}\\np{priority}"),
                };
                let _ = writeln!(output, "  {id} [label=\"{label}\", shape=box{bold}];");
            }
            ForestNode::Leaf { token, .. } => {
                let _ = writeln!(
                    output,
                    "  {id} [label=\"{}\", shape=ellipse, style=filled, fillcolor=lightblue{bold}];",
                    escape(token_text(tokens, *token))
                );
            }
        }
    }

    let _ = writeln!(output);

    for (id, node) in forest.iter() {
        let style = if node.is_or() { " [style=dashed]" } else { "" };
        for successor in node.successors() {
            let _ = writeln!(output, "  {id} -> {successor}{style};");
        }
    }

    let _ = writeln!(output, "}}");
    output
}

/// Render a derivation as an indented tree, one rule application per line
#[must_use]
pub fn render_derivation(derivation: &Derivation, grammar: &Grammar, tokens: &[Token]) -> String {
    fn walk(
        node: &DerivationNode,
        grammar: &Grammar,
        tokens: &[Token],
        depth: usize,
        out: &mut String,
    ) {
        let rule = grammar.rule(node.rule);
        let indent = "  ".repeat(depth);
        let _ = write!(
            out,
            "{indent}{} [{}, {}) {}",
            grammar.symbol_name(node.lhs),
            node.span.start,
            node.span.end,
            rule.name
        );
        if let Some(action) = &rule.action {
            let _ = write!(out, " => {action}");
        }
        out.push('\n');
        for child in &node.children {
            match child {
                DerivationChild::Node(child) => walk(child, grammar, tokens, depth + 1, out),
                DerivationChild::Leaf(token) => {
                    let _ = writeln!(out, "{indent}  {:?}", token_text(tokens, *token));
                }
            }
        }
    }

    let mut out = String::new();
    walk(derivation.root(), grammar, tokens, 0, &mut out);
    out
}

/// Render a forest as an indented tree.
///
/// Shared nodes are expanded at their first occurrence only; later
/// occurrences print a back-reference such as `(see n4)`.
#[must_use]
pub fn render_forest(forest: &Forest, grammar: &Grammar, tokens: &[Token]) -> String {
    struct Printer<'a> {
        forest: &'a Forest,
        grammar: &'a Grammar,
        tokens: &'a [Token],
        seen: HashSet<NodeId>,
        out: String,
    }

    impl Printer<'_> {
        fn node(&mut self, id: NodeId, depth: usize) {
            let indent = "  ".repeat(depth);
            let forest = self.forest;
            let Some(node) = forest.node(id) else {
                return;
            };
            if !node.is_leaf() && !self.seen.insert(id) {
                let _ = writeln!(self.out, "{indent}(see {id})");
                return;
            }
            match node {
                ForestNode::Or {
                    symbol,
                    span,
                    alternatives,
                } => {
                    let _ = writeln!(
                        self.out,
                        "{indent}{id} OR {} [{}, {}) {} readings",
                        self.grammar.symbol_name(*symbol),
                        span.start,
                        span.end,
                        alternatives.len()
                    );
                }
                ForestNode::And {
                    rule,
                    symbol,
                    span,
                    priority,
                    action,
                    ..
                } => {
                    let _ = write!(
                        self.out,
                        "{indent}{id} {} [{}, {}) {} p{priority}",
                        self.grammar.symbol_name(*symbol),
                        span.start,
                        span.end,
                        self.grammar.rule(*rule).name
                    );
                    if let Some(action) = action {
                        let _ = write!(self.out, " => {action}");
                    }
                    self.out.push('\n');
                }
                ForestNode::Leaf { token, .. } => {
                    let _ = writeln!(self.out, "{indent}{:?}", token_text(self.tokens, *token));
                }
            }
            for successor in node.successors() {
                self.node(*successor, depth + 1);
            }
        }
    }

    let Some(root) = forest.root() else {
        return String::from("(empty forest)\n");
    };
    let mut printer = Printer {
        forest,
        grammar,
        tokens,
        seen: HashSet::new(),
        out: String::new(),
    };
    printer.node(root, 0);
    printer.out
}

/// Dump every chart set with its items and back-links
#[must_use]
pub fn render_chart(chart: &Chart, grammar: &Grammar, tokens: &[Token]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "chart for {} ({} tokens, {} items)",
        chart.grammar(),
        chart.token_count(),
        chart.total_items()
    );
    for (position, set) in chart.sets().iter().enumerate() {
        let _ = write!(out, "== set {position} ({} items)", set.len());
        if position > 0 {
            let _ = write!(out, " after {:?}", token_text(tokens, position - 1));
        }
        out.push('\n');
        for (item, links) in set.iter() {
            let _ = write!(out, "  {}", item.display(grammar));
            let links: Vec<String> = links
                .iter()
                .map(|link| match link {
                    Link::Predicted => String::from("predict"),
                    Link::Scanned { token } => format!("scan {token}"),
                    Link::Completed { split, child } => {
                        format!("complete {} at {split}", grammar.rule(*child).name)
                    }
                })
                .collect();
            let _ = writeln!(out, "  [{}]", links.join("; "));
        }
    }
    out
}

/// Leftmost derivation steps, from the start symbol to the token sequence.
///
/// Each entry is one sentential form; elided material disappears in the
/// step that applies its empty rule.
#[must_use]
pub fn derivation_trace(derivation: &Derivation, grammar: &Grammar, tokens: &[Token]) -> Vec<String> {
    enum Form<'d> {
        Pending(&'d DerivationNode),
        Token(usize),
    }

    fn render(form: &[Form<'_>], grammar: &Grammar, tokens: &[Token]) -> String {
        let parts: Vec<&str> = form
            .iter()
            .map(|part| match part {
                Form::Pending(node) => grammar.symbol_name(node.lhs),
                Form::Token(token) => token_text(tokens, *token),
            })
            .collect();
        if parts.is_empty() {
            String::from("ε")
        } else {
            parts.join(" ")
        }
    }

    let mut form = vec![Form::Pending(derivation.root())];
    let mut steps = vec![render(&form, grammar, tokens)];
    while let Some((index, node)) = form.iter().enumerate().find_map(|(index, part)| match part {
        Form::Pending(node) => Some((index, *node)),
        Form::Token(_) => None,
    }) {
        let expansion = node.children.iter().map(|child| match child {
            DerivationChild::Node(child) => Form::Pending(child),
            DerivationChild::Leaf(token) => Form::Token(*token),
        });
        form.splice(index..=index, expansion);
        steps.push(render(&form, grammar, tokens));
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambit::chart::{ChartConfig, parse};
    use ambit::grammar::{GrammarBuilder, RuleSpec, nt, tag, word};
    use ambit::token::{TagSet, tokenize_words};

    fn grammar() -> Grammar {
        GrammarBuilder::new("edits", "1")
            .start("Command")
            .rule(
                RuleSpec::new("Command", [word("make"), nt("Target"), tag("comparative")])
                    .named("brightness")
                    .priority(5)
                    .action("adjust_brightness"),
            )
            .rule(
                RuleSpec::new("Command", [word("make"), nt("Target"), tag("comparative")])
                    .named("contrast")
                    .priority(5)
                    .action("adjust_contrast"),
            )
            .rule(RuleSpec::new("Target", [word("it")]).named("pronoun"))
            .build()
            .unwrap()
    }

    fn tokens(input: &str) -> Vec<Token> {
        tokenize_words(input, |word| {
            if word == "brighter" {
                ("ADJ".into(), TagSet::from_iter(["comparative".into()]))
            } else {
                ("WORD".into(), TagSet::new())
            }
        })
    }

    fn forest(grammar: &Grammar, tokens: &[Token]) -> Forest {
        let result = parse(grammar, tokens, &ChartConfig::default());
        Forest::build(grammar, &result.derivations, tokens.len())
    }

    #[test]
    fn test_forest_dot_shapes() {
        let grammar = grammar();
        let tokens = tokens("make it brighter");
        let dot = forest_to_dot(&forest(&grammar, &tokens), &grammar, &tokens);

        assert!(dot.starts_with("digraph Forest {"));
        assert!(dot.trim_end().ends_with('}'));
        assert_eq!(dot.matches("shape=diamond").count(), 1);
        assert!(dot.contains("brightness\\np5 / adjust_brightness"));
        assert!(dot.contains("contrast\\np5 / adjust_contrast"));
        assert!(dot.contains("label=\"brighter\""));
        assert!(dot.contains("[style=dashed]"));
        assert_eq!(dot.matches("penwidth=2").count(), 1);
    }

    #[test]
    fn test_forest_text_shares_nodes() {
        let grammar = grammar();
        let tokens = tokens("make it brighter");
        let text = render_forest(&forest(&grammar, &tokens), &grammar, &tokens);

        assert!(text.lines().next().unwrap().contains("OR Command [0, 3) 2 readings"));
        assert!(text.contains("(see "));
        assert_eq!(text.matches("pronoun").count(), 1);
    }

    #[test]
    fn test_empty_forest() {
        let grammar = grammar();
        let tokens = tokens("make it");
        let text = render_forest(&forest(&grammar, &tokens), &grammar, &tokens);
        assert_eq!(text, "(empty forest)\n");
    }

    #[test]
    fn test_derivation_and_trace() {
        let grammar = grammar();
        let tokens = tokens("make it brighter");
        let result = parse(&grammar, &tokens, &ChartConfig::default());
        let derivation = &result.derivations[0];

        let tree = render_derivation(derivation, &grammar, &tokens);
        assert!(tree.starts_with("Command [0, 3) "));
        assert!(tree.contains("  Target [1, 2) pronoun\n"));
        assert!(tree.contains("    \"it\"\n"));

        let trace = derivation_trace(derivation, &grammar, &tokens);
        assert_eq!(
            trace,
            ["Command", "make Target brighter", "make it brighter"]
        );
    }

    #[test]
    fn test_chart_dump() {
        let grammar = grammar();
        let tokens = tokens("make it brighter");
        let result = parse(&grammar, &tokens, &ChartConfig::default());
        let dump = render_chart(&result.chart, &grammar, &tokens);

        assert!(dump.starts_with("chart for edits@1 (3 tokens"));
        assert_eq!(dump.matches("== set ").count(), 4);
        assert!(dump.contains("== set 3 ("));
        assert!(dump.contains("after \"brighter\""));
        assert!(dump.contains("predict"));
        assert!(dump.contains("complete pronoun at 1"));
    }
}
