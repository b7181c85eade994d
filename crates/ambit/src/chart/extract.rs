//! Bounded derivation extraction from a successful chart.
//!
//! The number of derivations can grow exponentially with input length under
//! an ambiguous grammar, so every intermediate list is capped at the
//! configured limit and a `truncated` flag reports when anything was cut.

use crate::chart::item::{EarleyItem, Link};
use crate::chart::parser::Chart;
use crate::grammar::{Grammar, RuleId, Symbol};
use crate::text::TokenSpan;
use crate::token::Token;
use hashbrown::HashMap;
use std::rc::Rc;
use std::sync::Arc;

/// A child of a rule application: either a sub-derivation or the index of a
/// consumed token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DerivationChild {
    Node(Arc<DerivationNode>),
    Leaf(usize),
}

impl DerivationChild {
    #[must_use]
    pub fn span(&self) -> TokenSpan {
        match self {
            Self::Node(node) => node.span,
            Self::Leaf(token) => TokenSpan::new(*token, token + 1),
        }
    }
}

/// One rule application in a derivation tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationNode {
    pub rule: RuleId,
    pub lhs: Symbol,
    pub span: TokenSpan,
    pub children: Vec<DerivationChild>,
}

impl DerivationNode {
    fn is_sound(&self, grammar: &Grammar) -> bool {
        if self.children.len() != grammar.rule(self.rule).rhs.len() {
            return false;
        }
        let mut cursor = self.span.start;
        for child in &self.children {
            let span = child.span();
            if span.start != cursor || span.end < span.start {
                return false;
            }
            if let DerivationChild::Node(node) = child
                && !node.is_sound(grammar)
            {
                return false;
            }
            cursor = span.end;
        }
        cursor == self.span.end
    }
}

/// A complete, immutable derivation tree. Subtrees are shared via [`Arc`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Derivation {
    root: Arc<DerivationNode>,
}

impl Derivation {
    #[must_use]
    pub const fn new(root: Arc<DerivationNode>) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &DerivationNode {
        &self.root
    }

    #[must_use]
    pub fn span(&self) -> TokenSpan {
        self.root.span
    }

    /// Rule applications in pre-order
    #[must_use]
    pub fn nodes(&self) -> Vec<&DerivationNode> {
        let mut out = Vec::new();
        let mut stack = vec![self.root.as_ref()];
        while let Some(node) = stack.pop() {
            out.push(node);
            for child in node.children.iter().rev() {
                if let DerivationChild::Node(child) = child {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// Applied rules in pre-order
    #[must_use]
    pub fn rules(&self) -> Vec<RuleId> {
        self.nodes().into_iter().map(|node| node.rule).collect()
    }

    /// Indices of consumed tokens, left to right
    #[must_use]
    pub fn leaves(&self) -> Vec<usize> {
        let mut leaves: Vec<usize> = self
            .nodes()
            .into_iter()
            .flat_map(|node| node.children.iter())
            .filter_map(|child| match child {
                DerivationChild::Leaf(token) => Some(*token),
                DerivationChild::Node(_) => None,
            })
            .collect();
        leaves.sort_unstable();
        leaves
    }

    /// Check that every node's children tile its span exactly and that the
    /// root covers `token_count` tokens.
    #[must_use]
    pub fn is_sound(&self, grammar: &Grammar, token_count: usize) -> bool {
        self.root.span == TokenSpan::new(0, token_count) && self.root.is_sound(grammar)
    }

    /// Render as nested brackets, e.g. `(Command make (Target it))`
    #[must_use]
    pub fn bracketed(&self, grammar: &Grammar, tokens: &[Token]) -> String {
        fn walk(node: &DerivationNode, grammar: &Grammar, tokens: &[Token], out: &mut String) {
            out.push('(');
            out.push_str(grammar.symbol_name(node.lhs));
            for child in &node.children {
                out.push(' ');
                match child {
                    DerivationChild::Leaf(token) => {
                        out.push_str(tokens.get(*token).map_or("?", |t| t.text.as_str()));
                    }
                    DerivationChild::Node(node) => walk(node, grammar, tokens, out),
                }
            }
            out.push(')');
        }
        let mut out = String::new();
        walk(&self.root, grammar, tokens, &mut out);
        out
    }
}

/// Derivations pulled out of a chart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub derivations: Vec<Derivation>,
    /// Set when the derivation cap cut off at least one alternative
    pub truncated: bool,
}

type Sequences = Rc<Vec<Vec<DerivationChild>>>;

struct Extractor<'a> {
    chart: &'a Chart,
    grammar: &'a Grammar,
    limit: usize,
    sequences: HashMap<(usize, EarleyItem), Sequences, ahash::RandomState>,
    trees: HashMap<(usize, EarleyItem), Rc<Vec<Arc<DerivationNode>>>, ahash::RandomState>,
    truncated: bool,
}

impl Extractor<'_> {
    /// All child sequences recognized for `item` up to `position`
    fn sequences(&mut self, position: usize, item: EarleyItem) -> Sequences {
        if let Some(memo) = self.sequences.get(&(position, item)) {
            return Rc::clone(memo);
        }

        let mut out: Vec<Vec<DerivationChild>> = Vec::new();
        match item.retreat() {
            None => out.push(Vec::new()),
            Some(previous) => {
                for link in self.chart.links(position, &item).to_vec() {
                    match link {
                        Link::Predicted => {}
                        Link::Scanned { token } => {
                            for prefix in self.sequences(token, previous).iter() {
                                self.push(&mut out, prefix, DerivationChild::Leaf(token));
                            }
                        }
                        Link::Completed { split, child } => {
                            let prefixes = self.sequences(split, previous);
                            let length = self.grammar.rule(child).rhs.len();
                            let subtrees = self.trees(position, EarleyItem::new(child, length, split));
                            for prefix in prefixes.iter() {
                                for subtree in subtrees.iter() {
                                    self.push(
                                        &mut out,
                                        prefix,
                                        DerivationChild::Node(Arc::clone(subtree)),
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }

        let out = Rc::new(out);
        self.sequences.insert((position, item), Rc::clone(&out));
        out
    }

    /// Trees for a complete `item` ending at `position`
    fn trees(&mut self, position: usize, item: EarleyItem) -> Rc<Vec<Arc<DerivationNode>>> {
        if let Some(memo) = self.trees.get(&(position, item)) {
            return Rc::clone(memo);
        }
        let lhs = self.grammar.rule(item.rule).lhs;
        let span = TokenSpan::new(item.origin, position);
        let trees: Vec<_> = self
            .sequences(position, item)
            .iter()
            .map(|children| {
                Arc::new(DerivationNode {
                    rule: item.rule,
                    lhs,
                    span,
                    children: children.clone(),
                })
            })
            .collect();
        let trees = Rc::new(trees);
        self.trees.insert((position, item), Rc::clone(&trees));
        trees
    }

    fn push(&mut self, out: &mut Vec<Vec<DerivationChild>>, prefix: &[DerivationChild], next: DerivationChild) {
        if out.len() >= self.limit {
            self.truncated = true;
            return;
        }
        let mut sequence = Vec::with_capacity(prefix.len() + 1);
        sequence.extend_from_slice(prefix);
        sequence.push(next);
        out.push(sequence);
    }
}

/// Rebuild up to `limit` derivations from the accepting items of `chart`.
///
/// Returns an empty extraction for charts that did not succeed.
#[must_use]
pub fn extract(chart: &Chart, grammar: &Grammar, limit: usize) -> Extraction {
    if !chart.is_success() {
        return Extraction::default();
    }
    let limit = limit.max(1);
    let mut extractor = Extractor {
        chart,
        grammar,
        limit,
        sequences: HashMap::default(),
        trees: HashMap::default(),
        truncated: false,
    };

    let end = chart.token_count();
    let mut derivations = Vec::new();
    for item in chart.accepting_items(grammar) {
        for tree in extractor.trees(end, item).iter() {
            if derivations.len() >= limit {
                extractor.truncated = true;
                break;
            }
            derivations.push(Derivation::new(Arc::clone(tree)));
        }
    }

    tracing::debug!(
        derivations = derivations.len(),
        truncated = extractor.truncated,
        "extracted derivations"
    );

    Extraction {
        derivations,
        truncated: extractor.truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartConfig, ChartParser};
    use crate::grammar::{GrammarBuilder, RuleSpec, nt, word};
    use crate::token::{TagSet, tokenize_words};

    fn words(input: &str) -> Vec<Token> {
        tokenize_words(input, |_| ("WORD".into(), TagSet::new()))
    }

    fn arithmetic() -> Grammar {
        GrammarBuilder::new("sums", "1")
            .start("E")
            .rule(RuleSpec::new("E", [nt("E"), word("plus"), nt("E")]))
            .rule(RuleSpec::new("E", [word("one")]))
            .build()
            .unwrap()
    }

    fn derivations(grammar: &Grammar, input: &str, limit: usize) -> (Vec<Token>, Extraction) {
        let tokens = words(input);
        let chart = ChartParser::new(grammar, ChartConfig::default()).parse(&tokens);
        let extraction = extract(&chart, grammar, limit);
        (tokens, extraction)
    }

    #[test]
    fn test_single_derivation() {
        let grammar = arithmetic();
        let (tokens, extraction) = derivations(&grammar, "one plus one", 10);
        assert_eq!(extraction.derivations.len(), 1);
        assert!(!extraction.truncated);
        let derivation = &extraction.derivations[0];
        assert_eq!(
            derivation.bracketed(&grammar, &tokens),
            "(E (E one) plus (E one))"
        );
        assert_eq!(derivation.leaves(), vec![0, 1, 2]);
        assert!(derivation.is_sound(&grammar, tokens.len()));
    }

    #[test]
    fn test_all_bracketings_are_found() {
        let grammar = arithmetic();
        // Catalan(3) = 5 bracketings of four operands.
        let (tokens, extraction) = derivations(&grammar, "one plus one plus one plus one", 100);
        assert_eq!(extraction.derivations.len(), 5);
        assert!(!extraction.truncated);
        let rendered: std::collections::HashSet<_> = extraction
            .derivations
            .iter()
            .map(|d| d.bracketed(&grammar, &tokens))
            .collect();
        assert_eq!(rendered.len(), 5);
        for derivation in &extraction.derivations {
            assert!(derivation.is_sound(&grammar, tokens.len()));
        }
    }

    #[test]
    fn test_limit_truncates() {
        let grammar = arithmetic();
        let (_, extraction) = derivations(&grammar, "one plus one plus one plus one", 2);
        assert_eq!(extraction.derivations.len(), 2);
        assert!(extraction.truncated);
    }

    #[test]
    fn test_failed_chart_extracts_nothing() {
        let grammar = arithmetic();
        let (_, extraction) = derivations(&grammar, "one plus", 10);
        assert!(extraction.derivations.is_empty());
        assert!(!extraction.truncated);
    }

    #[test]
    fn test_nullable_children_have_empty_spans() {
        let grammar = GrammarBuilder::new("opt", "1")
            .start("S")
            .rule(RuleSpec::new("S", [nt("Det"), word("cat")]))
            .rule(RuleSpec::new("Det", []))
            .build()
            .unwrap();
        let (tokens, extraction) = derivations(&grammar, "cat", 10);
        assert_eq!(extraction.derivations.len(), 1);
        let root = extraction.derivations[0].root();
        assert_eq!(root.children[0].span(), TokenSpan::new(0, 0));
        assert!(extraction.derivations[0].is_sound(&grammar, tokens.len()));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let grammar = arithmetic();
        let (_, first) = derivations(&grammar, "one plus one plus one plus one", 100);
        let (_, second) = derivations(&grammar, "one plus one plus one plus one", 100);
        assert_eq!(first, second);
    }
}
