//! # Parse Forest
//!
//! A shared packed parse forest over the derivations of one input.
//!
//! ## Overview
//!
//! The forest is an index-based DAG. Nodes live in an arena owned by the
//! [`Forest`] and refer to each other by [`NodeId`]:
//!
//! - [`ForestNode::And`]: one rule application, with its children.
//! - [`ForestNode::Or`]: several rule applications for the same symbol over
//!   the same span. This is an ambiguity point.
//! - [`ForestNode::Leaf`]: one consumed token.
//!
//! Identical sub-derivations are stored once. Ids are assigned in post-order
//! while the forest is built, so every child id is smaller than its parent's
//! and identical derivation lists always produce identical forests.
//!
//! ## Usage
//!
//! ```rust
//! use ambit::chart::{ChartConfig, parse};
//! use ambit::forest::{Forest, Severity};
//! use ambit::grammar::{GrammarBuilder, RuleSpec, word};
//! use ambit::token::{TagSet, tokenize_words};
//!
//! let grammar = GrammarBuilder::new("demo", "1")
//!     .start("S")
//!     .rule(RuleSpec::new("S", [word("undo")]).priority(2).action("undo_last"))
//!     .rule(RuleSpec::new("S", [word("undo")]).priority(2).action("undo_all"))
//!     .build()?;
//! let tokens = tokenize_words("undo", |_| ("WORD".into(), TagSet::new()));
//! let result = parse(&grammar, &tokens, &ChartConfig::default());
//! let forest = Forest::build(&grammar, &result.derivations, tokens.len());
//! let points = forest.ambiguity_points(&grammar, &tokens);
//! assert_eq!(points.len(), 1);
//! assert_eq!(points[0].severity, Severity::High);
//! # Ok::<(), ambit::grammar::GrammarError>(())
//! ```

pub mod ambiguity;
pub mod builder;
pub mod prune;

pub use ambiguity::{AlternativeInfo, AmbiguityPoint, Severity, classify};

use crate::chart::{Derivation, DerivationChild, DerivationNode};
use crate::grammar::{Grammar, RuleId, Symbol};
use crate::text::TokenSpan;
use crate::token::Token;
use compact_str::CompactString;
use hashbrown::HashMap;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Index of a node in its forest's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Forest node
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(tag = "type", rename_all = "snake_case"))]
pub enum ForestNode {
    /// Competing rule applications for `symbol` over `span`
    Or {
        symbol: Symbol,
        span: TokenSpan,
        alternatives: SmallVec<[NodeId; 2]>,
    },
    /// A single rule application
    And {
        rule: RuleId,
        symbol: Symbol,
        span: TokenSpan,
        children: SmallVec<[NodeId; 4]>,
        priority: i32,
        action: Option<CompactString>,
    },
    /// A consumed token
    Leaf { token: usize, span: TokenSpan },
}

impl ForestNode {
    #[must_use]
    pub const fn span(&self) -> TokenSpan {
        match self {
            Self::Or { span, .. } | Self::And { span, .. } | Self::Leaf { span, .. } => *span,
        }
    }

    /// Non-terminal this node derives; `None` for leaves
    #[must_use]
    pub const fn symbol(&self) -> Option<Symbol> {
        match self {
            Self::Or { symbol, .. } | Self::And { symbol, .. } => Some(*symbol),
            Self::Leaf { .. } => None,
        }
    }

    /// Child ids: alternatives for Or nodes, children for And nodes
    #[must_use]
    pub fn successors(&self) -> &[NodeId] {
        match self {
            Self::Or { alternatives, .. } => alternatives,
            Self::And { children, .. } => children,
            Self::Leaf { .. } => &[],
        }
    }

    #[must_use]
    pub const fn is_or(&self) -> bool {
        matches!(self, Self::Or { .. })
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Priority of an And node; `None` otherwise
    #[must_use]
    pub const fn priority(&self) -> Option<i32> {
        match self {
            Self::And { priority, .. } => Some(*priority),
            _ => None,
        }
    }
}

/// Node counts of a forest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ForestStats {
    pub nodes: usize,
    pub or_nodes: usize,
    pub and_nodes: usize,
    pub leaves: usize,
    /// Largest alternative count of any Or node
    pub max_alternatives: usize,
    /// Number of derivations the forest packs, saturating
    pub derivations: u64,
}

/// Derivations enumerated back out of a forest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    pub derivations: Vec<Derivation>,
    pub truncated: bool,
}

/// Shared packed parse forest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Forest {
    nodes: Vec<ForestNode>,
    root: Option<NodeId>,
    token_count: usize,
}

impl Forest {
    /// Pack `derivations` into a forest; see [`builder`]
    #[must_use]
    pub fn build(grammar: &Grammar, derivations: &[Derivation], token_count: usize) -> Self {
        builder::ForestBuilder::new(grammar).build(derivations, token_count)
    }

    /// Forest with no derivations
    #[must_use]
    pub const fn empty(token_count: usize) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            token_count,
        }
    }

    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[must_use]
    pub fn root_node(&self) -> Option<&ForestNode> {
        self.root.and_then(|id| self.node(id))
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ForestNode> {
        self.nodes.get(id.index())
    }

    /// All nodes in id order
    #[must_use]
    pub fn nodes(&self) -> &[ForestNode] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ForestNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId::from_index(index), node))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub const fn token_count(&self) -> usize {
        self.token_count
    }

    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.nodes.iter().any(ForestNode::is_or)
    }

    /// Ids of every Or node, in id order
    #[must_use]
    pub fn or_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.is_or())
            .map(|(id, _)| id)
            .collect()
    }

    pub(crate) fn from_parts(nodes: Vec<ForestNode>, root: Option<NodeId>, token_count: usize) -> Self {
        Self {
            nodes,
            root,
            token_count,
        }
    }

    /// Number of derivations packed below `id`, saturating at `u64::MAX`
    #[must_use]
    pub fn count_derivations(&self, id: NodeId) -> u64 {
        let mut counts: Vec<u64> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let count = match node {
                ForestNode::Leaf { .. } => 1,
                ForestNode::And { children, .. } => children
                    .iter()
                    .fold(1u64, |acc, child| acc.saturating_mul(counts[child.index()])),
                ForestNode::Or { alternatives, .. } => alternatives
                    .iter()
                    .fold(0u64, |acc, alt| acc.saturating_add(counts[alt.index()])),
            };
            counts.push(count);
        }
        counts.get(id.index()).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn stats(&self) -> ForestStats {
        let mut stats = ForestStats {
            nodes: self.nodes.len(),
            ..ForestStats::default()
        };
        for node in &self.nodes {
            match node {
                ForestNode::Or { alternatives, .. } => {
                    stats.or_nodes += 1;
                    stats.max_alternatives = stats.max_alternatives.max(alternatives.len());
                }
                ForestNode::And { .. } => stats.and_nodes += 1,
                ForestNode::Leaf { .. } => stats.leaves += 1,
            }
        }
        stats.derivations = self.root.map_or(0, |root| self.count_derivations(root));
        stats
    }

    /// Ambiguity points in id order; see [`ambiguity`]
    #[must_use]
    pub fn ambiguity_points(&self, grammar: &Grammar, tokens: &[Token]) -> Vec<AmbiguityPoint> {
        ambiguity::collect(self, grammar, tokens)
    }

    /// Copy of the forest without Or alternatives below `min_priority`;
    /// see [`prune`]
    #[must_use]
    pub fn pruned(&self, min_priority: i32) -> Self {
        prune::prune(self, min_priority)
    }

    /// Enumerate up to `limit` derivations, Or alternatives in order
    #[must_use]
    pub fn derivations(&self, limit: usize) -> Enumeration {
        let Some(root) = self.root else {
            return Enumeration::default();
        };
        let mut enumerator = Enumerator {
            forest: self,
            limit: limit.max(1),
            memo: HashMap::default(),
            truncated: false,
        };
        let derivations = enumerator
            .expand(root)
            .iter()
            .filter_map(|child| match child {
                DerivationChild::Node(node) => Some(Derivation::new(Arc::clone(node))),
                DerivationChild::Leaf(_) => None,
            })
            .collect();
        Enumeration {
            derivations,
            truncated: enumerator.truncated,
        }
    }

    /// Check the structural invariants: children precede parents, spans
    /// nest, Or nodes are non-empty and their alternatives are And nodes
    /// sharing the Or node's symbol and span.
    #[must_use]
    pub fn check_invariants(&self) -> bool {
        self.iter().all(|(id, node)| {
            let span = node.span();
            let successors_ok = node.successors().iter().all(|child| {
                child.index() < id.index()
                    && self
                        .node(*child)
                        .is_some_and(|child| span.contains(child.span()))
            });
            let or_ok = match node {
                ForestNode::Or {
                    symbol,
                    alternatives,
                    ..
                } => {
                    alternatives.len() >= 2
                        && alternatives.iter().all(|alt| {
                            matches!(
                                self.node(*alt),
                                Some(ForestNode::And { symbol: s, span: sp, .. })
                                    if s == symbol && *sp == span
                            )
                        })
                }
                _ => true,
            };
            successors_ok && or_ok
        })
    }
}

struct Enumerator<'a> {
    forest: &'a Forest,
    limit: usize,
    memo: HashMap<NodeId, Rc<Vec<DerivationChild>>, ahash::RandomState>,
    truncated: bool,
}

impl Enumerator<'_> {
    fn expand(&mut self, id: NodeId) -> Rc<Vec<DerivationChild>> {
        if let Some(memo) = self.memo.get(&id) {
            return Rc::clone(memo);
        }
        let mut out = Vec::new();
        match self.forest.node(id) {
            Some(ForestNode::Leaf { token, .. }) => out.push(DerivationChild::Leaf(*token)),
            Some(ForestNode::Or { alternatives, .. }) => {
                for alternative in alternatives {
                    for child in self.expand(*alternative).iter() {
                        if out.len() >= self.limit {
                            self.truncated = true;
                            break;
                        }
                        out.push(child.clone());
                    }
                }
            }
            Some(ForestNode::And {
                rule,
                symbol,
                span,
                children,
                ..
            }) => {
                let mut sequences: Vec<Vec<DerivationChild>> = vec![Vec::new()];
                for child in children {
                    let expansions = self.expand(*child);
                    let mut next = Vec::new();
                    'outer: for prefix in &sequences {
                        for expansion in expansions.iter() {
                            if next.len() >= self.limit {
                                self.truncated = true;
                                break 'outer;
                            }
                            let mut sequence = prefix.clone();
                            sequence.push(expansion.clone());
                            next.push(sequence);
                        }
                    }
                    sequences = next;
                }
                out.extend(sequences.into_iter().map(|children| {
                    DerivationChild::Node(Arc::new(DerivationNode {
                        rule: *rule,
                        lhs: *symbol,
                        span: *span,
                        children,
                    }))
                }));
            }
            None => {}
        }
        let out = Rc::new(out);
        self.memo.insert(id, Rc::clone(&out));
        out
    }
}
