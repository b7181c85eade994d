//! Packing derivations into a forest.
//!
//! Every derivation node is filed under a slot `(symbol, span)`. Within a
//! slot, rule applications are deduplicated by `(rule, child slots)`, so a
//! sub-derivation shared by many trees is stored once. Slots with one packed
//! alternative become And nodes; slots with several become an Or node over
//! one And node per alternative.

use crate::chart::{Derivation, DerivationChild, DerivationNode};
use crate::forest::{Forest, ForestNode, NodeId};
use crate::grammar::{Grammar, RuleId, Symbol};
use crate::text::TokenSpan;
use hashbrown::HashMap;
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlotKey {
    symbol: Symbol,
    span: TokenSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ChildKey {
    Slot(SlotKey),
    Leaf(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Packed {
    rule: RuleId,
    children: SmallVec<[ChildKey; 4]>,
}

/// Builds a [`Forest`] from extracted derivations
#[derive(Debug)]
pub struct ForestBuilder<'g> {
    grammar: &'g Grammar,
    slots: IndexMap<SlotKey, IndexSet<Packed, ahash::RandomState>, ahash::RandomState>,
}

impl<'g> ForestBuilder<'g> {
    #[must_use]
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            slots: IndexMap::default(),
        }
    }

    /// Pack `derivations`. All derivations must span the whole input.
    #[must_use]
    pub fn build(mut self, derivations: &[Derivation], token_count: usize) -> Forest {
        let mut root_slot = None;
        for derivation in derivations {
            let key = self.file(derivation.root());
            root_slot.get_or_insert(key);
        }
        let Some(root_slot) = root_slot else {
            return Forest::empty(token_count);
        };

        let mut emitter = Emitter {
            grammar: self.grammar,
            slots: &self.slots,
            nodes: Vec::new(),
            slot_ids: HashMap::default(),
            leaf_ids: HashMap::default(),
        };
        let root = emitter.emit_slot(root_slot);
        let nodes = emitter.nodes;

        tracing::debug!(
            derivations = derivations.len(),
            slots = self.slots.len(),
            nodes = nodes.len(),
            "built forest"
        );

        Forest::from_parts(nodes, Some(root), token_count)
    }

    /// File `node` and its descendants under their slots, children first
    fn file(&mut self, node: &DerivationNode) -> SlotKey {
        let children = node
            .children
            .iter()
            .map(|child| match child {
                DerivationChild::Leaf(token) => ChildKey::Leaf(*token),
                DerivationChild::Node(child) => ChildKey::Slot(self.file(child)),
            })
            .collect();
        let key = SlotKey {
            symbol: node.lhs,
            span: node.span,
        };
        self.slots.entry(key).or_default().insert(Packed {
            rule: node.rule,
            children,
        });
        key
    }
}

struct Emitter<'a> {
    grammar: &'a Grammar,
    slots: &'a IndexMap<SlotKey, IndexSet<Packed, ahash::RandomState>, ahash::RandomState>,
    nodes: Vec<ForestNode>,
    slot_ids: HashMap<SlotKey, NodeId, ahash::RandomState>,
    leaf_ids: HashMap<usize, NodeId, ahash::RandomState>,
}

impl Emitter<'_> {
    fn push(&mut self, node: ForestNode) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn emit_leaf(&mut self, token: usize) -> NodeId {
        if let Some(id) = self.leaf_ids.get(&token) {
            return *id;
        }
        let id = self.push(ForestNode::Leaf {
            token,
            span: TokenSpan::new(token, token + 1),
        });
        self.leaf_ids.insert(token, id);
        id
    }

    fn emit_packed(&mut self, key: SlotKey, packed: &Packed) -> NodeId {
        let grammar = self.grammar;
        let children = packed
            .children
            .iter()
            .map(|child| match child {
                ChildKey::Leaf(token) => self.emit_leaf(*token),
                ChildKey::Slot(slot) => self.emit_slot(*slot),
            })
            .collect();
        let rule = grammar.rule(packed.rule);
        self.push(ForestNode::And {
            rule: packed.rule,
            symbol: key.symbol,
            span: key.span,
            children,
            priority: rule.priority,
            action: rule.action.clone(),
        })
    }

    fn emit_slot(&mut self, key: SlotKey) -> NodeId {
        if let Some(id) = self.slot_ids.get(&key) {
            return *id;
        }
        let slots = self.slots;
        let alternatives = &slots[&key];
        let id = if alternatives.len() == 1 {
            self.emit_packed(key, &alternatives[0])
        } else {
            let alternatives = alternatives
                .iter()
                .map(|packed| self.emit_packed(key, packed))
                .collect();
            self.push(ForestNode::Or {
                symbol: key.symbol,
                span: key.span,
                alternatives,
            })
        };
        self.slot_ids.insert(key, id);
        id
    }
}
