//! Priority pruning.
//!
//! Only Or alternatives are candidates for removal: an unambiguous And node
//! is the sole reading of its span and stays regardless of priority. An Or
//! node whose alternatives all fall below the threshold keeps its best one,
//! and an Or node left with a single alternative is replaced by it.

use crate::forest::{Forest, ForestNode, NodeId};
use hashbrown::HashMap;
use smallvec::SmallVec;

struct Pruner<'a> {
    source: &'a Forest,
    min_priority: i32,
    nodes: Vec<ForestNode>,
    mapped: HashMap<NodeId, NodeId, ahash::RandomState>,
}

impl Pruner<'_> {
    fn push(&mut self, node: ForestNode) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Alternatives that survive the threshold, never empty for a
    /// non-empty input
    fn surviving(&self, alternatives: &[NodeId]) -> SmallVec<[NodeId; 2]> {
        let priority = |id: &NodeId| {
            self.source
                .node(*id)
                .and_then(ForestNode::priority)
                .unwrap_or(i32::MIN)
        };
        let kept: SmallVec<[NodeId; 2]> = alternatives
            .iter()
            .copied()
            .filter(|id| priority(id) >= self.min_priority)
            .collect();
        if !kept.is_empty() {
            return kept;
        }
        // Best remaining alternative; the first one wins ties.
        let mut best: Option<NodeId> = None;
        for id in alternatives {
            if best.is_none_or(|b| priority(id) > priority(&b)) {
                best = Some(*id);
            }
        }
        best.into_iter().collect()
    }

    fn rebuild(&mut self, id: NodeId) -> Option<NodeId> {
        if let Some(mapped) = self.mapped.get(&id) {
            return Some(*mapped);
        }
        let source = self.source;
        let new_id = match source.node(id)? {
            ForestNode::Leaf { token, span } => self.push(ForestNode::Leaf {
                token: *token,
                span: *span,
            }),
            ForestNode::And {
                rule,
                symbol,
                span,
                children,
                priority,
                action,
            } => {
                let mut rebuilt = SmallVec::with_capacity(children.len());
                for child in children {
                    rebuilt.push(self.rebuild(*child)?);
                }
                self.push(ForestNode::And {
                    rule: *rule,
                    symbol: *symbol,
                    span: *span,
                    children: rebuilt,
                    priority: *priority,
                    action: action.clone(),
                })
            }
            ForestNode::Or {
                symbol,
                span,
                alternatives,
            } => {
                let kept = self.surviving(alternatives);
                if kept.len() == 1 {
                    self.rebuild(kept[0])?
                } else {
                    let mut rebuilt = SmallVec::with_capacity(kept.len());
                    for alternative in kept {
                        rebuilt.push(self.rebuild(alternative)?);
                    }
                    self.push(ForestNode::Or {
                        symbol: *symbol,
                        span: *span,
                        alternatives: rebuilt,
                    })
                }
            }
        };
        self.mapped.insert(id, new_id);
        Some(new_id)
    }
}

pub(crate) fn prune(forest: &Forest, min_priority: i32) -> Forest {
    let Some(root) = forest.root() else {
        return forest.clone();
    };
    let mut pruner = Pruner {
        source: forest,
        min_priority,
        nodes: Vec::with_capacity(forest.len()),
        mapped: HashMap::default(),
    };
    let new_root = pruner.rebuild(root);
    tracing::debug!(
        min_priority,
        before = forest.len(),
        after = pruner.nodes.len(),
        "pruned forest"
    );
    Forest::from_parts(pruner.nodes, new_root, forest.token_count())
}
