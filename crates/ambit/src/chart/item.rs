//! Chart data structures: items, derivation links and chart sets

use crate::grammar::{Grammar, RhsSymbol, RuleId};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::fmt;

/// An Earley item: a rule with a dot position and the chart position where
/// recognition of the rule started.
///
/// Items live in the chart set of the position they were recognized up to,
/// so `origin <= position` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EarleyItem {
    pub rule: RuleId,
    /// Number of right-hand symbols already recognized
    pub dot: usize,
    pub origin: usize,
}

impl EarleyItem {
    #[must_use]
    pub const fn new(rule: RuleId, dot: usize, origin: usize) -> Self {
        Self { rule, dot, origin }
    }

    /// Item at dot zero, predicted at `origin`
    #[must_use]
    pub const fn initial(rule: RuleId, origin: usize) -> Self {
        Self::new(rule, 0, origin)
    }

    #[must_use]
    pub const fn advance(self) -> Self {
        Self::new(self.rule, self.dot + 1, self.origin)
    }

    /// The item this one was advanced from; `None` at dot zero
    #[must_use]
    pub const fn retreat(self) -> Option<Self> {
        match self.dot.checked_sub(1) {
            Some(dot) => Some(Self::new(self.rule, dot, self.origin)),
            None => None,
        }
    }

    #[must_use]
    pub fn is_complete(&self, grammar: &Grammar) -> bool {
        self.dot >= grammar.rule(self.rule).rhs.len()
    }

    /// Symbol after the dot, if any
    #[must_use]
    pub fn next_symbol<'g>(&self, grammar: &'g Grammar) -> Option<&'g RhsSymbol> {
        grammar.rule(self.rule).rhs.get(self.dot)
    }

    /// Render as `Lhs -> a • B c, origin`
    #[must_use]
    pub fn display(&self, grammar: &Grammar) -> String {
        let rule = grammar.rule(self.rule);
        let mut out = format!("{} ->", grammar.symbol_name(rule.lhs));
        for (index, symbol) in rule.rhs.iter().enumerate() {
            if index == self.dot {
                out.push_str(" •");
            }
            out.push(' ');
            match symbol {
                RhsSymbol::NonTerminal(nt) => out.push_str(grammar.symbol_name(*nt)),
                RhsSymbol::Terminal(t) => out.push_str(&t.to_string()),
            }
        }
        if self.dot >= rule.rhs.len() {
            out.push_str(" •");
        }
        out.push_str(&format!(", {}", self.origin));
        out
    }
}

impl fmt::Display for EarleyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} @{} from {})", self.rule, self.dot, self.origin)
    }
}

/// How an item came to be in its chart set.
///
/// Links are back-pointers used to rebuild derivations. An item reached by
/// several distinct paths keeps one link per path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link {
    /// Dot-zero item added for a pending non-terminal
    Predicted,
    /// The predecessor item at `token` consumed that token
    Scanned { token: usize },
    /// The predecessor item at `split` waited for a non-terminal that
    /// `child` recognized from `split` up to this item's position
    Completed { split: usize, child: RuleId },
}

/// Items recognized up to one token boundary, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSet {
    items: IndexMap<EarleyItem, SmallVec<[Link; 2]>, ahash::RandomState>,
}

impl ChartSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` with `link`. Returns `true` if the item is new to the set.
    ///
    /// A link already recorded for the item is not duplicated.
    pub fn insert(&mut self, item: EarleyItem, link: Link) -> bool {
        match self.items.get_mut(&item) {
            Some(links) => {
                if !links.contains(&link) {
                    links.push(link);
                }
                false
            }
            None => {
                let mut links = SmallVec::new();
                links.push(link);
                self.items.insert(item, links);
                true
            }
        }
    }

    #[must_use]
    pub fn contains(&self, item: &EarleyItem) -> bool {
        self.items.contains_key(item)
    }

    /// Derivation links of `item`; empty when the item is absent
    #[must_use]
    pub fn links(&self, item: &EarleyItem) -> &[Link] {
        self.items.get(item).map_or(&[], |links| links.as_slice())
    }

    /// Number of distinct paths that produced `item`
    #[must_use]
    pub fn multiplicity(&self, item: &EarleyItem) -> usize {
        self.links(item).len()
    }

    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<EarleyItem> {
        self.items.get_index(index).map(|(item, _)| *item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EarleyItem, &[Link])> {
        self.items.iter().map(|(item, links)| (item, links.as_slice()))
    }

    pub fn items(&self) -> impl Iterator<Item = EarleyItem> + '_ {
        self.items.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
