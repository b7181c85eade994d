//! # Grammar Module
//!
//! Named, versioned rule sets consumed by the chart parser.
//!
//! ## Overview
//!
//! Grammars are authored elsewhere and handed to this crate either through
//! [`GrammarBuilder`] or, with the `serialize` feature, as a JSON
//! [`GrammarSpec`]. A built [`Grammar`] is immutable: every rule has a stable
//! [`RuleId`], an interned left-hand [`Symbol`], a right-hand sequence of
//! [`RhsSymbol`]s, a priority, an optional semantic-action tag and a
//! description.
//!
//! ## Usage
//!
//! ```rust
//! use ambit::grammar::{GrammarBuilder, RuleSpec, nt, word, tag};
//!
//! let grammar = GrammarBuilder::new("edits", "1")
//!     .start("Command")
//!     .rule(RuleSpec::new("Command", [word("make"), nt("Target"), tag("comparative")])
//!         .priority(5)
//!         .action("adjust"))
//!     .rule(RuleSpec::new("Target", [word("it")]))
//!     .build()?;
//! assert_eq!(grammar.rules().len(), 2);
//! # Ok::<(), ambit::grammar::GrammarError>(())
//! ```
//!
//! Terminals match tokens by literal word, token kind, or tag; see
//! [`Terminal`].

pub mod builder;
pub mod validate;

pub use builder::*;
pub use validate::*;

use crate::token::{Token, normalize};
use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};
use lasso::{RodeoReader, Spur};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Priority a rule gets when the grammar author does not set one
pub const DEFAULT_PRIORITY: i32 = 0;

/// Interned non-terminal name
pub type Symbol = Spur;

/// Stable index of a rule inside its grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct RuleId(u32);

impl RuleId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A terminal symbol and how it matches a token
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum Terminal {
    /// Normalized token text equals the (normalized) literal
    Word(CompactString),
    /// Token kind equals the given kind
    Kind(CompactString),
    /// Token carries the given tag
    Tag(CompactString),
}

impl Terminal {
    /// Check whether `token` satisfies this terminal
    #[must_use]
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Self::Word(literal) => token.normalized_text() == *literal,
            Self::Kind(kind) => token.kind == *kind,
            Self::Tag(tag) => token.has_tag(tag),
        }
    }

    /// Literal terminals name the exact word the user must type
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Word(_))
    }

    pub(crate) fn normalized(self) -> Self {
        match self {
            Self::Word(literal) => Self::Word(normalize(&literal)),
            other => other,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(literal) => write!(f, "\"{literal}\""),
            Self::Kind(kind) => write!(f, "<{kind}>"),
            Self::Tag(tag) => write!(f, "#{tag}"),
        }
    }
}

/// One element of a rule's right-hand side
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RhsSymbol {
    NonTerminal(Symbol),
    Terminal(Terminal),
}

impl RhsSymbol {
    #[must_use]
    pub const fn as_non_terminal(&self) -> Option<Symbol> {
        match self {
            Self::NonTerminal(symbol) => Some(*symbol),
            Self::Terminal(_) => None,
        }
    }

    #[must_use]
    pub const fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            Self::Terminal(terminal) => Some(terminal),
            Self::NonTerminal(_) => None,
        }
    }
}

/// Production rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: RuleId,
    /// Author-facing rule name, unique within the grammar
    pub name: CompactString,
    pub lhs: Symbol,
    pub rhs: SmallVec<[RhsSymbol; 4]>,
    pub priority: i32,
    /// Semantic-action tag consumed by downstream composition
    pub action: Option<CompactString>,
    pub description: CompactString,
}

impl Rule {
    /// Rules with an empty right-hand side stand for elided material
    #[must_use]
    pub fn is_elision(&self) -> bool {
        self.rhs.is_empty()
    }
}

/// Identity of a grammar for caching: `(name, version)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct GrammarKey {
    pub name: CompactString,
    pub version: CompactString,
}

impl fmt::Display for GrammarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// An immutable, validated grammar.
///
/// Symbol names are interned; use [`Grammar::symbol_name`] to resolve them.
#[derive(Clone)]
pub struct Grammar {
    key: GrammarKey,
    start: Symbol,
    rules: Vec<Rule>,
    by_lhs: HashMap<Symbol, SmallVec<[RuleId; 4]>, ahash::RandomState>,
    nullable: HashSet<Symbol, ahash::RandomState>,
    priority_range: (i32, i32),
    interner: Arc<RodeoReader>,
}

impl Grammar {
    #[must_use]
    pub const fn key(&self) -> &GrammarKey {
        &self.key
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.key.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.key.version
    }

    #[must_use]
    pub const fn start(&self) -> Symbol {
        self.start
    }

    /// All rules, indexed by [`RuleId`]
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this grammar. Rule ids only come
    /// from this grammar's own chart, so a foreign id is a caller defect.
    #[must_use]
    pub fn rule(&self, id: RuleId) -> &Rule {
        self.rules.get(id.index()).unwrap_or_else(|| {
            panic!(
                "rule {id} is not part of grammar {} ({} rules)",
                self.key,
                self.rules.len()
            )
        })
    }

    /// Rules whose left-hand side is `symbol`, in declaration order
    #[must_use]
    pub fn rules_for(&self, symbol: Symbol) -> &[RuleId] {
        self.by_lhs.get(&symbol).map_or(&[], |ids| ids.as_slice())
    }

    #[must_use]
    pub fn is_nullable(&self, symbol: Symbol) -> bool {
        self.nullable.contains(&symbol)
    }

    /// Lowest and highest rule priority in the grammar
    #[must_use]
    pub const fn priority_range(&self) -> (i32, i32) {
        self.priority_range
    }

    #[must_use]
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        self.interner.resolve(&symbol)
    }

    /// Find an interned non-terminal by name
    #[must_use]
    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.interner.get(name)
    }

    /// Find a rule by its author-facing name
    #[must_use]
    pub fn rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Render a rule as `Lhs -> a <B> #c`
    #[must_use]
    pub fn display_rule(&self, id: RuleId) -> String {
        let rule = self.rule(id);
        let mut out = format!("{} ->", self.symbol_name(rule.lhs));
        if rule.rhs.is_empty() {
            out.push_str(" ε");
        }
        for symbol in &rule.rhs {
            out.push(' ');
            match symbol {
                RhsSymbol::NonTerminal(nt) => out.push_str(self.symbol_name(*nt)),
                RhsSymbol::Terminal(t) => out.push_str(&t.to_string()),
            }
        }
        out
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("key", &self.key)
            .field("start", &self.symbol_name(self.start))
            .field("rules", &self.rules.len())
            .finish()
    }
}
