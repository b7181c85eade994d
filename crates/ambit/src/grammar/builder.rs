use crate::grammar::{
    DEFAULT_PRIORITY, Grammar, GrammarError, GrammarKey, RhsSymbol, Rule, RuleId, Terminal,
    validate,
};
use compact_str::{CompactString, format_compact};
use hashbrown::HashMap;
use lasso::Rodeo;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// Right-hand symbol as written by a grammar author, before interning
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum SymbolSpec {
    /// Reference to a non-terminal by name
    Nt(CompactString),
    /// Literal word
    Word(CompactString),
    /// Token kind
    Kind(CompactString),
    /// Token tag
    Tag(CompactString),
}

/// Non-terminal reference
pub fn nt(name: impl Into<CompactString>) -> SymbolSpec {
    SymbolSpec::Nt(name.into())
}

/// Literal word terminal
pub fn word(text: impl Into<CompactString>) -> SymbolSpec {
    SymbolSpec::Word(text.into())
}

/// Token-kind terminal
pub fn kind(kind: impl Into<CompactString>) -> SymbolSpec {
    SymbolSpec::Kind(kind.into())
}

/// Token-tag terminal
pub fn tag(tag: impl Into<CompactString>) -> SymbolSpec {
    SymbolSpec::Tag(tag.into())
}

/// A rule as written by a grammar author
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct RuleSpec {
    /// Unique rule name; generated as `Lhs#n` when absent
    #[cfg_attr(feature = "serialize", serde(default))]
    pub name: Option<CompactString>,
    pub lhs: CompactString,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub rhs: Vec<SymbolSpec>,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub priority: i32,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub action: Option<CompactString>,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub description: CompactString,
}

impl RuleSpec {
    #[must_use]
    pub fn new(lhs: impl Into<CompactString>, rhs: impl IntoIterator<Item = SymbolSpec>) -> Self {
        Self {
            name: None,
            lhs: lhs.into(),
            rhs: rhs.into_iter().collect(),
            priority: DEFAULT_PRIORITY,
            action: None,
            description: CompactString::default(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<CompactString>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<CompactString>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<CompactString>) -> Self {
        self.description = description.into();
        self
    }
}

/// Serializable grammar description, as produced by a grammar-compilation step
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct GrammarSpec {
    pub name: CompactString,
    pub version: CompactString,
    pub start: CompactString,
    pub rules: Vec<RuleSpec>,
}

impl GrammarSpec {
    /// Validate and build the grammar.
    ///
    /// # Errors
    ///
    /// See [`GrammarBuilder::build`].
    pub fn build(self) -> Result<Grammar, GrammarError> {
        let mut builder = GrammarBuilder::new(self.name, self.version).start(self.start);
        for rule in self.rules {
            builder = builder.rule(rule);
        }
        builder.build()
    }
}

/// Builder for constructing grammars
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    key: GrammarKey,
    start: Option<CompactString>,
    rules: Vec<RuleSpec>,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new(name: impl Into<CompactString>, version: impl Into<CompactString>) -> Self {
        Self {
            key: GrammarKey {
                name: name.into(),
                version: version.into(),
            },
            start: None,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn start(mut self, symbol: impl Into<CompactString>) -> Self {
        self.start = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: RuleSpec) -> Self {
        self.rules.push(rule);
        self
    }

    /// Build the grammar from the configured rules.
    ///
    /// # Errors
    ///
    /// Returns an error when the grammar is empty, has no start symbol, the
    /// start symbol or a referenced non-terminal has no rules, two rules
    /// share a name, or a non-terminal can derive itself without consuming
    /// input.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::Empty(self.key));
        }
        let start_name = self.start.ok_or(GrammarError::MissingStart)?;

        let mut interner = Rodeo::new();
        // Left-hand sides are interned first so that every defined symbol exists
        // before right-hand references are resolved.
        for spec in &self.rules {
            interner.get_or_intern(spec.lhs.as_str());
        }
        let start = interner
            .get(start_name.as_str())
            .ok_or_else(|| GrammarError::UndefinedStart(start_name.clone()))?;

        let mut rules = Vec::with_capacity(self.rules.len());
        let mut names: HashMap<CompactString, RuleId, ahash::RandomState> = HashMap::default();
        for (index, spec) in self.rules.into_iter().enumerate() {
            let id = RuleId::new(u32::try_from(index).map_err(|_| GrammarError::TooManyRules)?);
            let lhs = interner.get_or_intern(spec.lhs.as_str());
            let name = spec
                .name
                .unwrap_or_else(|| format_compact!("{}#{}", spec.lhs, index));
            if names.insert(name.clone(), id).is_some() {
                return Err(GrammarError::DuplicateRule(name));
            }

            let mut rhs = SmallVec::with_capacity(spec.rhs.len());
            for symbol in spec.rhs {
                rhs.push(match symbol {
                    SymbolSpec::Nt(reference) => match interner.get(reference.as_str()) {
                        Some(symbol) => RhsSymbol::NonTerminal(symbol),
                        None => {
                            return Err(GrammarError::UndefinedSymbol {
                                rule: name,
                                symbol: reference,
                            });
                        }
                    },
                    SymbolSpec::Word(text) => RhsSymbol::Terminal(Terminal::Word(text).normalized()),
                    SymbolSpec::Kind(kind) => RhsSymbol::Terminal(Terminal::Kind(kind)),
                    SymbolSpec::Tag(tag) => RhsSymbol::Terminal(Terminal::Tag(tag)),
                });
            }

            rules.push(Rule {
                id,
                name,
                lhs,
                rhs,
                priority: spec.priority,
                action: spec.action,
                description: spec.description,
            });
        }

        let mut by_lhs: HashMap<_, SmallVec<[RuleId; 4]>, ahash::RandomState> = HashMap::default();
        for rule in &rules {
            by_lhs.entry(rule.lhs).or_default().push(rule.id);
        }

        let interner = interner.into_reader();
        let nullable = validate::nullable_symbols(&rules);
        validate::check_cycles(&rules, &nullable, |symbol| {
            CompactString::from(interner.resolve(&symbol))
        })?;

        let priority_range = rules.iter().fold((i32::MAX, i32::MIN), |(lo, hi), rule| {
            (lo.min(rule.priority), hi.max(rule.priority))
        });

        tracing::debug!(
            grammar = %self.key,
            rules = rules.len(),
            nullable = nullable.len(),
            "built grammar"
        );

        Ok(Grammar {
            key: self.key,
            start,
            rules,
            by_lhs,
            nullable,
            priority_range,
            interner: Arc::new(interner),
        })
    }
}
