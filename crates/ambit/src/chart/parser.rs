//! Earley chart construction

use crate::chart::config::ChartConfig;
use crate::chart::item::{ChartSet, EarleyItem, Link};
use crate::error::ParseError;
use crate::grammar::{Grammar, GrammarKey, RhsSymbol, RuleId, Symbol, Terminal};
use crate::text::{TextRange, TextSize};
use crate::token::Token;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Overall result of chart construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutcome {
    /// A complete start item spans the whole input
    Success,
    /// No derivation exists; `position` is the earliest stall point and
    /// `expected` the terminals that would have advanced the parse there
    Failed {
        position: usize,
        expected: Vec<Terminal>,
    },
    /// An item cap was exceeded while filling the set at `position`
    LimitExceeded {
        position: usize,
        items: usize,
        limit: usize,
    },
}

/// Earley chart: one [`ChartSet`] per token boundary.
///
/// A failed chart holds the sets built up to the stall position; a chart
/// that hit a resource limit holds whatever was built before the cap tripped
/// and must not be extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    grammar: GrammarKey,
    start: Symbol,
    sets: Vec<ChartSet>,
    token_count: usize,
    outcome: ChartOutcome,
}

impl Chart {
    /// Key of the grammar this chart was built with
    #[must_use]
    pub const fn grammar(&self) -> &GrammarKey {
        &self.grammar
    }

    #[must_use]
    pub const fn outcome(&self) -> &ChartOutcome {
        &self.outcome
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, ChartOutcome::Success)
    }

    #[must_use]
    pub const fn is_limit_exceeded(&self) -> bool {
        matches!(self.outcome, ChartOutcome::LimitExceeded { .. })
    }

    /// Number of tokens the chart was built over
    #[must_use]
    pub const fn token_count(&self) -> usize {
        self.token_count
    }

    /// Chart sets built so far, indexed by token boundary
    #[must_use]
    pub fn sets(&self) -> &[ChartSet] {
        &self.sets
    }

    #[must_use]
    pub fn set(&self, position: usize) -> Option<&ChartSet> {
        self.sets.get(position)
    }

    #[must_use]
    pub fn total_items(&self) -> usize {
        self.sets.iter().map(ChartSet::len).sum()
    }

    /// Derivation links of `item` at `position`
    #[must_use]
    pub fn links(&self, position: usize, item: &EarleyItem) -> &[Link] {
        self.sets.get(position).map_or(&[], |set| set.links(item))
    }

    /// Complete start items spanning the whole input, in chart order
    #[must_use]
    pub fn accepting_items(&self, grammar: &Grammar) -> Vec<EarleyItem> {
        let Some(last) = self.sets.get(self.token_count) else {
            return Vec::new();
        };
        last.items()
            .filter(|item| {
                item.origin == 0
                    && grammar.rule(item.rule).lhs == self.start
                    && item.is_complete(grammar)
            })
            .collect()
    }

    /// Failure or limit as a [`ParseError`]; `None` on success
    #[must_use]
    pub fn error(&self, tokens: &[Token]) -> Option<ParseError> {
        match &self.outcome {
            ChartOutcome::Success => None,
            ChartOutcome::LimitExceeded {
                position,
                items,
                limit,
            } => Some(ParseError::ResourceLimit {
                position: *position,
                items: *items,
                limit: *limit,
            }),
            ChartOutcome::Failed { position, expected } => {
                let expected = expected.iter().map(ToString::to_string).collect();
                Some(match tokens.get(*position) {
                    Some(token) => ParseError::UnexpectedToken {
                        span: token.span,
                        position: *position,
                        found: token.text.to_string(),
                        expected,
                    },
                    None => ParseError::UnexpectedEnd {
                        span: TextRange::empty(
                            tokens.last().map_or(TextSize::zero(), |t| t.span.end()),
                        ),
                        position: *position,
                        expected,
                    },
                })
            }
        }
    }
}

/// Cap tripped during construction
struct Limit {
    position: usize,
    items: usize,
    limit: usize,
}

/// Mutable state for one chart construction
struct Construction<'a> {
    grammar: &'a Grammar,
    config: &'a ChartConfig,
    sets: Vec<ChartSet>,
    /// Items at each position whose next symbol is a given non-terminal
    waiting: Vec<HashMap<Symbol, Vec<EarleyItem>, ahash::RandomState>>,
    /// Rules that completed without consuming input at the current position
    empty: HashMap<Symbol, SmallVec<[RuleId; 2]>, ahash::RandomState>,
    total: usize,
}

impl<'a> Construction<'a> {
    fn new(grammar: &'a Grammar, config: &'a ChartConfig) -> Self {
        Self {
            grammar,
            config,
            sets: vec![ChartSet::new()],
            waiting: vec![HashMap::default()],
            empty: HashMap::default(),
            total: 0,
        }
    }

    fn ensure_set(&mut self, position: usize) {
        while self.sets.len() <= position {
            self.sets.push(ChartSet::new());
            self.waiting.push(HashMap::default());
        }
    }

    fn insert(&mut self, position: usize, item: EarleyItem, link: Link) -> Result<(), Limit> {
        self.ensure_set(position);
        let set = &mut self.sets[position];
        if !set.insert(item, link) {
            return Ok(());
        }
        self.total += 1;
        if set.len() > self.config.max_items_per_set {
            return Err(Limit {
                position,
                items: set.len(),
                limit: self.config.max_items_per_set,
            });
        }
        if self.total > self.config.max_total_items {
            return Err(Limit {
                position,
                items: self.total,
                limit: self.config.max_total_items,
            });
        }
        Ok(())
    }

    fn predict(&mut self, position: usize, item: EarleyItem, symbol: Symbol) -> Result<(), Limit> {
        self.waiting[position].entry(symbol).or_default().push(item);
        for &rule in self.grammar.rules_for(symbol) {
            self.insert(position, EarleyItem::initial(rule, position), Link::Predicted)?;
        }
        // The symbol may already have completed empty here; advance past it.
        if let Some(rules) = self.empty.get(&symbol).cloned() {
            for child in rules {
                self.insert(
                    position,
                    item.advance(),
                    Link::Completed {
                        split: position,
                        child,
                    },
                )?;
            }
        }
        Ok(())
    }

    fn complete(&mut self, position: usize, item: EarleyItem) -> Result<(), Limit> {
        let lhs = self.grammar.rule(item.rule).lhs;
        if item.origin == position {
            self.empty.entry(lhs).or_default().push(item.rule);
        }
        let Some(waiters) = self.waiting[item.origin].get(&lhs).cloned() else {
            return Ok(());
        };
        for waiter in waiters {
            self.insert(
                position,
                waiter.advance(),
                Link::Completed {
                    split: item.origin,
                    child: item.rule,
                },
            )?;
        }
        Ok(())
    }

    fn scan(
        &mut self,
        position: usize,
        item: EarleyItem,
        terminal: &Terminal,
        tokens: &[Token],
    ) -> Result<(), Limit> {
        if let Some(token) = tokens.get(position)
            && terminal.matches(token)
        {
            self.insert(position + 1, item.advance(), Link::Scanned { token: position })?;
        }
        Ok(())
    }

    /// Run PREDICT, COMPLETE and SCAN over the set at `position` until it
    /// stops growing.
    fn close(&mut self, position: usize, tokens: &[Token]) -> Result<(), Limit> {
        let grammar = self.grammar;
        self.empty.clear();
        let mut index = 0;
        while let Some(item) = self.sets[position].get_index(index) {
            index += 1;
            match grammar.rule(item.rule).rhs.get(item.dot) {
                None => self.complete(position, item)?,
                Some(RhsSymbol::NonTerminal(symbol)) => self.predict(position, item, *symbol)?,
                Some(RhsSymbol::Terminal(terminal)) => {
                    self.scan(position, item, terminal, tokens)?;
                }
            }
        }
        Ok(())
    }

    fn expected_at(&self, position: usize) -> Vec<Terminal> {
        let mut expected: Vec<Terminal> = self.sets[position]
            .items()
            .filter_map(|item| item.next_symbol(self.grammar)?.as_terminal().cloned())
            .collect();
        expected.sort();
        expected.dedup();
        expected
    }
}

/// Earley parser over a validated [`Grammar`]
#[derive(Debug, Clone)]
pub struct ChartParser<'g> {
    grammar: &'g Grammar,
    config: ChartConfig,
}

impl<'g> ChartParser<'g> {
    #[must_use]
    pub const fn new(grammar: &'g Grammar, config: ChartConfig) -> Self {
        Self { grammar, config }
    }

    #[must_use]
    pub const fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    #[must_use]
    pub const fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Build the chart for `tokens`.
    ///
    /// Construction stops at the first position whose successor set stays
    /// empty, or as soon as an item cap is exceeded.
    #[must_use]
    pub fn parse(&self, tokens: &[Token]) -> Chart {
        let grammar = self.grammar;
        let start = grammar.start();
        let mut state = Construction::new(grammar, &self.config);

        let outcome = match Self::fill(&mut state, tokens) {
            Ok(outcome) => outcome,
            Err(limit) => {
                tracing::debug!(
                    grammar = %grammar.key(),
                    position = limit.position,
                    items = limit.items,
                    limit = limit.limit,
                    "chart limit exceeded"
                );
                ChartOutcome::LimitExceeded {
                    position: limit.position,
                    items: limit.items,
                    limit: limit.limit,
                }
            }
        };

        tracing::debug!(
            grammar = %grammar.key(),
            tokens = tokens.len(),
            items = state.total,
            success = matches!(outcome, ChartOutcome::Success),
            "chart built"
        );

        Chart {
            grammar: grammar.key().clone(),
            start,
            sets: state.sets,
            token_count: tokens.len(),
            outcome,
        }
    }

    fn fill(state: &mut Construction<'_>, tokens: &[Token]) -> Result<ChartOutcome, Limit> {
        let grammar = state.grammar;
        for &rule in grammar.rules_for(grammar.start()) {
            state.insert(0, EarleyItem::initial(rule, 0), Link::Predicted)?;
        }

        for position in 0..=tokens.len() {
            state.close(position, tokens)?;
            tracing::trace!(
                position,
                items = state.sets[position].len(),
                "closed chart set"
            );
            if position < tokens.len() && state.sets.len() <= position + 1 {
                return Ok(ChartOutcome::Failed {
                    position,
                    expected: state.expected_at(position),
                });
            }
        }

        let end = tokens.len();
        let accepted = state.sets[end].items().any(|item| {
            item.origin == 0
                && grammar.rule(item.rule).lhs == grammar.start()
                && item.is_complete(grammar)
        });
        if accepted {
            Ok(ChartOutcome::Success)
        } else {
            Ok(ChartOutcome::Failed {
                position: end,
                expected: state.expected_at(end),
            })
        }
    }
}
