use crate::grammar::{GrammarKey, RhsSymbol, Rule, Symbol};
use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};

/// Contract violations found while building a grammar
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "diagnostics", derive(miette::Diagnostic))]
pub enum GrammarError {
    #[error("Grammar {0} has no rules")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty)))]
    Empty(GrammarKey),

    #[error("Missing start symbol")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::missing_start)))]
    MissingStart,

    #[error("Start symbol {0} has no rules")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_start)))]
    UndefinedStart(CompactString),

    #[error("Rule {rule} references undefined non-terminal {symbol}")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(grammar::undefined_symbol),
            help("add a rule for {symbol} or reference a terminal instead")
        )
    )]
    UndefinedSymbol {
        rule: CompactString,
        symbol: CompactString,
    },

    #[error("Duplicate rule name {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::duplicate_rule)))]
    DuplicateRule(CompactString),

    #[error("Non-terminal derives itself without consuming input: {}", .0.join(" -> "))]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(grammar::cycle),
            help("cyclic derivations admit infinitely many parses of the same span")
        )
    )]
    Cycle(Vec<CompactString>),

    #[error("Grammar has more rules than rule ids can address")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::too_many_rules)))]
    TooManyRules,
}

/// Fixed point of the symbols that can derive the empty string
pub(crate) fn nullable_symbols(rules: &[Rule]) -> HashSet<Symbol, ahash::RandomState> {
    let mut nullable: HashSet<Symbol, ahash::RandomState> = HashSet::default();
    let mut changed = true;
    while changed {
        changed = false;
        for rule in rules {
            if nullable.contains(&rule.lhs) {
                continue;
            }
            let all_nullable = rule.rhs.iter().all(|symbol| match symbol {
                RhsSymbol::NonTerminal(nt) => nullable.contains(nt),
                RhsSymbol::Terminal(_) => false,
            });
            if all_nullable {
                nullable.insert(rule.lhs);
                changed = true;
            }
        }
    }
    nullable
}

/// Reject grammars where some `A` derives `A` without consuming input.
///
/// The unit graph has an edge `A -> B` whenever a rule `A -> α B β` has
/// nullable `α` and `β`. A cycle in that graph means the same span has
/// infinitely many derivations.
pub(crate) fn check_cycles(
    rules: &[Rule],
    nullable: &HashSet<Symbol, ahash::RandomState>,
    name_of: impl Fn(Symbol) -> CompactString,
) -> Result<(), GrammarError> {
    let mut edges: HashMap<Symbol, Vec<Symbol>, ahash::RandomState> = HashMap::default();
    let mut order: Vec<Symbol> = Vec::new();
    for rule in rules {
        if !edges.contains_key(&rule.lhs) {
            order.push(rule.lhs);
        }
        let targets = edges.entry(rule.lhs).or_default();
        for (position, symbol) in rule.rhs.iter().enumerate() {
            let RhsSymbol::NonTerminal(target) = symbol else {
                continue;
            };
            let others_nullable = rule.rhs.iter().enumerate().all(|(other, symbol)| {
                other == position
                    || matches!(symbol, RhsSymbol::NonTerminal(nt) if nullable.contains(nt))
            });
            if others_nullable && !targets.contains(target) {
                targets.push(*target);
            }
        }
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        symbol: Symbol,
        edges: &HashMap<Symbol, Vec<Symbol>, ahash::RandomState>,
        marks: &mut HashMap<Symbol, Mark, ahash::RandomState>,
        path: &mut Vec<Symbol>,
    ) -> Option<Vec<Symbol>> {
        match marks.get(&symbol) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let begin = path.iter().position(|s| *s == symbol).unwrap_or(0);
                let mut cycle = path[begin..].to_vec();
                cycle.push(symbol);
                return Some(cycle);
            }
            None => {}
        }
        marks.insert(symbol, Mark::Visiting);
        path.push(symbol);
        for target in edges.get(&symbol).into_iter().flatten() {
            if let Some(cycle) = visit(*target, edges, marks, path) {
                return Some(cycle);
            }
        }
        path.pop();
        marks.insert(symbol, Mark::Done);
        None
    }

    let mut marks = HashMap::default();
    for symbol in order {
        let mut path = Vec::new();
        if let Some(cycle) = visit(symbol, &edges, &mut marks, &mut path) {
            return Err(GrammarError::Cycle(cycle.into_iter().map(&name_of).collect()));
        }
    }
    Ok(())
}
