//! LALR(1) automaton construction
//!
//! States are identified by their item cores. Whenever a transition reaches
//! an existing core with new lookaheads, the target state is queued again so
//! the lookaheads propagate until nothing changes.

use std::collections::{BTreeMap, VecDeque};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::CompileError;
use super::flatten::{Step, SyntaxGrammar};
use super::token_set::TokenSet;
use crate::language::Symbol;

/// `(production, dot position)`
pub(super) type Item = (u16, u16);
pub(super) type ItemSet = BTreeMap<Item, TokenSet>;

pub(super) struct FirstSets {
    terminal_count: usize,
    nullable: Vec<bool>,
    first: Vec<TokenSet>,
}

impl FirstSets {
    pub fn compute(syntax: &SyntaxGrammar) -> Self {
        let terminal_count = syntax.terminal_count;
        let count = syntax.nonterminals.len();
        let mut sets = Self {
            terminal_count,
            nullable: vec![false; count],
            first: vec![TokenSet::new(terminal_count); count],
        };
        let mut changed = true;
        while changed {
            changed = false;
            for production in &syntax.productions[1..] {
                let lhs = production.lhs.index() - terminal_count;
                if !sets.nullable[lhs] && production.steps.iter().all(|s| sets.is_nullable(s.symbol)) {
                    sets.nullable[lhs] = true;
                    changed = true;
                }
                for step in &production.steps {
                    if step.symbol.index() < terminal_count {
                        changed |= sets.first[lhs].insert(step.symbol);
                        break;
                    }
                    let inner = step.symbol.index() - terminal_count;
                    if inner != lhs {
                        let addition = sets.first[inner].clone();
                        changed |= sets.first[lhs].union_with(&addition);
                    }
                    if !sets.nullable[inner] {
                        break;
                    }
                }
            }
        }
        sets
    }

    fn is_nullable(&self, symbol: Symbol) -> bool {
        symbol.index() >= self.terminal_count && self.nullable[symbol.index() - self.terminal_count]
    }

    /// FIRST of `steps` followed by `lookahead`.
    pub fn first_of_sequence(&self, steps: &[Step], lookahead: &TokenSet) -> TokenSet {
        let mut result = TokenSet::new(self.terminal_count);
        for step in steps {
            if step.symbol.index() < self.terminal_count {
                result.insert(step.symbol);
                return result;
            }
            let index = step.symbol.index() - self.terminal_count;
            result.union_with(&self.first[index]);
            if !self.nullable[index] {
                return result;
            }
        }
        result.union_with(lookahead);
        result
    }

    /// Whether `symbol` can begin with `terminal`.
    pub fn starts_with(&self, symbol: Symbol, terminal: Symbol) -> bool {
        if symbol.index() < self.terminal_count {
            symbol == terminal
        } else {
            self.first[symbol.index() - self.terminal_count].contains(terminal)
        }
    }
}

pub(super) struct Automaton {
    pub kernels: Vec<ItemSet>,
    pub transitions: Vec<IndexMap<Symbol, u16>>,
}

pub(super) struct Closure<'a> {
    syntax: &'a SyntaxGrammar,
    first: &'a FirstSets,
    by_lhs: Vec<Vec<u16>>,
}

impl<'a> Closure<'a> {
    pub fn new(syntax: &'a SyntaxGrammar, first: &'a FirstSets) -> Self {
        let mut by_lhs = vec![Vec::new(); syntax.nonterminals.len()];
        for (id, production) in syntax.productions.iter().enumerate().skip(1) {
            by_lhs[production.lhs.index() - syntax.terminal_count].push(id as u16);
        }
        Self { syntax, first, by_lhs }
    }

    pub fn close(&self, kernel: &ItemSet) -> ItemSet {
        let mut items = kernel.clone();
        let mut work: Vec<Item> = items.keys().copied().collect();
        while let Some(item) = work.pop() {
            let steps = &self.syntax.productions[item.0 as usize].steps;
            let dot = item.1 as usize;
            let Some(next) = steps.get(dot) else { continue };
            if self.syntax.is_terminal(next.symbol) {
                continue;
            }
            let lookahead = self.first.first_of_sequence(&steps[dot + 1..], &items[&item]);
            for &production in &self.by_lhs[next.symbol.index() - self.syntax.terminal_count] {
                let key = (production, 0);
                match items.get_mut(&key) {
                    Some(existing) => {
                        if existing.union_with(&lookahead) {
                            work.push(key);
                        }
                    }
                    None => {
                        items.insert(key, lookahead.clone());
                        work.push(key);
                    }
                }
            }
        }
        items
    }
}

pub(super) fn build_automaton(syntax: &SyntaxGrammar, closure: &Closure<'_>) -> Result<Automaton, CompileError> {
    let mut start_lookahead = TokenSet::new(syntax.terminal_count);
    start_lookahead.insert(Symbol::END);
    let mut kernels: Vec<ItemSet> = vec![BTreeMap::from([((0, 0), start_lookahead)])];
    let mut transitions: Vec<IndexMap<Symbol, u16>> = vec![IndexMap::new()];
    let mut core_index: FxHashMap<Vec<Item>, u16> = FxHashMap::default();
    core_index.insert(vec![(0, 0)], 0);

    let mut queue = VecDeque::from([0usize]);
    let mut queued = vec![true];
    while let Some(state) = queue.pop_front() {
        queued[state] = false;
        let items = closure.close(&kernels[state]);

        let mut successors: IndexMap<Symbol, ItemSet> = IndexMap::new();
        for (&(production, dot), lookahead) in &items {
            let steps = &syntax.productions[production as usize].steps;
            if let Some(step) = steps.get(dot as usize) {
                successors
                    .entry(step.symbol)
                    .or_default()
                    .insert((production, dot + 1), lookahead.clone());
            }
        }

        for (symbol, kernel) in successors {
            let core: Vec<Item> = kernel.keys().copied().collect();
            let target = match core_index.get(&core) {
                Some(&target) => {
                    let mut grew = false;
                    let existing = &mut kernels[target as usize];
                    for (item, lookahead) in &kernel {
                        if let Some(known) = existing.get_mut(item) {
                            grew |= known.union_with(lookahead);
                        }
                    }
                    if grew && !queued[target as usize] {
                        queued[target as usize] = true;
                        queue.push_back(target as usize);
                    }
                    target
                }
                None => {
                    if kernels.len() >= u16::MAX as usize {
                        return Err(CompileError::TooLarge("too many parse states"));
                    }
                    let target = kernels.len() as u16;
                    kernels.push(kernel);
                    transitions.push(IndexMap::new());
                    queued.push(true);
                    core_index.insert(core, target);
                    queue.push_back(target as usize);
                    target
                }
            };
            transitions[state].insert(symbol, target);
        }
    }

    Ok(Automaton { kernels, transitions })
}
