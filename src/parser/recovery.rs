//! Error recovery
//!
//! Runs once every version has failed. The best failed version is kept
//! and repaired:
//!
//! 1. insert a zero-width MISSING token, when the table shows that the
//!    failing token can follow it (at most once per position);
//! 2. otherwise either pop entries off the stack until the failing token
//!    fits, wrapping what was popped in an ERROR node, or skip the failing
//!    token into an ERROR node. Whichever costs less wins; ties skip.
//!
//! At end of input only popping applies. When that fails, or too many
//! recoveries were needed, the whole tree becomes an ERROR node.
//!
//! Error costs steer version selection: a version that needed fewer and
//! smaller repairs wins.

use std::cmp::Reverse;

use tracing::{debug, trace};

use super::stack::EntryId;
use super::{Driver, Lookahead, Status};
use crate::language::{Action, StateId, Symbol};
use crate::lexer::LexState;
use crate::tree::subtree::{NodeSpec, Subtree};

const MISSING_COST: u32 = 110;
const RECOVERY_COST: u32 = 500;
const SKIPPED_TREE_COST: u32 = 100;
const PER_BYTE_COST: u32 = 1;

/// Entries to wrap in an ERROR node so the failing token fits on `base`.
struct Pop {
    base: EntryId,
    popped: Vec<Subtree>,
    cost: u32,
}

/// Entries popped before the pop strategy gives up.
const MAX_POP_DEPTH: usize = 256;
/// Actions simulated for one token before the simulation gives up.
const SIMULATION_LIMIT: usize = 4096;

impl Driver<'_> {
    /// Repair the best failed version. Returns the root when the parse
    /// has to finish as an ERROR tree.
    pub(super) fn recover(&mut self) -> Option<Subtree> {
        let Some(best) = (0..self.versions.len())
            .filter(|&i| self.versions[i].status == Status::Failed)
            .min_by_key(|&i| {
                let v = &self.versions[i];
                (Reverse(self.position(i)), v.error_cost, Reverse(v.dynamic_precedence), i)
            })
        else {
            return Some(self.error_root(None));
        };
        let mut version = self.versions.swap_remove(best);
        self.versions.clear();
        version.status = Status::Active;
        version.pending = None;
        version.lex_override = None;
        version.reductions = 0;
        self.versions.push(version);

        self.recovery_attempts += 1;
        self.stats.recoveries += 1;
        if self.recovery_attempts > self.options.max_recovery_attempts {
            debug!(attempts = self.recovery_attempts, "recovery limit reached; skipping the rest");
            return Some(self.skip_rest());
        }

        let mut lookahead = self.lookahead(0);
        if lookahead.subtree.missing {
            // the inserted token did not help after all
            self.versions[0].lookahead = None;
            lookahead = self.lookahead(0);
        }

        if lookahead.symbol() == Symbol::END {
            if let Some(pop) = self.find_pop(&lookahead) {
                self.pop(pop);
                return None;
            }
            debug!("input ended in an unrecoverable state");
            return Some(self.error_root(None));
        }

        let lexer_error = lookahead.subtree.leaf && lookahead.is_error();
        if !lexer_error {
            if self.versions[0].last_missing_at != Some(lookahead.start) && self.insert_missing(&lookahead) {
                return None;
            }
            if let Some(pop) = self.find_pop(&lookahead) {
                let skip_cost = self.skip_cost(&lookahead);
                if pop.cost < skip_cost {
                    self.pop(pop);
                    return None;
                }
                trace!(pop_cost = pop.cost, skip_cost, "recovery: skipping is cheaper");
            }
        }
        self.skip(lookahead);
        None
    }

    // =========================================================================
    // Strategies
    // =========================================================================

    fn insert_missing(&mut self, lookahead: &Lookahead) -> bool {
        let state = self.state(0);
        let states = self.stack.states(self.versions[0].head);
        let language = self.language;

        let mut candidates: Vec<Symbol> = language
            .valid_terminals(state)
            .iter()
            .copied()
            .filter(|&s| s != Symbol::END && !language.is_extra(s) && !language.data.externals.contains(&s))
            .collect();
        candidates.sort_by_key(|&s| (language.symbol_metadata(s).named, s));

        let Some(symbol) = candidates.into_iter().find(|&candidate| {
            let mut simulated = states.clone();
            self.simulate(&mut simulated, candidate) && self.simulate(&mut simulated, lookahead.symbol())
        }) else {
            return false;
        };

        trace!(
            token = %language.symbol_name(symbol),
            position = lookahead.start,
            "recovery: insert missing"
        );
        let lex_state = self.lex_state(0);
        let missing = Subtree::missing(symbol, state, lex_state, MISSING_COST);
        let version = &mut self.versions[0];
        version.queued = version.lookahead.take();
        version.lookahead = Some(Lookahead {
            subtree: missing,
            start: lookahead.start,
            reused: false,
        });
        version.last_missing_at = Some(lookahead.start);
        version.error_cost += MISSING_COST;
        true
    }

    /// The shallowest pop after which the failing token fits.
    fn find_pop(&self, lookahead: &Lookahead) -> Option<Pop> {
        let mut popped = Vec::new();
        let mut id = self.versions[0].head;
        for _ in 0..MAX_POP_DEPTH {
            let entry = self.stack.get(id);
            let (Some(subtree), Some(prev)) = (&entry.subtree, entry.prev) else {
                return None;
            };
            popped.push(subtree.clone());
            id = prev;
            if popped.iter().all(|s| s.extra) {
                continue;
            }
            let mut states = self.stack.states(id);
            if !self.simulate(&mut states, lookahead.symbol()) {
                continue;
            }
            popped.reverse();
            let cost = Self::error_cost_of(&popped);
            return Some(Pop { base: id, popped, cost });
        }
        None
    }

    fn pop(&mut self, pop: Pop) {
        let base = self.stack.get(pop.base);
        let (state, start) = (base.state, base.position);
        trace!(depth = pop.popped.len(), start, "recovery: pop");
        let error = self.error_node(pop.popped, state, start);
        let end = start + error.size;
        let version = &mut self.versions[0];
        version.head = self.stack.push(Some(pop.base), state, Some(error), end);
        version.error_cost += pop.cost;
    }

    /// The entry below the extras on top of the stack, with those extras
    /// from the top down.
    fn below_extras(&self) -> (EntryId, Vec<Subtree>) {
        let mut between = Vec::new();
        let mut id = self.versions[0].head;
        loop {
            let entry = self.stack.get(id);
            match (&entry.subtree, entry.prev) {
                (Some(subtree), Some(prev)) if subtree.extra && !subtree.is_error() => {
                    between.push(subtree.clone());
                    id = prev;
                }
                _ => return (id, between),
            }
        }
    }

    /// An ERROR node the next skipped token would be merged into.
    fn open_error(&self, id: EntryId) -> Option<(&Subtree, EntryId)> {
        let entry = self.stack.get(id);
        match (&entry.subtree, entry.prev) {
            (Some(previous), Some(prev)) if previous.is_error() && previous.extra && !previous.leaf => {
                Some((previous, prev))
            }
            _ => None,
        }
    }

    fn skip_cost(&self, lookahead: &Lookahead) -> u32 {
        let token = Self::skipped_cost(&lookahead.subtree);
        let (below, _) = self.below_extras();
        if self.open_error(below).is_some() || lookahead.is_error() {
            token
        } else {
            RECOVERY_COST + token
        }
    }

    fn skip(&mut self, lookahead: Lookahead) {
        let head = self.versions[0].head;
        self.versions[0].lookahead = None;

        // an ERROR node right before this token, possibly behind extras
        let (id, between) = self.below_extras();
        let below = self.stack.get(id);
        let token = lookahead.subtree.with_flags(false, 0);

        let (prev, state, error, old_cost) = match self.open_error(id) {
            Some((previous, prev)) => {
                let mut children = previous.children.clone();
                children.extend(between.into_iter().rev());
                children.push(token);
                let start = below.position - previous.size;
                let error = self.error_node(children, previous.parse_state, start);
                (prev, below.state, error, previous.error_cost)
            }
            _ if lookahead.is_error() => {
                let cost = Self::skipped_cost(&token);
                (head, self.state(0), token.with_flags(true, cost), 0)
            }
            _ => {
                let error = self.error_node(vec![token], self.state(0), lookahead.start);
                (head, self.state(0), error, 0)
            }
        };
        trace!(
            token = %self.language.symbol_name(lookahead.symbol()),
            position = lookahead.start,
            "recovery: skip"
        );
        let cost = error.error_cost.saturating_sub(old_cost);
        let version = &mut self.versions[0];
        version.head = self.stack.push(Some(prev), state, Some(error), lookahead.end());
        version.error_cost += cost;
    }

    /// Give up: everything parsed so far and everything after it go into
    /// one ERROR root.
    fn skip_rest(&mut self) -> Subtree {
        let position = self.versions.first().map_or(0, |_| self.position(0));
        let rest = (position < self.source.len()).then(|| {
            Subtree::leaf(
                Symbol::ERROR,
                self.source.len() - position,
                1,
                self.state(0),
                LexState::default(),
                true,
            )
        });
        self.error_root(rest)
    }

    fn error_root(&self, rest: Option<Subtree>) -> Subtree {
        let mut children = self
            .versions
            .first()
            .map(|v| self.stack.subtrees(v.head))
            .unwrap_or_default();
        children.extend(rest);
        if children.is_empty() && !self.source.is_empty() {
            children.push(Subtree::leaf(
                Symbol::ERROR,
                self.source.len(),
                1,
                self.language.start_state(),
                LexState::default(),
                true,
            ));
        }
        let root = self.error_node(children, self.language.start_state(), 0);
        root.with_flags(false, root.error_cost)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn error_cost_of(children: &[Subtree]) -> u32 {
        RECOVERY_COST
            + children
                .iter()
                .filter(|c| !c.extra)
                .map(Self::skipped_cost)
                .sum::<u32>()
    }

    /// An extra ERROR node over `children`, costed by what it swallowed.
    fn error_node(&self, children: Vec<Subtree>, parse_state: StateId, start: usize) -> Subtree {
        let cost = Self::error_cost_of(&children);
        let node = Subtree::node(
            NodeSpec {
                symbol: Symbol::ERROR,
                children,
                fields: Vec::new(),
                parse_state,
                production_precedence: 0,
                lookahead_end: start,
                start,
                next_lex_state: LexState::default(),
                fragile: true,
            },
            self.language,
        );
        node.with_flags(true, cost)
    }

    fn skipped_cost(subtree: &Subtree) -> u32 {
        let bytes = u32::try_from(subtree.size).unwrap_or(u32::MAX);
        SKIPPED_TREE_COST.saturating_add(bytes.saturating_mul(PER_BYTE_COST))
    }

    /// Run the preferred actions for `symbol` on a bare state stack. True
    /// when the symbol ends up shifted or accepted.
    fn simulate(&self, states: &mut Vec<StateId>, symbol: Symbol) -> bool {
        for _ in 0..SIMULATION_LIMIT {
            let Some(&top) = states.last() else {
                return false;
            };
            match self.language.action(top, symbol).first() {
                None => return false,
                Some(Action::Shift(next)) => {
                    states.push(*next);
                    return true;
                }
                Some(Action::Accept) => return true,
                Some(Action::Reduce(production)) => {
                    let production = self.language.production(*production);
                    let count = production.child_count as usize;
                    if states.len() <= count {
                        return false;
                    }
                    states.truncate(states.len() - count);
                    let Some(&base) = states.last() else {
                        return false;
                    };
                    match self.language.goto(base, production.lhs) {
                        Some(next) => states.push(next),
                        None => return false,
                    }
                }
            }
        }
        false
    }
}

impl Lookahead {
    fn is_error(&self) -> bool {
        self.subtree.is_error()
    }
}
