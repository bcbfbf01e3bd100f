//! GLR parsing with error recovery and incremental reuse
//!
//! ## Architecture
//!
//! ```text
//! source bytes ─┐
//!               ├─ Lexer (one token at a time, per parse state)
//! old tree ─────┤        ↓
//!   + edits     └─ ReuseCursor (old leaves and subtrees that still fit)
//!                        ↓
//!              Driver: stack versions over an arena Stack
//!                        ↓  shift / reduce / accept, fork, merge, recover
//!                      Tree
//! ```
//!
//! Versions advance one token at a time, lowest position first. When a
//! state offers several actions for a token, the version forks. Versions
//! that reach the same position with equivalent stacks are merged, keeping
//! the one with the lowest error cost and then the highest dynamic
//! precedence. Once every version has failed, the best one is repaired by
//! [recovery](recovery).

mod options;
mod recovery;
mod reuse;
mod stack;

pub use options::{ParseStats, ParserOptions};

use std::cmp::Reverse;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::edit::{ChangeSet, Edit};
use crate::language::{Action, Language, ProductionId, StateId, Symbol};
use crate::lexer::{LexState, Lexer};
use crate::tree::Tree;
use crate::tree::subtree::{NodeSpec, Subtree};
use reuse::ReuseCursor;
use stack::{EntryId, Stack};

/// Reductions in a row without a shift before a version is given up on.
const MAX_REDUCTIONS_PER_TOKEN: u32 = 4096;

/// Parses source text with one [`Language`].
///
/// A parser is cheap to create. It keeps the statistics of its last parse.
#[derive(Debug, Clone)]
pub struct Parser {
    language: Language,
    options: ParserOptions,
    stats: ParseStats,
}

impl Parser {
    pub fn new(language: Language) -> Self {
        Self::with_options(language, ParserOptions::default())
    }

    pub fn with_options(language: Language, options: ParserOptions) -> Self {
        Self {
            language,
            options,
            stats: ParseStats::default(),
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Statistics of the most recent parse.
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    pub fn parse(&mut self, source: &[u8]) -> Tree {
        self.parse_with(source, None, &[])
    }

    /// Reparse `source`, the text `old_tree` had after `edits`.
    pub fn reparse(&mut self, old_tree: &Tree, edits: &[Edit], source: &[u8]) -> Tree {
        self.parse_with(source, Some(old_tree), edits)
    }

    /// Parse `source`, reusing what still fits from `old_tree`. Edits that
    /// do not describe how the old text became `source` are logged and
    /// the text is parsed from scratch.
    pub fn parse_with(&mut self, source: &[u8], old_tree: Option<&Tree>, edits: &[Edit]) -> Tree {
        let reuse = match old_tree {
            Some(old) if self.options.incremental => self.reuse_cursor(old, edits, source),
            _ => None,
        };
        if let (Some(old), Some((_, true))) = (old_tree, &reuse) {
            // nothing changed
            self.stats = ParseStats {
                incremental: true,
                ..ParseStats::default()
            };
            return old.clone();
        }

        let incremental = reuse.is_some();
        let driver = Driver::new(&self.language, &self.options, source, reuse.map(|(cursor, _)| cursor));
        let (root, mut stats) = driver.run();
        stats.incremental = incremental;
        debug!(
            language = %self.language.name(),
            bytes = source.len(),
            incremental,
            reused_nodes = stats.reused_nodes,
            reused_leaves = stats.reused_leaves,
            lexed_tokens = stats.lexed_tokens,
            recoveries = stats.recoveries,
            max_versions = stats.max_versions,
            "parsed"
        );
        self.stats = stats;
        Tree::new(root, self.language.clone(), Arc::from(source))
    }

    /// A cursor over `old`, plus whether the edits were a no-op on the same
    /// text.
    fn reuse_cursor<'a>(
        &self,
        old: &'a Tree,
        edits: &[Edit],
        source: &[u8],
    ) -> Option<(ReuseCursor<'a>, bool)> {
        if !old.language().same_tables(&self.language) {
            warn!(
                old = %old.language().name(),
                new = %self.language.name(),
                "old tree was parsed with a different language; parsing from scratch"
            );
            return None;
        }
        let changes = match ChangeSet::from_edits(old.source().len(), edits) {
            Ok(changes) => changes,
            Err(err) => {
                warn!(%err, "inconsistent edits; parsing from scratch");
                return None;
            }
        };
        if changes.new_len() != source.len() {
            let err = crate::edit::EditError::LengthMismatch {
                expected: changes.new_len(),
                actual: source.len(),
            };
            warn!(%err, "inconsistent edits; parsing from scratch");
            return None;
        }
        let unchanged = changes.is_identity() && old.source() == source;
        Some((ReuseCursor::new(old.root(), old.source(), changes), unchanged))
    }
}

/// Parse every source on the rayon thread pool. Results are in input order.
pub fn parse_batch(language: &Language, sources: &[&[u8]]) -> Vec<Tree> {
    sources
        .par_iter()
        .map(|source| Parser::new(language.clone()).parse(source))
        .collect()
}

// =============================================================================
// Driver
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Active,
    Failed,
    Accepted,
}

/// The token a version is looking at.
#[derive(Debug, Clone)]
struct Lookahead {
    subtree: Subtree,
    start: usize,
    /// Taken from the old tree
    reused: bool,
}

impl Lookahead {
    fn symbol(&self) -> Symbol {
        self.subtree.symbol
    }

    fn end(&self) -> usize {
        self.start + self.subtree.size
    }

    /// End of everything the lexer looked at to produce this token
    fn lookahead_end(&self) -> usize {
        self.end() + self.subtree.lookahead_bytes
    }
}

#[derive(Debug, Clone)]
struct Version {
    head: EntryId,
    status: Status,
    dynamic_precedence: i32,
    error_cost: u32,
    lookahead: Option<Lookahead>,
    /// The real token, when recovery put a MISSING token in front of it
    queued: Option<Lookahead>,
    /// Action left to this version by a fork
    pending: Option<Action>,
    last_missing_at: Option<usize>,
    /// Lex mode to use instead of the head state's until the next non-extra
    /// shift. Set after pushing a reused node, whose following token was
    /// lexed in the state before the node was reduced.
    lex_override: Option<u16>,
    reductions: u32,
    root: Option<Subtree>,
}

impl Version {
    fn new(head: EntryId) -> Self {
        Self {
            head,
            status: Status::Active,
            dynamic_precedence: 0,
            error_cost: 0,
            lookahead: None,
            queued: None,
            pending: None,
            last_missing_at: None,
            lex_override: None,
            reductions: 0,
            root: None,
        }
    }

    /// Smaller is better
    fn preference(&self, index: usize) -> (u32, Reverse<i32>, usize) {
        (self.error_cost, Reverse(self.dynamic_precedence), index)
    }
}

struct Driver<'a> {
    language: &'a Language,
    options: &'a ParserOptions,
    source: &'a [u8],
    lexer: Lexer<'a>,
    stack: Stack,
    versions: Vec<Version>,
    reuse: Option<ReuseCursor<'a>>,
    stats: ParseStats,
    recovery_attempts: usize,
}

impl<'a> Driver<'a> {
    fn new(
        language: &'a Language,
        options: &'a ParserOptions,
        source: &'a [u8],
        reuse: Option<ReuseCursor<'a>>,
    ) -> Self {
        let (stack, base) = Stack::new(language.start_state());
        Self {
            language,
            options,
            source,
            lexer: Lexer::new(language, source),
            stack,
            versions: vec![Version::new(base)],
            reuse,
            stats: ParseStats {
                max_versions: 1,
                ..ParseStats::default()
            },
            recovery_attempts: 0,
        }
    }

    fn run(mut self) -> (Subtree, ParseStats) {
        loop {
            if let Some(index) = self.next_active() {
                self.step(index);
                self.condense();
                continue;
            }
            if let Some(root) = self.best_accepted() {
                return (root, self.stats);
            }
            if let Some(root) = self.recover() {
                return (root, self.stats);
            }
        }
    }

    fn position(&self, index: usize) -> usize {
        self.stack.get(self.versions[index].head).position
    }

    fn state(&self, index: usize) -> StateId {
        self.stack.get(self.versions[index].head).state
    }

    /// The active version furthest behind, earliest on ties.
    fn next_active(&self) -> Option<usize> {
        (0..self.versions.len())
            .filter(|&i| self.versions[i].status == Status::Active)
            .min_by_key(|&i| (self.position(i), i))
    }

    fn step(&mut self, index: usize) {
        let action = match self.versions[index].pending.take() {
            Some(action) => action,
            None => {
                let language = self.language;
                let lookahead = self.lookahead(index);
                match language.action(self.state(index), lookahead.symbol()) {
                    [] if language.is_extra(lookahead.symbol()) && !lookahead.subtree.missing => {
                        self.shift_extra(index);
                        return;
                    }
                    [] => {
                        trace!(
                            version = index,
                            state = self.state(index),
                            token = %self.language.symbol_name(lookahead.symbol()),
                            position = lookahead.start,
                            "no action"
                        );
                        self.versions[index].status = Status::Failed;
                        return;
                    }
                    [only] => {
                        let only = *only;
                        return self.execute(index, only, true);
                    }
                    [first, rest @ ..] => {
                        for &action in rest {
                            self.fork(index, action);
                        }
                        *first
                    }
                }
            }
        };
        self.execute(index, action, false);
    }

    fn execute(&mut self, index: usize, action: Action, sole: bool) {
        match action {
            Action::Shift(state) => self.shift(index, state, sole),
            Action::Reduce(production) => self.reduce(index, production),
            Action::Accept => self.accept(index),
        }
    }

    fn fork(&mut self, index: usize, action: Action) {
        let mut version = self.versions[index].clone();
        version.pending = Some(action);
        self.versions.push(version);
        trace!(
            from = index,
            to = self.versions.len() - 1,
            ?action,
            position = self.position(index),
            "fork"
        );
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    fn lookahead(&mut self, index: usize) -> Lookahead {
        if let Some(lookahead) = &self.versions[index].lookahead {
            return lookahead.clone();
        }
        let lookahead = match self.versions[index].queued.take() {
            Some(queued) => queued,
            None => self.next_token(index),
        };
        self.versions[index].lookahead = Some(lookahead.clone());
        lookahead
    }

    fn lex_state(&self, index: usize) -> LexState {
        let entry = self.stack.get(self.versions[index].head);
        LexState {
            mode: self.versions[index]
                .lex_override
                .unwrap_or_else(|| self.language.lex_mode_id(entry.state)),
            after_extra: entry.is_extra(),
        }
    }

    fn next_token(&mut self, index: usize) -> Lookahead {
        let position = self.position(index);
        let state = self.state(index);
        let lex_state = self.lex_state(index);
        if self.versions.len() == 1
            && let Some(leaf) = self.reusable_leaf(position, lex_state)
        {
            self.stats.reused_leaves += 1;
            return Lookahead {
                subtree: leaf,
                start: position,
                reused: true,
            };
        }
        let token = self.lexer.next_token(position, lex_state);
        self.stats.lexed_tokens += 1;
        Lookahead {
            subtree: Subtree::leaf(
                token.symbol,
                token.end - token.start,
                token.lookahead_bytes(),
                state,
                lex_state,
                token.error_mode,
            ),
            start: token.start,
            reused: false,
        }
    }

    fn reusable_leaf(&mut self, position: usize, lex_state: LexState) -> Option<Subtree> {
        let cursor = self.reuse.as_mut()?;
        let (leaf, old_start) = cursor.leaf_at(position)?;
        let usable = leaf.lex_state == lex_state
            && leaf.size > 0
            && !leaf.is_error()
            && !leaf.missing
            && !leaf.error_mode
            && cursor.region_matches(old_start, leaf.size + leaf.lookahead_bytes, position, self.source);
        usable.then(|| leaf.clone())
    }

    // =========================================================================
    // Actions
    // =========================================================================

    fn shift(&mut self, index: usize, state: StateId, sole: bool) {
        let Some(lookahead) = self.versions[index].lookahead.take() else {
            self.versions[index].status = Status::Failed;
            return;
        };
        if lookahead.reused && sole && self.versions.len() == 1 && self.reuse_node(index, &lookahead) {
            return;
        }
        let subtree = lookahead.subtree.with_flags(false, lookahead.subtree.error_cost);
        let version = &mut self.versions[index];
        version.head = self.stack.push(Some(version.head), state, Some(subtree), lookahead.end());
        version.lex_override = None;
        version.reductions = 0;
    }

    fn shift_extra(&mut self, index: usize) {
        let Some(lookahead) = self.versions[index].lookahead.take() else {
            return;
        };
        let state = self.state(index);
        let subtree = lookahead.subtree.with_flags(true, lookahead.subtree.error_cost);
        let version = &mut self.versions[index];
        version.head = self.stack.push(Some(version.head), state, Some(subtree), lookahead.end());
    }

    /// Push an old subtree that starts with the reused lookahead leaf
    /// instead of shifting the leaf.
    fn reuse_node(&mut self, index: usize, lookahead: &Lookahead) -> bool {
        let state = self.state(index);
        let Some(cursor) = self.reuse.as_mut() else {
            return false;
        };
        for (depth, node, old_start) in cursor.nodes_at(lookahead.start) {
            if node.has_error || node.fragile || node.extra || node.size == 0 || node.parse_state != state {
                continue;
            }
            let Some(goto) = self.language.goto(state, node.symbol) else {
                continue;
            };
            if !cursor.region_matches(old_start, node.size + node.lookahead_bytes, lookahead.start, self.source) {
                continue;
            }
            cursor.skip_node(depth);
            trace!(
                node = %self.language.symbol_name(node.symbol),
                start = lookahead.start,
                size = node.size,
                "reused subtree"
            );
            self.stats.reused_nodes += 1;
            let version = &mut self.versions[index];
            version.head = self.stack.push(
                Some(version.head),
                goto,
                Some(node.clone()),
                lookahead.start + node.size,
            );
            version.dynamic_precedence += node.dynamic_precedence;
            version.lex_override = Some(node.lex_state.mode);
            version.reductions = 0;
            return true;
        }
        false
    }

    fn reduce(&mut self, index: usize, production: ProductionId) {
        let Some(lookahead) = self.versions[index].lookahead.clone() else {
            self.versions[index].status = Status::Failed;
            return;
        };
        let production = self.language.production(production);
        let mut head = self.versions[index].head;

        let mut trailing = Vec::new();
        while self.stack.get(head).is_extra() {
            let entry = self.stack.get(head);
            trailing.extend(entry.subtree.clone());
            let Some(prev) = entry.prev else { break };
            head = prev;
        }

        let mut children = Vec::new();
        let mut count = 0;
        while count < production.child_count {
            let entry = self.stack.get(head);
            let (Some(subtree), Some(prev)) = (&entry.subtree, entry.prev) else {
                // popped past the bottom: the table and the stack disagree
                self.versions[index].status = Status::Failed;
                return;
            };
            if !subtree.extra {
                count += 1;
            }
            children.push(subtree.clone());
            head = prev;
        }
        children.reverse();
        trailing.reverse();

        let mut fields = Vec::new();
        let mut step = 0;
        for (child_index, child) in children.iter().enumerate() {
            if child.extra {
                continue;
            }
            if let Some(Some(field)) = production.fields.get(step) {
                fields.push((child_index as u16, *field));
            }
            step += 1;
        }

        let base = self.stack.get(head);
        let (base_state, start) = (base.state, base.position);
        let Some(goto) = self.language.goto(base_state, production.lhs) else {
            self.versions[index].status = Status::Failed;
            return;
        };
        let la = &lookahead.subtree;
        let node = Subtree::node(
            NodeSpec {
                symbol: production.lhs,
                children,
                fields,
                parse_state: base_state,
                production_precedence: production.dynamic_precedence,
                lookahead_end: lookahead.lookahead_end(),
                start,
                next_lex_state: la.lex_state,
                fragile: self.versions.len() > 1 || la.missing || la.is_error() || la.error_mode,
            },
            self.language,
        );

        let mut position = start + node.size;
        head = self.stack.push(Some(head), goto, Some(node), position);
        for extra in trailing {
            position += extra.size;
            head = self.stack.push(Some(head), goto, Some(extra), position);
        }

        let version = &mut self.versions[index];
        version.head = head;
        version.dynamic_precedence += production.dynamic_precedence;
        version.reductions += 1;
        if version.reductions > MAX_REDUCTIONS_PER_TOKEN {
            warn!(position, "reduction limit reached; dropping version");
            version.status = Status::Failed;
        }
    }

    /// Build the root from the start rule's node and the extras around it.
    fn accept(&mut self, index: usize) {
        let head = self.versions[index].head;
        let lookahead_end = self.versions[index]
            .lookahead
            .take()
            .map_or(self.source.len() + 1, |la| la.lookahead_end());
        let start_symbol = self.language.start_symbol();

        let mut children = Vec::new();
        let mut fields = Vec::new();
        let mut precedence = 0;
        for subtree in self.stack.subtrees(head) {
            if subtree.extra || subtree.symbol != start_symbol {
                children.push(subtree);
                continue;
            }
            let offset = children.len() as u16;
            fields.extend(subtree.fields.iter().map(|(i, f)| (i + offset, *f)));
            precedence = subtree.dynamic_precedence
                - subtree.children.iter().map(|c| c.dynamic_precedence).sum::<i32>();
            children.extend(subtree.children.iter().cloned());
        }

        let root = Subtree::node(
            NodeSpec {
                symbol: start_symbol,
                children,
                fields,
                parse_state: self.language.start_state(),
                production_precedence: precedence,
                lookahead_end,
                start: 0,
                next_lex_state: LexState::default(),
                fragile: false,
            },
            self.language,
        );
        let version = &mut self.versions[index];
        version.status = Status::Accepted;
        version.root = Some(root);
    }

    // =========================================================================
    // Version bookkeeping
    // =========================================================================

    fn condense(&mut self) {
        if self.versions.iter().any(|v| v.status == Status::Active) {
            self.versions.retain(|v| v.status != Status::Failed);
        }

        let mut i = 0;
        while i < self.versions.len() {
            let mut j = i + 1;
            while j < self.versions.len() {
                if self.mergeable(i, j) {
                    let j_wins = self.versions[j].preference(j) < self.versions[i].preference(i);
                    trace!(i, j, j_wins, position = self.position(i), "merge");
                    let other = self.versions.remove(j);
                    if j_wins {
                        self.versions[i] = other;
                    }
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        let active = self.versions.iter().filter(|v| v.status == Status::Active).count();
        if active > self.options.max_versions {
            let mut ranked: Vec<usize> = (0..self.versions.len())
                .filter(|&i| self.versions[i].status == Status::Active)
                .collect();
            ranked.sort_by_key(|&i| self.versions[i].preference(i));
            let dropped: Vec<usize> = ranked.split_off(self.options.max_versions);
            trace!(dropped = dropped.len(), "too many versions");
            let mut index = 0;
            self.versions.retain(|_| {
                index += 1;
                !dropped.contains(&(index - 1))
            });
        }
        self.stats.max_versions = self.stats.max_versions.max(self.versions.len());
    }

    fn mergeable(&self, i: usize, j: usize) -> bool {
        let (a, b) = (&self.versions[i], &self.versions[j]);
        let quiet = |v: &Version| {
            v.status == Status::Active && v.pending.is_none() && v.lookahead.is_none() && v.queued.is_none()
        };
        quiet(a)
            && quiet(b)
            && a.lex_override == b.lex_override
            && self.stack.equivalent(a.head, b.head)
    }

    fn best_accepted(&mut self) -> Option<Subtree> {
        let best = (0..self.versions.len())
            .filter(|&i| self.versions[i].status == Status::Accepted)
            .min_by_key(|&i| self.versions[i].preference(i))?;
        self.versions[best].root.take()
    }
}

#[cfg(test)]
mod tests;
