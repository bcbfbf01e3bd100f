//! Immutable, shareable parse tree nodes
//!
//! A [`Subtree`] is what the parser pushes on its stack and what a finished
//! tree is made of. Subtrees never store absolute positions, only sizes, so
//! an unchanged subtree from an old tree can be pushed into a new parse by
//! cloning the `Arc`.

use std::sync::Arc;

use crate::language::{FieldId, Language, StateId, Symbol};
use crate::lexer::LexState;

#[derive(Clone)]
pub(crate) struct Subtree(Arc<SubtreeData>);

#[derive(Debug)]
pub(crate) struct SubtreeData {
    pub symbol: Symbol,
    /// Tokens are leaves; reductions and error nodes are not, even when empty
    pub leaf: bool,
    pub size: usize,
    /// Bytes past the end that influenced this subtree
    pub lookahead_bytes: usize,
    /// For leaves, the state the token was lexed in. For nodes, the state
    /// the node was pushed on top of.
    pub parse_state: StateId,
    /// Lex state of a leaf; for nodes, the lex state of the token that
    /// followed the node's last leaf
    pub lex_state: LexState,
    pub extra: bool,
    pub missing: bool,
    pub error_mode: bool,
    pub fragile: bool,
    pub has_error: bool,
    pub dynamic_precedence: i32,
    pub error_cost: u32,
    /// Visible children, looking through hidden ones
    pub visible_child_count: usize,
    pub children: Vec<Subtree>,
    /// `(child index, field)`, sorted by child index
    pub fields: Vec<(u16, FieldId)>,
}

impl std::fmt::Debug for Subtree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subtree")
            .field("symbol", &self.0.symbol)
            .field("size", &self.0.size)
            .field("children", &self.0.children.len())
            .finish()
    }
}

impl std::ops::Deref for Subtree {
    type Target = SubtreeData;

    fn deref(&self) -> &SubtreeData {
        &self.0
    }
}

/// Everything needed to build an inner node.
pub(crate) struct NodeSpec {
    pub symbol: Symbol,
    pub children: Vec<Subtree>,
    pub fields: Vec<(u16, FieldId)>,
    pub parse_state: StateId,
    pub production_precedence: i32,
    /// Absolute end (including lookahead) of the token the reduction looked at
    pub lookahead_end: usize,
    /// Absolute start of the node
    pub start: usize,
    pub next_lex_state: LexState,
    pub fragile: bool,
}

impl Subtree {
    pub fn leaf(
        symbol: Symbol,
        size: usize,
        lookahead_bytes: usize,
        parse_state: StateId,
        lex_state: LexState,
        error_mode: bool,
    ) -> Self {
        let error = symbol == Symbol::ERROR;
        Subtree(Arc::new(SubtreeData {
            symbol,
            leaf: true,
            size,
            lookahead_bytes,
            parse_state,
            lex_state,
            extra: false,
            missing: false,
            error_mode,
            fragile: false,
            has_error: error,
            dynamic_precedence: 0,
            error_cost: 0,
            visible_child_count: 0,
            children: Vec::new(),
            fields: Vec::new(),
        }))
    }

    /// A zero-width token inserted by error recovery.
    pub fn missing(symbol: Symbol, parse_state: StateId, lex_state: LexState, error_cost: u32) -> Self {
        Subtree(Arc::new(SubtreeData {
            symbol,
            leaf: true,
            size: 0,
            lookahead_bytes: 0,
            parse_state,
            lex_state,
            extra: false,
            missing: true,
            error_mode: false,
            fragile: true,
            has_error: true,
            dynamic_precedence: 0,
            error_cost,
            visible_child_count: 0,
            children: Vec::new(),
            fields: Vec::new(),
        }))
    }

    pub fn node(spec: NodeSpec, language: &Language) -> Self {
        let mut size = 0;
        let mut lookahead_end = spec.lookahead_end;
        let mut fragile = spec.fragile;
        let mut has_error = spec.symbol == Symbol::ERROR;
        let mut dynamic_precedence = spec.production_precedence;
        let mut error_cost = 0;
        let mut visible_child_count = 0;
        for child in &spec.children {
            size += child.size;
            lookahead_end = lookahead_end.max(spec.start + size + child.lookahead_bytes);
            fragile |= child.fragile;
            has_error |= child.has_error;
            dynamic_precedence += child.dynamic_precedence;
            error_cost += child.error_cost;
            visible_child_count += child.visible_weight(language);
        }
        Subtree(Arc::new(SubtreeData {
            symbol: spec.symbol,
            leaf: false,
            size,
            lookahead_bytes: lookahead_end.saturating_sub(spec.start + size),
            parse_state: spec.parse_state,
            lex_state: spec.next_lex_state,
            extra: false,
            missing: false,
            error_mode: false,
            fragile,
            has_error,
            dynamic_precedence,
            error_cost,
            visible_child_count,
            children: spec.children,
            fields: spec.fields,
        }))
    }

    /// Copy of this subtree with different `extra` flag and error cost.
    pub fn with_flags(&self, extra: bool, error_cost: u32) -> Self {
        if self.extra == extra && self.error_cost == error_cost {
            return self.clone();
        }
        let data = &self.0;
        Subtree(Arc::new(SubtreeData {
            symbol: data.symbol,
            leaf: data.leaf,
            size: data.size,
            lookahead_bytes: data.lookahead_bytes,
            parse_state: data.parse_state,
            lex_state: data.lex_state,
            extra,
            missing: data.missing,
            error_mode: data.error_mode,
            fragile: data.fragile,
            has_error: data.has_error,
            dynamic_precedence: data.dynamic_precedence,
            error_cost,
            visible_child_count: data.visible_child_count,
            children: data.children.clone(),
            fields: data.fields.clone(),
        }))
    }

    pub fn is_error(&self) -> bool {
        self.symbol == Symbol::ERROR
    }

    pub fn ptr_eq(&self, other: &Subtree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn field_for_child(&self, index: usize) -> Option<FieldId> {
        self.fields
            .binary_search_by_key(&(index as u16), |(i, _)| *i)
            .ok()
            .map(|at| self.fields[at].1)
    }

    /// How many visible nodes this subtree contributes to its parent.
    pub fn visible_weight(&self, language: &Language) -> usize {
        if self.is_visible(language) {
            1
        } else {
            self.visible_child_count
        }
    }

    pub fn is_visible(&self, language: &Language) -> bool {
        self.symbol == Symbol::ERROR || self.missing || language.symbol_metadata(self.symbol).visible
    }

    /// Hidden nonterminals are looked through; hidden tokens are skipped.
    pub fn is_transparent(&self, language: &Language) -> bool {
        !self.is_visible(language) && !language.is_terminal(self.symbol)
    }
}

impl Drop for SubtreeData {
    // Long repetitions nest deeply; drop them without recursion.
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(child) = stack.pop() {
            if let Ok(mut data) = Arc::try_unwrap(child.0) {
                stack.append(&mut data.children);
            }
        }
    }
}
