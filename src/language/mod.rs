//! Compiled languages
//!
//! A [`Language`] is the immutable output of [`compile`](crate::compile):
//! symbol metadata, productions, the LR action/goto table and the lexical
//! definitions for every terminal. It is cheap to clone and safe to share
//! between threads; parsers only ever read from it.

mod token;

pub(crate) use token::{Matcher, TokenDef, build_dfa};

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::lexer::ExternalScanner;

/// A grammar symbol: a terminal, a nonterminal, or one of the
/// built-in [`END`](Symbol::END) and [`ERROR`](Symbol::ERROR) symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub(crate) u16);

impl Symbol {
    /// End of input
    pub const END: Symbol = Symbol(0);
    /// Error nodes and unrecognised input
    pub const ERROR: Symbol = Symbol(u16::MAX);

    pub fn raw(self) -> u16 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

pub type StateId = u16;
pub type FieldId = u16;
pub type ProductionId = u16;

/// A parse table action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

/// Display information for a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMetadata {
    pub name: SmolStr,
    /// Named nodes come from named rules or named aliases
    pub named: bool,
    /// Hidden symbols never appear as nodes
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Production {
    pub lhs: Symbol,
    pub child_count: u16,
    /// Field for each right-hand side step
    pub fields: Box<[Option<FieldId>]>,
    pub dynamic_precedence: i32,
}

/// The terminals a state can accept, plus which external tokens are valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexMode {
    pub valid: Box<[Symbol]>,
    pub external_valid: Box<[bool]>,
}

pub(crate) const NO_GOTO: u16 = u16::MAX;
pub(crate) const NO_ACTIONS: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub(crate) struct ParseTable {
    pub state_count: usize,
    pub terminal_count: usize,
    pub nonterminal_count: usize,
    /// `state * terminal_count + terminal` -> index into `action_lists`
    pub action_index: Vec<u32>,
    pub action_lists: Vec<Box<[Action]>>,
    /// `state * nonterminal_count + (symbol - terminal_count)`
    pub gotos: Vec<u16>,
    pub lex_mode_of_state: Vec<u16>,
    pub lex_modes: Vec<LexMode>,
}

#[derive(Debug)]
pub(crate) struct LanguageData {
    pub name: SmolStr,
    pub symbols: Vec<SymbolMetadata>,
    /// Indexed by terminal symbol
    pub tokens: Vec<TokenDef>,
    pub externals: Vec<Symbol>,
    pub extras: Box<[Symbol]>,
    pub word: Option<Symbol>,
    pub keywords: FxHashMap<Box<[u8]>, Symbol>,
    pub fields: Vec<SmolStr>,
    pub productions: Vec<Production>,
    pub table: ParseTable,
    pub start_symbol: Symbol,
}

static ERROR_METADATA: SymbolMetadata = SymbolMetadata {
    name: SmolStr::new_static("ERROR"),
    named: true,
    visible: true,
};

/// An immutable, shareable compiled grammar.
#[derive(Clone)]
pub struct Language {
    pub(crate) data: Arc<LanguageData>,
    pub(crate) scanner: Option<Arc<dyn ExternalScanner>>,
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.data.name)
            .field("states", &self.data.table.state_count)
            .field("symbols", &self.data.symbols.len())
            .field("external_scanner", &self.scanner.is_some())
            .finish()
    }
}

impl Language {
    pub(crate) fn new(data: LanguageData) -> Self {
        Self {
            data: Arc::new(data),
            scanner: None,
        }
    }

    /// Attach the scanner that recognises this language's external tokens.
    pub fn with_external_scanner(mut self, scanner: Arc<dyn ExternalScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Two handles refer to the same compiled tables.
    pub fn same_tables(&self, other: &Language) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    // =========================================================================
    // Symbols and fields
    // =========================================================================

    pub fn symbol_count(&self) -> usize {
        self.data.symbols.len()
    }

    pub fn terminal_count(&self) -> usize {
        self.data.table.terminal_count
    }

    pub fn state_count(&self) -> usize {
        self.data.table.state_count
    }

    pub fn production_count(&self) -> usize {
        self.data.productions.len()
    }

    pub fn start_symbol(&self) -> Symbol {
        self.data.start_symbol
    }

    pub fn start_state(&self) -> StateId {
        0
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        symbol != Symbol::ERROR && symbol.index() < self.data.table.terminal_count
    }

    pub fn symbol_metadata(&self, symbol: Symbol) -> &SymbolMetadata {
        self.data
            .symbols
            .get(symbol.index())
            .unwrap_or(&ERROR_METADATA)
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        &self.symbol_metadata(symbol).name
    }

    /// Look up a symbol by name. Named and anonymous symbols live in
    /// separate namespaces, so `("if", false)` is the keyword token and
    /// `("if", true)` would be a rule called `if`.
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<Symbol> {
        if named && name == "ERROR" {
            return Some(Symbol::ERROR);
        }
        self.data
            .symbols
            .iter()
            .position(|meta| meta.visible && meta.named == named && meta.name == name)
            .map(|i| Symbol(i as u16))
    }

    /// Every visible symbol with this name and kind. Aliases can give
    /// several symbols the same name.
    pub(crate) fn symbols_for_name(&self, name: &str, named: bool) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self
            .data
            .symbols
            .iter()
            .enumerate()
            .filter(|(_, meta)| meta.visible && meta.named == named && meta.name == name)
            .map(|(i, _)| Symbol(i as u16))
            .collect();
        if named && name == "ERROR" {
            symbols.push(Symbol::ERROR);
        }
        symbols
    }

    pub fn field_count(&self) -> usize {
        self.data.fields.len()
    }

    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        self.data.fields.get(field as usize).map(SmolStr::as_str)
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.data
            .fields
            .iter()
            .position(|f| f == name)
            .map(|i| i as FieldId)
    }

    pub fn is_extra(&self, symbol: Symbol) -> bool {
        self.data.extras.contains(&symbol)
    }

    // =========================================================================
    // Parse table
    // =========================================================================

    /// Actions for a terminal in a state, preferred action first.
    /// An empty slice means the terminal is a syntax error here.
    pub fn action(&self, state: StateId, symbol: Symbol) -> &[Action] {
        let table = &self.data.table;
        if !self.is_terminal(symbol) || state as usize >= table.state_count {
            return &[];
        }
        let index = table.action_index[state as usize * table.terminal_count + symbol.index()];
        if index == NO_ACTIONS {
            return &[];
        }
        &table.action_lists[index as usize]
    }

    /// The state reached after reducing to `symbol` on top of `state`.
    pub fn goto(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        let table = &self.data.table;
        if symbol == Symbol::ERROR
            || symbol.index() < table.terminal_count
            || state as usize >= table.state_count
        {
            return None;
        }
        let column = symbol.index() - table.terminal_count;
        let next = table.gotos[state as usize * table.nonterminal_count + column];
        (next != NO_GOTO).then_some(next)
    }

    pub(crate) fn production(&self, id: ProductionId) -> &Production {
        &self.data.productions[id as usize]
    }

    pub(crate) fn lex_mode_id(&self, state: StateId) -> u16 {
        self.data.table.lex_mode_of_state[state as usize]
    }

    pub(crate) fn lex_mode(&self, id: u16) -> &LexMode {
        &self.data.table.lex_modes[id as usize]
    }

    pub(crate) fn token(&self, symbol: Symbol) -> &TokenDef {
        &self.data.tokens[symbol.index()]
    }

    /// Terminals with at least one action in `state`, in symbol order.
    pub fn valid_terminals(&self, state: StateId) -> &[Symbol] {
        &self.lex_mode(self.lex_mode_id(state)).valid
    }
}
