//! # zeus-syntax
//!
//! Table-driven incremental GLR parsing, with a bundled grammar for the
//! Zeus language.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! zeus      → The bundled Zeus grammar, compiled once
//!   ↓
//! query     → S-expression patterns over trees
//!   ↓
//! parser    → GLR driver, error recovery, incremental reuse
//!   ↓
//! tree      → Immutable shared syntax trees, Node/TreeCursor views
//!   ↓       → errors: diagnostics collected from a tree
//! lexer     → Table-driven, state-aware tokenization
//!   ↓
//! compile   → Grammar → LR(1) tables (with lexical modes)
//!   ↓
//! language  → The compiled, immutable tables
//!   ↓
//! grammar   → Grammar DSL
//!   ↓
//! base      → Primitives (Point, LineIndex, TextRange)
//! ```
//!
//! ## Example
//!
//! ```
//! use zeus::grammar::{Grammar, pattern, repeat, sym};
//! use zeus::{Parser, compile, seq};
//!
//! let grammar = Grammar::builder("lists")
//!     .rule("program", repeat(sym("item")))
//!     .rule("item", seq![sym("number"), ";"])
//!     .rule("number", pattern(r"\d+"))
//!     .build();
//! let language = compile(&grammar).unwrap();
//! let tree = Parser::new(language).parse(b"1; 2;");
//! assert_eq!(tree.to_sexp(), "(program (item (number)) (item (number)))");
//! ```

// ============================================================================
// MODULES (dependency order: base → grammar → language → compile → lexer → tree → parser)
// ============================================================================

/// Foundation types: Point, LineIndex, TextRange
pub mod base;

/// Grammar DSL: rules, precedence, fields, aliases
pub mod grammar;

/// Compiled language tables
pub mod language;

/// Grammar compilation into parse and lex tables
pub mod compile;

/// Lexing on demand, plus the external scanner hook
pub mod lexer;

/// Syntax trees and node views
pub mod tree;

/// Diagnostics built from ERROR and MISSING nodes
pub mod errors;

/// Text edits and their mapping onto old trees
pub mod edit;

/// The GLR parser
pub mod parser;

/// Tree pattern queries
pub mod query;

/// The bundled Zeus grammar
pub mod zeus;

// Re-export the parsing entry points
pub use compile::{CompileError, compile};
pub use edit::{Edit, EditError};
pub use parser::{ParseStats, Parser, ParserOptions, parse_batch};

// Re-export tree and language types
pub use base::{LineIndex, Point, TextRange, TextSize};
pub use errors::{ErrorCategory, ErrorCode, Severity, SyntaxError};
pub use grammar::{Grammar, Rule};
pub use language::{Action, Language, Symbol};
pub use lexer::{ExternalScanner, ScanInput};
pub use query::{Query, QueryCapture, QueryCursor, QueryError, QueryMatch};
pub use tree::{Node, Tree, TreeCursor};
