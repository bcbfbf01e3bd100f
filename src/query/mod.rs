//! Tree pattern queries
//!
//! Queries are S-expression patterns over node kinds:
//!
//! ```text
//! (function_definition
//!   name: (identifier) @name
//!   (parameter_list (parameter)* @params))
//!
//! ((call_expression function: (identifier) @callee)
//!  (#match? @callee "^print"))
//! ```
//!
//! Supported forms are `(kind child...)`, `"literal"` tokens, the `_` and
//! `(_)` wildcards, `field: pattern`, `!field`, `[alternations]`, the
//! `?`, `*` and `+` quantifiers on children, `@captures`, and the
//! `#eq?`, `#not-eq?`, `#match?` and `#not-match?` predicates. Children of a
//! pattern match in order but need not be adjacent.

mod error;
mod lexer;
mod matcher;
mod parser;

pub use error::QueryError;
pub use matcher::QueryCursor;

use smol_str::SmolStr;

use crate::language::Language;
use crate::tree::Node;
use parser::{Pattern, QueryParser};

/// A compiled query, bound to the language it was compiled for.
pub struct Query {
    patterns: Vec<Pattern>,
    capture_names: Vec<SmolStr>,
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("patterns", &self.patterns.len())
            .field("capture_names", &self.capture_names)
            .finish()
    }
}

impl Query {
    pub fn new(language: &Language, source: &str) -> Result<Self, QueryError> {
        let (patterns, capture_names) = QueryParser::new(language, source)?.parse()?;
        Ok(Self {
            patterns,
            capture_names,
        })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Capture names, indexed by [`QueryCapture::index`].
    pub fn capture_names(&self) -> &[SmolStr] {
        &self.capture_names
    }

    pub fn capture_index_for_name(&self, name: &str) -> Option<u32> {
        self.capture_names.iter().position(|n| n == name).map(|i| i as u32)
    }

    /// Byte offset in the query source where a pattern begins.
    pub fn start_byte_for_pattern(&self, index: usize) -> Option<usize> {
        self.patterns.get(index).map(|p| p.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryCapture<'tree> {
    pub node: Node<'tree>,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatch<'tree> {
    pub pattern_index: usize,
    /// In document order.
    pub captures: Vec<QueryCapture<'tree>>,
}

impl<'tree> QueryMatch<'tree> {
    pub fn nodes_for_capture_index(&self, index: u32) -> impl Iterator<Item = Node<'tree>> + '_ {
        self.captures.iter().filter(move |c| c.index == index).map(|c| c.node)
    }
}
