//! Query compilation errors.

use smol_str::SmolStr;
use thiserror::Error;

/// Why a query failed to compile. Every variant carries the byte offset in
/// the query source where the problem starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid query syntax at offset {offset}")]
    Syntax { offset: usize },

    #[error("unknown node kind `{name}` at offset {offset}")]
    NodeKind { name: SmolStr, offset: usize },

    #[error("unknown field `{name}` at offset {offset}")]
    Field { name: SmolStr, offset: usize },

    #[error("unknown capture `@{name}` at offset {offset}")]
    Capture { name: SmolStr, offset: usize },

    #[error("invalid predicate at offset {offset}: {message}")]
    Predicate { message: String, offset: usize },
}

impl QueryError {
    pub fn offset(&self) -> usize {
        match self {
            Self::Syntax { offset }
            | Self::NodeKind { offset, .. }
            | Self::Field { offset, .. }
            | Self::Capture { offset, .. }
            | Self::Predicate { offset, .. } => *offset,
        }
    }
}
