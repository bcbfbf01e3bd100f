//! Syntax diagnostics
//!
//! Parsing never fails outright: problems end up in the tree as ERROR nodes
//! and zero-width MISSING tokens. This module turns those into
//! [`SyntaxError`] values with:
//! - an [`ErrorCode`] and the [`Severity`] it implies
//! - hints for tokens recovery had to insert
//! - a related range pointing at the enclosing construct

mod codes;
mod collect;
mod error;

pub use codes::{ErrorCategory, ErrorCode};
pub use error::{RelatedInfo, Severity, SyntaxError};

pub(crate) use collect::collect;
