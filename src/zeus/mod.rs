//! The bundled Zeus grammar
//!
//! Zeus is a small systems language with structs, generics, pointers and
//! `match` expressions. Its grammar is compiled on first use and shared by
//! every caller afterwards.
//!
//! ```
//! let language = zeus::zeus::language().unwrap();
//! let tree = zeus::Parser::new(language).parse(b"fn main() { return 0; }");
//! assert!(!tree.has_error());
//! ```

mod grammar;

pub use grammar::grammar;

use std::sync::LazyLock;

use crate::compile::{CompileError, compile};
use crate::language::Language;

static LANGUAGE: LazyLock<Result<Language, CompileError>> = LazyLock::new(|| compile(&grammar()));

/// The compiled Zeus language. Compilation happens once per process.
pub fn language() -> Result<Language, CompileError> {
    LANGUAGE.clone()
}
