//! Grammar compilation errors.

use smol_str::SmolStr;
use thiserror::Error;

/// A fatal problem found while compiling a grammar. No partial table is
/// ever produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("grammar `{0}` has no rules")]
    EmptyGrammar(SmolStr),

    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(SmolStr),

    #[error("`{0}` is not a valid rule name")]
    InvalidRuleName(SmolStr),

    #[error("undefined symbol `{name}` referenced from `{rule}`")]
    UndefinedSymbol { name: SmolStr, rule: SmolStr },

    #[error("rule `{0}` is unreachable from the start rule")]
    UnreachableRule(SmolStr),

    #[error("rule `{0}` can never match any input")]
    NonProductiveRule(SmolStr),

    #[error("extra `{0}` must be a token")]
    NonTerminalExtra(SmolStr),

    #[error("start rule `{0}` must be a visible, non-token rule")]
    InvalidStartRule(SmolStr),

    #[error("conflict group references unknown rule `{0}`")]
    UnknownConflictRule(SmolStr),

    #[error("external token `{0}` is also defined as a rule")]
    ExternalRedefined(SmolStr),

    #[error("word token `{0}` must be a named pattern rule")]
    InvalidWordToken(SmolStr),

    #[error("invalid regex `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("symbol `{0}` cannot be used inside a token")]
    SymbolInToken(SmolStr),

    #[error("alias `{0}` wraps a non-terminal, only tokens can be aliased")]
    NonTerminalAlias(SmolStr),

    #[error("unresolved conflict in state {state} on `{lookahead}` between rules {rules:?}\n{actions}")]
    Conflict {
        state: usize,
        lookahead: SmolStr,
        rules: Vec<SmolStr>,
        actions: String,
    },

    #[error("grammar is too large: {0}")]
    TooLarge(&'static str),
}

impl CompileError {
    pub(crate) fn undefined(name: &str, rule: &str) -> Self {
        Self::UndefinedSymbol {
            name: SmolStr::new(name),
            rule: SmolStr::new(rule),
        }
    }
}
