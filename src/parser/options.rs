//! Parser options and statistics

/// Tuning knobs for [`Parser`](super::Parser).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Upper bound on simultaneously live stack versions
    pub max_versions: usize,
    /// Error recoveries allowed before the rest of the input is skipped
    pub max_recovery_attempts: usize,
    /// Reuse subtrees of the old tree when one is given (false = always
    /// parse from scratch)
    pub incremental: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_versions: 6,
            max_recovery_attempts: 1024,
            incremental: true,
        }
    }
}

impl ParserOptions {
    pub fn max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = max_versions.max(1);
        self
    }

    pub fn max_recovery_attempts(mut self, attempts: usize) -> Self {
        self.max_recovery_attempts = attempts;
        self
    }

    pub fn incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }
}

/// What the last parse did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Whether an old tree was used
    pub incremental: bool,
    pub reused_nodes: usize,
    pub reused_leaves: usize,
    /// Tokens produced by the lexer
    pub lexed_tokens: usize,
    pub recoveries: usize,
    /// Most stack versions alive at once
    pub max_versions: usize,
}
