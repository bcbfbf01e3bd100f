//! Syntax error values
//!
//! A [`SyntaxError`] describes one ERROR or MISSING node: what went wrong,
//! where, and, when recovery inserted a token, what a fix could look like.

use std::fmt;

use text_size::{TextRange, TextSize};

use super::codes::ErrorCode;
use crate::base::LineIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Punctuation recovery could insert without guessing at structure
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// The construct an error interrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub message: String,
    pub range: TextRange,
}

impl RelatedInfo {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    /// Byte range in the parsed source; empty for MISSING tokens
    pub range: TextRange,
    pub code: ErrorCode,
    pub severity: Severity,
    pub hint: Option<String>,
    pub related: Vec<RelatedInfo>,
}

impl SyntaxError {
    /// An error with the code's default message and severity.
    pub fn new(code: ErrorCode, range: TextRange) -> Self {
        Self {
            message: code.default_message().to_string(),
            range,
            code,
            severity: code.severity(),
            hint: None,
            related: Vec::new(),
        }
    }

    pub(crate) fn missing(code: ErrorCode, offset: TextSize) -> Self {
        Self::new(code, TextRange::empty(offset))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn has_related(&self) -> bool {
        !self.related.is_empty()
    }

    /// One line per error plus indented hint and notes, with positions as
    /// 1-based `line:column`.
    pub fn render(&self, lines: &LineIndex) -> String {
        let at = |offset: TextSize| lines.line_col(offset);
        let mut out = format!("{} {}[{}]: {}", at(self.range.start()), self.severity, self.code, self.message);
        if let Some(hint) = &self.hint {
            out.push_str("\n  hint: ");
            out.push_str(hint);
        }
        for related in &self.related {
            out.push_str(&format!("\n  note: {} at {}", related.message, at(related.range.start())));
        }
        out
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}
