//! Error code definitions for syntax diagnostics
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Lexical errors (bytes no token matches)
//! - E02xx: Missing tokens inserted by recovery
//! - E03xx: Unexpected input wrapped by recovery
//! - E09xx: Nothing could be parsed

use std::fmt;

use super::error::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Lexical errors
    // =========================================================================
    /// Invalid or unexpected character in source
    E0101,
    /// Bytes that are not valid UTF-8
    E0102,

    // =========================================================================
    // E02xx: Missing tokens
    // =========================================================================
    /// An anonymous token such as `;` was missing
    E0201,
    /// A named token such as an identifier was missing
    E0202,

    // =========================================================================
    // E03xx: Unexpected input
    // =========================================================================
    /// A single token the parser could not use
    E0301,
    /// A run of parsed material the parser could not use
    E0302,
    /// Input ended before a construct was complete
    E0303,

    // =========================================================================
    // E09xx: Fatal
    // =========================================================================
    /// The whole input failed to parse
    E0901,
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::E0101 | Self::E0102 => ErrorCategory::Lexical,
            Self::E0201 | Self::E0202 => ErrorCategory::Missing,
            Self::E0301 | Self::E0302 | Self::E0303 => ErrorCategory::Unexpected,
            Self::E0901 => ErrorCategory::Fatal,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "invalid character",
            Self::E0102 => "invalid UTF-8",
            Self::E0201 => "missing token",
            Self::E0202 => "missing syntax",
            Self::E0301 => "unexpected token",
            Self::E0302 => "unexpected syntax",
            Self::E0303 => "unexpected end of input",
            Self::E0901 => "syntax error",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::E0201 => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Where in the pipeline an error arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bytes no token matches
    Lexical,
    /// Zero-width tokens inserted by recovery
    Missing,
    /// Input recovery wrapped in an ERROR node
    Unexpected,
    /// Nothing could be parsed
    Fatal,
}
