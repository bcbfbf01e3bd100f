//! Logos-based lexer for query source

use logos::Logos;

use super::QueryError;

/// A token with its kind, text, and position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

/// Lexer wrapping the logos-generated tokenizer
pub(super) struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = self.inner.next()?;
        let offset = self.inner.span().start;
        Some(match kind {
            Ok(kind) => Ok(Token {
                kind,
                text: self.inner.slice(),
                offset,
            }),
            Err(()) => Err(QueryError::Syntax { offset }),
        })
    }
}

/// Whitespace and `;` comments are skipped.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"([ \t\r\n\f]+|;[^\n]*)")]
pub(super) enum TokenKind {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(":")]
    Colon,

    #[token("?")]
    Question,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("!")]
    Bang,

    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_\-.]*")]
    Capture,

    #[regex(r"#[a-zA-Z_][a-zA-Z0-9_\-]*[?!]?")]
    Predicate,

    /// Node kinds, field names and the `_` wildcard
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_\-.]*")]
    Identifier,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,
}

/// The contents of a string token with escapes resolved.
pub(super) fn unescape(token: &str) -> String {
    let inner = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|t| t.map(|t| t.kind)).collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn test_lex_node_pattern() {
        assert_eq!(
            kinds("(call_expression function: (identifier) @f)"),
            vec![
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Capture,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_lex_predicate_and_string() {
        let tokens: Vec<_> = Lexer::new(r#"(#eq? @a "x\"y")"#).map(Result::unwrap).collect();
        assert_eq!(tokens[1].kind, TokenKind::Predicate);
        assert_eq!(tokens[1].text, "#eq?");
        assert_eq!(tokens[3].kind, TokenKind::String);
        assert_eq!(unescape(tokens[3].text), "x\"y");
    }

    #[test]
    fn test_lex_skips_comments() {
        assert_eq!(kinds("; a comment\n_ ; another"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_lex_error_offset() {
        let err = Lexer::new("(a) $").find_map(Result::err).unwrap();
        assert_eq!(err, QueryError::Syntax { offset: 4 });
    }
}
