//! Recursive descent over query tokens
//!
//! Produces one [`Pattern`] per top-level form. Node kinds, fields and
//! captures are resolved against the language while parsing, so a query
//! that compiles can be run without further lookups.

use indexmap::IndexSet;
use regex::bytes::Regex;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::QueryError;
use super::lexer::{Lexer, Token, TokenKind, unescape};
use crate::language::{FieldId, Language, Symbol};

// =============================================================================
// Compiled form
// =============================================================================

pub(super) struct Pattern {
    pub root: Step,
    pub predicates: Vec<Predicate>,
    pub offset: usize,
}

pub(super) struct Step {
    pub kind: StepKind,
    pub captures: Vec<u32>,
}

pub(super) enum StepKind {
    Node {
        test: KindTest,
        children: Vec<ChildStep>,
        absent_fields: Vec<FieldId>,
    },
    Alternation(Vec<Step>),
}

pub(super) enum KindTest {
    /// `_`
    Any,
    /// `(_)`
    AnyNamed,
    Symbols(Vec<Symbol>),
}

pub(super) struct ChildStep {
    pub field: Option<FieldId>,
    pub quantifier: Quantifier,
    pub step: Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Quantifier {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Quantifier {
    /// Minimum and maximum number of sibling matches.
    pub fn bounds(self) -> (usize, usize) {
        match self {
            Self::One => (1, 1),
            Self::ZeroOrOne => (0, 1),
            Self::ZeroOrMore => (0, usize::MAX),
            Self::OneOrMore => (1, usize::MAX),
        }
    }
}

pub(super) enum Operand {
    Capture(u32),
    Text(String),
}

pub(super) enum Predicate {
    Eq {
        capture: u32,
        value: Operand,
        negated: bool,
    },
    Match {
        capture: u32,
        regex: Regex,
        negated: bool,
    },
}

/// A predicate as written, before its captures are checked against the
/// pattern it belongs to.
struct RawPredicate<'a> {
    name: Token<'a>,
    args: Vec<Token<'a>>,
}

// =============================================================================
// Parser
// =============================================================================

pub(super) struct QueryParser<'a> {
    language: &'a Language,
    tokens: Vec<Token<'a>>,
    pos: usize,
    source_len: usize,
    captures: IndexSet<SmolStr>,
    pattern_captures: FxHashSet<u32>,
    predicates: Vec<RawPredicate<'a>>,
}

impl<'a> QueryParser<'a> {
    pub fn new(language: &'a Language, source: &'a str) -> Result<Self, QueryError> {
        Ok(Self {
            language,
            tokens: Lexer::new(source).collect::<Result<_, _>>()?,
            pos: 0,
            source_len: source.len(),
            captures: IndexSet::new(),
            pattern_captures: FxHashSet::default(),
            predicates: Vec::new(),
        })
    }

    /// Parse every pattern. Returns them with the capture names in index
    /// order.
    pub fn parse(mut self) -> Result<(Vec<Pattern>, Vec<SmolStr>), QueryError> {
        let mut patterns = Vec::new();
        while self.pos < self.tokens.len() {
            patterns.push(self.parse_pattern()?);
        }
        Ok((patterns, self.captures.into_iter().collect()))
    }

    fn parse_pattern(&mut self) -> Result<Pattern, QueryError> {
        self.pattern_captures.clear();
        self.predicates.clear();
        let offset = self.offset();

        let is_group = self.peek_kind(0) == Some(TokenKind::LParen)
            && matches!(
                self.peek_kind(1),
                Some(TokenKind::LParen | TokenKind::LBracket | TokenKind::String)
            );
        let root = if is_group { self.parse_group()? } else { self.parse_step()? };

        let raw = std::mem::take(&mut self.predicates);
        let predicates = raw
            .into_iter()
            .map(|p| self.resolve_predicate(p))
            .collect::<Result<_, _>>()?;
        Ok(Pattern {
            root,
            predicates,
            offset,
        })
    }

    /// `((pattern) predicate...)`, with optional captures after the group.
    fn parse_group(&mut self) -> Result<Step, QueryError> {
        self.expect(TokenKind::LParen)?;
        let mut inner = None;
        while self.peek_kind(0) != Some(TokenKind::RParen) {
            if self.at_predicate() {
                self.parse_predicate()?;
                continue;
            }
            let offset = self.offset();
            let step = self.parse_step()?;
            if inner.replace(step).is_some() {
                return Err(QueryError::Syntax { offset });
            }
        }
        let close = self.expect(TokenKind::RParen)?;
        let mut step = inner.ok_or(QueryError::Syntax { offset: close.offset })?;
        self.parse_captures(&mut step)?;
        Ok(step)
    }

    fn parse_step(&mut self) -> Result<Step, QueryError> {
        let mut step = self.parse_body()?;
        self.parse_captures(&mut step)?;
        Ok(step)
    }

    fn parse_child(&mut self, field: Option<FieldId>) -> Result<ChildStep, QueryError> {
        let mut step = self.parse_body()?;
        let quantifier = match self.peek_kind(0) {
            Some(TokenKind::Question) => Quantifier::ZeroOrOne,
            Some(TokenKind::Star) => Quantifier::ZeroOrMore,
            Some(TokenKind::Plus) => Quantifier::OneOrMore,
            _ => Quantifier::One,
        };
        if quantifier != Quantifier::One {
            self.pos += 1;
        }
        self.parse_captures(&mut step)?;
        Ok(ChildStep {
            field,
            quantifier,
            step,
        })
    }

    fn parse_body(&mut self) -> Result<Step, QueryError> {
        let token = self.bump()?;
        let kind = match token.kind {
            TokenKind::LParen => self.parse_node()?,
            TokenKind::LBracket => {
                let mut branches = Vec::new();
                while self.peek_kind(0) != Some(TokenKind::RBracket) {
                    branches.push(self.parse_step()?);
                }
                self.expect(TokenKind::RBracket)?;
                if branches.is_empty() {
                    return Err(QueryError::Syntax { offset: token.offset });
                }
                StepKind::Alternation(branches)
            }
            TokenKind::String => {
                let literal = unescape(token.text);
                let symbols = self.language.symbols_for_name(&literal, false);
                if symbols.is_empty() {
                    return Err(QueryError::NodeKind {
                        name: literal.into(),
                        offset: token.offset,
                    });
                }
                leaf_test(KindTest::Symbols(symbols))
            }
            TokenKind::Identifier if token.text == "_" => leaf_test(KindTest::Any),
            _ => return Err(QueryError::Syntax { offset: token.offset }),
        };
        Ok(Step {
            kind,
            captures: Vec::new(),
        })
    }

    /// The rest of `(kind child...)` after the opening parenthesis.
    fn parse_node(&mut self) -> Result<StepKind, QueryError> {
        let name = self.expect(TokenKind::Identifier)?;
        let test = if name.text == "_" {
            KindTest::AnyNamed
        } else {
            let symbols = self.language.symbols_for_name(name.text, true);
            if symbols.is_empty() {
                return Err(QueryError::NodeKind {
                    name: name.text.into(),
                    offset: name.offset,
                });
            }
            KindTest::Symbols(symbols)
        };

        let mut children = Vec::new();
        let mut absent_fields = Vec::new();
        loop {
            match (self.peek_kind(0), self.peek_kind(1)) {
                (Some(TokenKind::RParen), _) => break,
                (Some(TokenKind::Bang), _) => {
                    self.pos += 1;
                    let field = self.expect(TokenKind::Identifier)?;
                    absent_fields.push(self.field(field)?);
                }
                (Some(TokenKind::Identifier), Some(TokenKind::Colon)) => {
                    let field = self.bump()?;
                    let field = self.field(field)?;
                    self.pos += 1;
                    children.push(self.parse_child(Some(field))?);
                }
                _ if self.at_predicate() => self.parse_predicate()?,
                _ => children.push(self.parse_child(None)?),
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(StepKind::Node {
            test,
            children,
            absent_fields,
        })
    }

    fn parse_captures(&mut self, step: &mut Step) -> Result<(), QueryError> {
        while self.peek_kind(0) == Some(TokenKind::Capture) {
            let token = self.bump()?;
            let (index, _) = self.captures.insert_full(SmolStr::new(&token.text[1..]));
            let index = index as u32;
            self.pattern_captures.insert(index);
            step.captures.push(index);
        }
        Ok(())
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    fn at_predicate(&self) -> bool {
        self.peek_kind(0) == Some(TokenKind::LParen) && self.peek_kind(1) == Some(TokenKind::Predicate)
    }

    fn parse_predicate(&mut self) -> Result<(), QueryError> {
        self.expect(TokenKind::LParen)?;
        let name = self.expect(TokenKind::Predicate)?;
        let mut args = Vec::new();
        while self.peek_kind(0) != Some(TokenKind::RParen) {
            let arg = self.bump()?;
            if !matches!(arg.kind, TokenKind::Capture | TokenKind::String) {
                return Err(QueryError::Syntax { offset: arg.offset });
            }
            args.push(arg);
        }
        self.expect(TokenKind::RParen)?;
        self.predicates.push(RawPredicate { name, args });
        Ok(())
    }

    fn resolve_predicate(&self, raw: RawPredicate<'a>) -> Result<Predicate, QueryError> {
        let offset = raw.name.offset;
        let invalid = |message: &str| QueryError::Predicate {
            message: format!("`{}` {message}", raw.name.text),
            offset,
        };
        let (negated, base) = match raw.name.text {
            "#eq?" => (false, "eq"),
            "#not-eq?" => (true, "eq"),
            "#match?" => (false, "match"),
            "#not-match?" => (true, "match"),
            _ => return Err(invalid("is not a known predicate")),
        };
        let [first, second] = raw.args.as_slice() else {
            return Err(invalid("takes exactly two arguments"));
        };
        if first.kind != TokenKind::Capture {
            return Err(invalid("needs a capture as its first argument"));
        }
        let capture = self.capture(first)?;

        if base == "eq" {
            let value = match second.kind {
                TokenKind::Capture => Operand::Capture(self.capture(second)?),
                _ => Operand::Text(unescape(second.text)),
            };
            return Ok(Predicate::Eq {
                capture,
                value,
                negated,
            });
        }
        if second.kind != TokenKind::String {
            return Err(invalid("needs a string as its second argument"));
        }
        let regex = Regex::new(&unescape(second.text)).map_err(|e| QueryError::Predicate {
            message: e.to_string(),
            offset: second.offset,
        })?;
        Ok(Predicate::Match {
            capture,
            regex,
            negated,
        })
    }

    fn capture(&self, token: &Token<'_>) -> Result<u32, QueryError> {
        let name = &token.text[1..];
        self.captures
            .get_index_of(name)
            .map(|i| i as u32)
            .filter(|i| self.pattern_captures.contains(i))
            .ok_or_else(|| QueryError::Capture {
                name: name.into(),
                offset: token.offset,
            })
    }

    fn field(&self, token: Token<'_>) -> Result<FieldId, QueryError> {
        self.language.field_id(token.text).ok_or_else(|| QueryError::Field {
            name: token.text.into(),
            offset: token.offset,
        })
    }

    // =========================================================================
    // Token access
    // =========================================================================

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self, ahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| t.kind)
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.source_len, |t| t.offset)
    }

    fn bump(&mut self) -> Result<Token<'a>, QueryError> {
        let token = self.peek().ok_or(QueryError::Syntax {
            offset: self.source_len,
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, QueryError> {
        let token = self.bump()?;
        if token.kind != kind {
            return Err(QueryError::Syntax { offset: token.offset });
        }
        Ok(token)
    }
}

fn leaf_test(test: KindTest) -> StepKind {
    StepKind::Node {
        test,
        children: Vec::new(),
        absent_fields: Vec::new(),
    }
}
