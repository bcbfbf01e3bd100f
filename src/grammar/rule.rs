//! Grammar rule expressions
//!
//! The vocabulary follows the tree-sitter grammar DSL: sequences, choices,
//! repetitions, precedence annotations, lexical tokens, fields and aliases.

use smol_str::SmolStr;

/// How a precedence annotation affects conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrecKind {
    /// `prec(n, ...)`: static precedence without associativity
    Static,
    /// `prec.left(n, ...)`
    Left,
    /// `prec.right(n, ...)`
    Right,
    /// `prec.dynamic(n, ...)`: resolved at runtime between GLR versions
    Dynamic,
}

/// A grammar rule expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Matches the empty string
    Blank,
    /// A literal string token
    String(SmolStr),
    /// A regular expression token
    Pattern(SmolStr),
    /// Reference to another named rule
    Symbol(SmolStr),
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    /// Zero or more repetitions
    Repeat(Box<Rule>),
    /// One or more repetitions
    Repeat1(Box<Rule>),
    Prec {
        kind: PrecKind,
        value: i32,
        rule: Box<Rule>,
    },
    /// Collapse the inner rule into a single lexical token
    Token { immediate: bool, rule: Box<Rule> },
    Field { name: SmolStr, rule: Box<Rule> },
    Alias {
        name: SmolStr,
        named: bool,
        rule: Box<Rule>,
    },
}

impl Rule {
    /// Whether this rule, used as a whole rule body, defines a lexical token.
    pub fn is_lexical(&self) -> bool {
        matches!(self, Rule::String(_) | Rule::Pattern(_) | Rule::Token { .. })
    }
}

impl From<&str> for Rule {
    fn from(value: &str) -> Self {
        Rule::String(SmolStr::new(value))
    }
}

impl From<String> for Rule {
    fn from(value: String) -> Self {
        Rule::String(SmolStr::new(value))
    }
}

impl From<&Rule> for Rule {
    fn from(value: &Rule) -> Self {
        value.clone()
    }
}

pub fn blank() -> Rule {
    Rule::Blank
}

pub fn string(value: &str) -> Rule {
    Rule::String(SmolStr::new(value))
}

pub fn pattern(regex: &str) -> Rule {
    Rule::Pattern(SmolStr::new(regex))
}

pub fn sym(name: &str) -> Rule {
    Rule::Symbol(SmolStr::new(name))
}

pub fn seq<I>(rules: I) -> Rule
where
    I: IntoIterator,
    I::Item: Into<Rule>,
{
    Rule::Seq(rules.into_iter().map(Into::into).collect())
}

pub fn choice<I>(rules: I) -> Rule
where
    I: IntoIterator,
    I::Item: Into<Rule>,
{
    Rule::Choice(rules.into_iter().map(Into::into).collect())
}

pub fn repeat(rule: impl Into<Rule>) -> Rule {
    Rule::Repeat(Box::new(rule.into()))
}

pub fn repeat1(rule: impl Into<Rule>) -> Rule {
    Rule::Repeat1(Box::new(rule.into()))
}

/// `choice(rule, blank())`
pub fn optional(rule: impl Into<Rule>) -> Rule {
    Rule::Choice(vec![rule.into(), Rule::Blank])
}

pub fn prec(value: i32, rule: impl Into<Rule>) -> Rule {
    prec_with(PrecKind::Static, value, rule)
}

pub fn prec_left(value: i32, rule: impl Into<Rule>) -> Rule {
    prec_with(PrecKind::Left, value, rule)
}

pub fn prec_right(value: i32, rule: impl Into<Rule>) -> Rule {
    prec_with(PrecKind::Right, value, rule)
}

pub fn prec_dynamic(value: i32, rule: impl Into<Rule>) -> Rule {
    prec_with(PrecKind::Dynamic, value, rule)
}

fn prec_with(kind: PrecKind, value: i32, rule: impl Into<Rule>) -> Rule {
    Rule::Prec {
        kind,
        value,
        rule: Box::new(rule.into()),
    }
}

pub fn token(rule: impl Into<Rule>) -> Rule {
    Rule::Token {
        immediate: false,
        rule: Box::new(rule.into()),
    }
}

/// A token that only matches when no extra precedes it.
pub fn token_immediate(rule: impl Into<Rule>) -> Rule {
    Rule::Token {
        immediate: true,
        rule: Box::new(rule.into()),
    }
}

pub fn field(name: &str, rule: impl Into<Rule>) -> Rule {
    Rule::Field {
        name: SmolStr::new(name),
        rule: Box::new(rule.into()),
    }
}

/// Rename a token in the resulting tree.
///
/// `named` controls whether the renamed node is a named node (`alias($.x, $.y)`)
/// or an anonymous one (`alias($.x, "y")`).
pub fn alias(rule: impl Into<Rule>, name: &str, named: bool) -> Rule {
    Rule::Alias {
        name: SmolStr::new(name),
        named,
        rule: Box::new(rule.into()),
    }
}

/// Build a [`Rule::Seq`] from heterogeneous members.
///
/// ```
/// use zeus::{seq, grammar::sym};
/// let rule = seq!["let", sym("identifier"), ";"];
/// ```
#[macro_export]
macro_rules! seq {
    ($($rule:expr),* $(,)?) => {
        $crate::grammar::Rule::Seq(vec![$($crate::grammar::Rule::from($rule)),*])
    };
}

/// Build a [`Rule::Choice`] from heterogeneous members.
#[macro_export]
macro_rules! choice {
    ($($rule:expr),* $(,)?) => {
        $crate::grammar::Rule::Choice(vec![$($crate::grammar::Rule::from($rule)),*])
    };
}
