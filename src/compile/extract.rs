//! Lexical extraction
//!
//! Splits a grammar into terminals (every string, pattern, `token(...)` and
//! aliased token) and syntactic rules that only refer to terminals by symbol.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::CompileError;
use crate::grammar::{Grammar, PrecKind, Rule};
use crate::language::Symbol;

const MAX_TOKEN_NESTING: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum TerminalKind {
    End,
    Literal(String),
    Pattern(String),
    External,
}

#[derive(Debug, Clone)]
pub(super) struct TerminalDef {
    pub name: SmolStr,
    pub named: bool,
    pub visible: bool,
    pub kind: TerminalKind,
    pub precedence: i32,
    pub immediate: bool,
}

/// A syntactic rule whose lexical parts were replaced by terminal symbols.
#[derive(Debug, Clone)]
pub(super) enum Extracted {
    Blank,
    Terminal(Symbol),
    NonTerminal(SmolStr),
    Seq(Vec<Extracted>),
    Choice(Vec<Extracted>),
    Repeat {
        rule: Box<Extracted>,
        at_least_one: bool,
    },
    Prec {
        kind: PrecKind,
        value: i32,
        rule: Box<Extracted>,
    },
    Field {
        name: SmolStr,
        rule: Box<Extracted>,
    },
}

#[derive(Debug)]
pub(super) struct Extraction {
    pub terminals: Vec<TerminalDef>,
    /// Non-lexical rules in grammar order
    pub rules: IndexMap<SmolStr, Extracted>,
    /// Named lexical rules and externals
    pub terminal_by_name: FxHashMap<SmolStr, Symbol>,
    pub extras: Vec<Symbol>,
    /// Lexical rules referenced from inside another token or an alias
    pub inlined: FxHashSet<SmolStr>,
}

/// Regex source of a token plus what is known about it.
struct TokenParts {
    regex: String,
    literal: Option<String>,
    precedence: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TerminalKey {
    String(SmolStr),
    Pattern(SmolStr),
    Token {
        immediate: bool,
        regex: String,
        precedence: Option<i32>,
    },
    Alias {
        name: SmolStr,
        named: bool,
        immediate: bool,
        regex: String,
        precedence: Option<i32>,
    },
}

pub(super) fn extract(grammar: &Grammar) -> Result<Extraction, CompileError> {
    let mut extractor = Extractor {
        grammar,
        terminals: vec![TerminalDef {
            name: SmolStr::new_static("end"),
            named: false,
            visible: false,
            kind: TerminalKind::End,
            precedence: 0,
            immediate: false,
        }],
        keys: FxHashMap::default(),
        terminal_by_name: FxHashMap::default(),
        inlined: FxHashSet::default(),
    };

    for (name, rule) in &grammar.rules {
        if rule.is_lexical() {
            extractor.add_named_terminal(name, rule)?;
        }
    }

    for name in &grammar.externals {
        if grammar.rules.contains_key(name) {
            return Err(CompileError::ExternalRedefined(name.clone()));
        }
        let symbol = extractor.push_terminal(TerminalDef {
            name: name.clone(),
            named: true,
            visible: !name.starts_with('_'),
            kind: TerminalKind::External,
            precedence: 0,
            immediate: false,
        })?;
        extractor.terminal_by_name.insert(name.clone(), symbol);
    }

    let mut rules = IndexMap::new();
    for (name, rule) in &grammar.rules {
        if !rule.is_lexical() {
            let extracted = extractor.extract_rule(rule, name)?;
            rules.insert(name.clone(), extracted);
        }
    }

    let mut extras = Vec::new();
    for extra in &grammar.extras {
        let symbol = match extra {
            Rule::Symbol(name) => match extractor.terminal_by_name.get(name) {
                Some(symbol) => *symbol,
                None if grammar.rules.contains_key(name) => {
                    return Err(CompileError::NonTerminalExtra(name.clone()));
                }
                None => return Err(CompileError::undefined(name, "extras")),
            },
            other => match extractor.extract_rule(other, "extras")? {
                Extracted::Terminal(symbol) => symbol,
                _ => return Err(CompileError::NonTerminalExtra(SmolStr::new(format!("{other:?}")))),
            },
        };
        if !extras.contains(&symbol) {
            extras.push(symbol);
        }
    }

    Ok(Extraction {
        terminals: extractor.terminals,
        rules,
        terminal_by_name: extractor.terminal_by_name,
        extras,
        inlined: extractor.inlined,
    })
}

struct Extractor<'g> {
    grammar: &'g Grammar,
    terminals: Vec<TerminalDef>,
    keys: FxHashMap<TerminalKey, Symbol>,
    terminal_by_name: FxHashMap<SmolStr, Symbol>,
    inlined: FxHashSet<SmolStr>,
}

impl Extractor<'_> {
    fn push_terminal(&mut self, def: TerminalDef) -> Result<Symbol, CompileError> {
        // u16::MAX is ERROR and nonterminals need room after the terminals
        if self.terminals.len() >= u16::MAX as usize / 2 {
            return Err(CompileError::TooLarge("too many terminals"));
        }
        self.terminals.push(def);
        Ok(Symbol((self.terminals.len() - 1) as u16))
    }

    fn terminal_for_key(
        &mut self,
        key: TerminalKey,
        make: impl FnOnce() -> TerminalDef,
    ) -> Result<Symbol, CompileError> {
        if let Some(symbol) = self.keys.get(&key) {
            return Ok(*symbol);
        }
        let symbol = self.push_terminal(make())?;
        self.keys.insert(key, symbol);
        Ok(symbol)
    }

    fn add_named_terminal(&mut self, name: &SmolStr, rule: &Rule) -> Result<(), CompileError> {
        let parts = self.token_parts(rule, 0)?;
        let immediate = matches!(rule, Rule::Token { immediate: true, .. });
        let def = TerminalDef {
            name: name.clone(),
            named: true,
            visible: !name.starts_with('_'),
            kind: terminal_kind(&parts),
            precedence: parts.precedence.unwrap_or(0),
            immediate,
        };
        let symbol = self.push_terminal(def)?;
        if let Rule::String(value) = rule {
            self.keys
                .entry(TerminalKey::String(value.clone()))
                .or_insert(symbol);
        }
        self.terminal_by_name.insert(name.clone(), symbol);
        Ok(())
    }

    fn extract_rule(&mut self, rule: &Rule, owner: &str) -> Result<Extracted, CompileError> {
        Ok(match rule {
            Rule::Blank => Extracted::Blank,
            Rule::String(value) => {
                let symbol = self.terminal_for_key(TerminalKey::String(value.clone()), || TerminalDef {
                    name: value.clone(),
                    named: false,
                    visible: true,
                    kind: TerminalKind::Literal(value.to_string()),
                    precedence: 0,
                    immediate: false,
                })?;
                Extracted::Terminal(symbol)
            }
            Rule::Pattern(regex) => {
                let symbol = self.terminal_for_key(TerminalKey::Pattern(regex.clone()), || TerminalDef {
                    name: SmolStr::new(format!("/{regex}/")),
                    named: false,
                    visible: false,
                    kind: TerminalKind::Pattern(format!("(?:{regex})")),
                    precedence: 0,
                    immediate: false,
                })?;
                Extracted::Terminal(symbol)
            }
            Rule::Token { immediate, .. } => {
                let parts = self.token_parts(rule, 0)?;
                let key = TerminalKey::Token {
                    immediate: *immediate,
                    regex: parts.regex.clone(),
                    precedence: parts.precedence,
                };
                let immediate = *immediate;
                let symbol = self.terminal_for_key(key, || {
                    let (name, visible) = match &parts.literal {
                        Some(literal) => (SmolStr::new(literal), true),
                        None => (SmolStr::new(format!("/{}/", parts.regex)), false),
                    };
                    TerminalDef {
                        name,
                        named: false,
                        visible,
                        kind: terminal_kind(&parts),
                        precedence: parts.precedence.unwrap_or(0),
                        immediate,
                    }
                })?;
                Extracted::Terminal(symbol)
            }
            Rule::Alias { name, named, rule: inner } => {
                let grammar = self.grammar;
                let lexical = match inner.as_ref() {
                    body @ (Rule::String(_) | Rule::Pattern(_) | Rule::Token { .. }) => body,
                    Rule::Symbol(target) => match grammar.rules.get(target) {
                        Some(body) if body.is_lexical() => {
                            self.inlined.insert(target.clone());
                            body
                        }
                        _ => return Err(CompileError::NonTerminalAlias(name.clone())),
                    },
                    _ => return Err(CompileError::NonTerminalAlias(name.clone())),
                };
                let parts = self.token_parts(lexical, 0)?;
                let immediate = matches!(lexical, Rule::Token { immediate: true, .. });
                let key = TerminalKey::Alias {
                    name: name.clone(),
                    named: *named,
                    immediate,
                    regex: parts.regex.clone(),
                    precedence: parts.precedence,
                };
                let named = *named;
                let symbol = self.terminal_for_key(key, || TerminalDef {
                    name: name.clone(),
                    named,
                    visible: true,
                    kind: terminal_kind(&parts),
                    precedence: parts.precedence.unwrap_or(0),
                    immediate,
                })?;
                Extracted::Terminal(symbol)
            }
            Rule::Symbol(name) => {
                if let Some(symbol) = self.terminal_by_name.get(name) {
                    Extracted::Terminal(*symbol)
                } else if self.grammar.rules.contains_key(name) {
                    Extracted::NonTerminal(name.clone())
                } else {
                    return Err(CompileError::undefined(name, owner));
                }
            }
            Rule::Seq(members) => Extracted::Seq(
                members
                    .iter()
                    .map(|m| self.extract_rule(m, owner))
                    .collect::<Result<_, _>>()?,
            ),
            Rule::Choice(members) => Extracted::Choice(
                members
                    .iter()
                    .map(|m| self.extract_rule(m, owner))
                    .collect::<Result<_, _>>()?,
            ),
            Rule::Repeat(inner) => Extracted::Repeat {
                rule: Box::new(self.extract_rule(inner, owner)?),
                at_least_one: false,
            },
            Rule::Repeat1(inner) => Extracted::Repeat {
                rule: Box::new(self.extract_rule(inner, owner)?),
                at_least_one: true,
            },
            Rule::Prec { kind, value, rule } => Extracted::Prec {
                kind: *kind,
                value: *value,
                rule: Box::new(self.extract_rule(rule, owner)?),
            },
            Rule::Field { name, rule } => Extracted::Field {
                name: name.clone(),
                rule: Box::new(self.extract_rule(rule, owner)?),
            },
        })
    }

    /// Translate a lexical rule into one regular expression.
    fn token_parts(&mut self, rule: &Rule, depth: usize) -> Result<TokenParts, CompileError> {
        if depth > MAX_TOKEN_NESTING {
            return Err(CompileError::TooLarge("token rules nest too deeply"));
        }
        let grammar = self.grammar;
        Ok(match rule {
            Rule::Blank => TokenParts {
                regex: String::new(),
                literal: Some(String::new()),
                precedence: None,
            },
            Rule::String(value) => TokenParts {
                regex: regex_syntax::escape(value),
                literal: Some(value.to_string()),
                precedence: None,
            },
            Rule::Pattern(regex) => TokenParts {
                regex: format!("(?:{regex})"),
                literal: None,
                precedence: None,
            },
            Rule::Seq(members) => {
                let parts = members
                    .iter()
                    .map(|m| self.token_parts(m, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                TokenParts {
                    regex: parts.iter().map(|p| p.regex.as_str()).collect(),
                    literal: parts
                        .iter()
                        .map(|p| p.literal.as_deref())
                        .collect::<Option<String>>(),
                    precedence: parts.iter().find_map(|p| p.precedence),
                }
            }
            Rule::Choice(members) => {
                let parts = members
                    .iter()
                    .map(|m| self.token_parts(m, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                let alternatives: Vec<&str> = parts.iter().map(|p| p.regex.as_str()).collect();
                TokenParts {
                    regex: format!("(?:{})", alternatives.join("|")),
                    literal: None,
                    precedence: parts.iter().find_map(|p| p.precedence),
                }
            }
            Rule::Repeat(inner) | Rule::Repeat1(inner) => {
                let parts = self.token_parts(inner, depth + 1)?;
                let op = if matches!(rule, Rule::Repeat(_)) { '*' } else { '+' };
                TokenParts {
                    regex: format!("(?:{}){op}", parts.regex),
                    literal: None,
                    precedence: parts.precedence,
                }
            }
            Rule::Prec { value, rule, .. } => {
                let parts = self.token_parts(rule, depth + 1)?;
                TokenParts {
                    precedence: Some(*value),
                    ..parts
                }
            }
            Rule::Token { rule, .. } | Rule::Field { rule, .. } | Rule::Alias { rule, .. } => {
                self.token_parts(rule, depth + 1)?
            }
            Rule::Symbol(name) => match grammar.rules.get(name) {
                Some(body) if body.is_lexical() => {
                    self.inlined.insert(name.clone());
                    self.token_parts(body, depth + 1)?
                }
                _ => return Err(CompileError::SymbolInToken(name.clone())),
            },
        })
    }
}

fn terminal_kind(parts: &TokenParts) -> TerminalKind {
    match &parts.literal {
        Some(literal) => TerminalKind::Literal(literal.clone()),
        None => TerminalKind::Pattern(parts.regex.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{alias, pattern, prec, sym, token, token_immediate};
    use crate::seq;

    fn grammar_with(rules: Vec<(&str, Rule)>) -> Grammar {
        let mut builder = Grammar::builder("t");
        for (name, rule) in rules {
            builder = builder.rule(name, rule);
        }
        builder.build()
    }

    #[test]
    fn test_named_string_rule_is_shared_with_literal_uses() {
        let grammar = grammar_with(vec![
            ("start", seq!["null", sym("null")]),
            ("null", Rule::from("null")),
        ]);
        let extraction = extract(&grammar).unwrap();
        let Extracted::Seq(members) = &extraction.rules["start"] else {
            panic!("expected seq");
        };
        let null = extraction.terminal_by_name["null"];
        assert!(matches!(members[0], Extracted::Terminal(s) if s == null));
        assert!(matches!(members[1], Extracted::Terminal(s) if s == null));
    }

    #[test]
    fn test_token_becomes_single_regex_with_precedence() {
        let grammar = grammar_with(vec![
            ("start", sym("comment")),
            ("comment", token(prec(2, seq!["//", pattern(r"[^\n]*")]))),
        ]);
        let extraction = extract(&grammar).unwrap();
        let comment = &extraction.terminals[extraction.terminal_by_name["comment"].index()];
        assert_eq!(comment.precedence, 2);
        assert_eq!(comment.kind, TerminalKind::Pattern(r"//(?:[^\n]*)".to_string()));
    }

    #[test]
    fn test_literal_token_stays_literal() {
        let grammar = grammar_with(vec![("start", seq![token(seq!["a", "b"]), "c"])]);
        let extraction = extract(&grammar).unwrap();
        assert!(
            extraction
                .terminals
                .iter()
                .any(|t| t.kind == TerminalKind::Literal("ab".into()) && t.visible)
        );
    }

    #[test]
    fn test_alias_of_token_renames_terminal() {
        let grammar = grammar_with(vec![(
            "start",
            alias(token_immediate(pattern("[a-z]+")), "word", true),
        )]);
        let extraction = extract(&grammar).unwrap();
        let word = extraction.terminals.iter().find(|t| t.name == "word").unwrap();
        assert!(word.named && word.visible && word.immediate);
    }

    #[test]
    fn test_alias_of_nonterminal_is_rejected() {
        let grammar = grammar_with(vec![
            ("start", alias(sym("inner"), "other", true)),
            ("inner", seq!["a", "b"]),
        ]);
        assert_eq!(
            extract(&grammar).unwrap_err(),
            CompileError::NonTerminalAlias("other".into())
        );
    }

    #[test]
    fn test_symbol_inside_token_must_be_lexical() {
        let grammar = grammar_with(vec![
            ("start", token(seq!["a", sym("inner")])),
            ("inner", seq!["b", "c"]),
        ]);
        assert_eq!(
            extract(&grammar).unwrap_err(),
            CompileError::SymbolInToken("inner".into())
        );
    }

    #[test]
    fn test_nonterminal_extra_is_rejected() {
        let grammar = Grammar::builder("t")
            .rule("start", "x")
            .rule("comment", seq!["/*", "*/"])
            .extras([sym("comment")])
            .build();
        assert_eq!(
            extract(&grammar).unwrap_err(),
            CompileError::NonTerminalExtra("comment".into())
        );
    }

    #[test]
    fn test_undefined_symbol() {
        let grammar = grammar_with(vec![("start", sym("missing"))]);
        assert_eq!(
            extract(&grammar).unwrap_err(),
            CompileError::undefined("missing", "start")
        );
    }
}
