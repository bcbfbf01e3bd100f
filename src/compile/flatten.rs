//! Flattening extracted rules into productions
//!
//! Choices are expanded into separate productions, repetitions get hidden
//! auxiliary rules (`A -> A x | x`), and precedence, associativity and fields
//! are pushed down onto the individual right-hand side steps.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::CompileError;
use super::extract::{Extracted, Extraction};
use crate::grammar::PrecKind;
use crate::language::Symbol;

/// Left-hand side of the augmented start production.
pub(super) const AUGMENTED: Symbol = Symbol(u16::MAX - 1);

const MAX_ALTERNATIVES: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Assoc {
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct Step {
    pub symbol: Symbol,
    pub precedence: i32,
    pub associativity: Assoc,
    pub field: Option<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct FlatProduction {
    pub lhs: Symbol,
    pub steps: Vec<Step>,
    pub dynamic_precedence: i32,
}

#[derive(Debug, Clone)]
pub(super) struct NonterminalInfo {
    pub name: SmolStr,
    pub hidden: bool,
    /// The named rule this nonterminal came from (itself, for named rules)
    pub owner: SmolStr,
}

#[derive(Debug)]
pub(super) struct SyntaxGrammar {
    pub terminal_count: usize,
    pub nonterminals: Vec<NonterminalInfo>,
    /// Production 0 is the augmented start production
    pub productions: Vec<FlatProduction>,
    pub start: Symbol,
    pub symbol_by_name: FxHashMap<SmolStr, Symbol>,
}

impl SyntaxGrammar {
    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        symbol.index() < self.terminal_count
    }

    pub fn nonterminal(&self, symbol: Symbol) -> &NonterminalInfo {
        &self.nonterminals[symbol.index() - self.terminal_count]
    }
}

#[derive(Clone)]
struct Context {
    precedence: i32,
    associativity: Assoc,
    field: Option<SmolStr>,
}

impl Context {
    fn step(&self, symbol: Symbol) -> Step {
        Step {
            symbol,
            precedence: self.precedence,
            associativity: self.associativity,
            field: self.field.clone(),
        }
    }
}

type Alternative = (Vec<Step>, i32);

pub(super) fn flatten(extraction: &Extraction, start_name: &SmolStr) -> Result<SyntaxGrammar, CompileError> {
    let terminal_count = extraction.terminals.len();
    let mut symbol_by_name: FxHashMap<SmolStr, Symbol> = extraction.terminal_by_name.clone();
    let mut nonterminals = Vec::new();
    for name in extraction.rules.keys() {
        symbol_by_name.insert(name.clone(), Symbol((terminal_count + nonterminals.len()) as u16));
        nonterminals.push(NonterminalInfo {
            name: name.clone(),
            hidden: name.starts_with('_'),
            owner: name.clone(),
        });
    }

    let mut flattener = Flattener {
        terminal_count,
        symbol_by_name,
        nonterminals,
        productions: Vec::new(),
        aux_counts: FxHashMap::default(),
    };

    for (name, rule) in &extraction.rules {
        let lhs = flattener.symbol_by_name[name];
        let context = Context {
            precedence: 0,
            associativity: Assoc::None,
            field: None,
        };
        for (steps, dynamic_precedence) in flattener.flatten(rule, &context, name)? {
            flattener.productions.push(FlatProduction {
                lhs,
                steps,
                dynamic_precedence,
            });
        }
    }

    let start = match flattener.symbol_by_name.get(start_name) {
        Some(symbol) if symbol.index() >= terminal_count => *symbol,
        _ => return Err(CompileError::InvalidStartRule(start_name.clone())),
    };
    if start_name.starts_with('_') {
        return Err(CompileError::InvalidStartRule(start_name.clone()));
    }
    if terminal_count + flattener.nonterminals.len() >= AUGMENTED.index() {
        return Err(CompileError::TooLarge("too many symbols"));
    }

    let mut seen = FxHashSet::default();
    let mut productions = vec![FlatProduction {
        lhs: AUGMENTED,
        steps: vec![Step {
            symbol: start,
            precedence: 0,
            associativity: Assoc::None,
            field: None,
        }],
        dynamic_precedence: 0,
    }];
    for production in flattener.productions {
        if seen.insert(production.clone()) {
            productions.push(production);
        }
    }
    if productions.len() >= u16::MAX as usize {
        return Err(CompileError::TooLarge("too many productions"));
    }

    Ok(SyntaxGrammar {
        terminal_count,
        nonterminals: flattener.nonterminals,
        productions,
        start,
        symbol_by_name: flattener.symbol_by_name,
    })
}

struct Flattener {
    terminal_count: usize,
    symbol_by_name: FxHashMap<SmolStr, Symbol>,
    nonterminals: Vec<NonterminalInfo>,
    productions: Vec<FlatProduction>,
    aux_counts: FxHashMap<SmolStr, usize>,
}

impl Flattener {
    fn new_aux(&mut self, owner: &SmolStr) -> Symbol {
        let count = self.aux_counts.entry(owner.clone()).or_insert(0);
        *count += 1;
        self.nonterminals.push(NonterminalInfo {
            name: SmolStr::new(format!("{owner}_repeat{count}")),
            hidden: true,
            owner: owner.clone(),
        });
        Symbol((self.terminal_count + self.nonterminals.len() - 1) as u16)
    }

    fn flatten(
        &mut self,
        rule: &Extracted,
        context: &Context,
        owner: &SmolStr,
    ) -> Result<Vec<Alternative>, CompileError> {
        Ok(match rule {
            Extracted::Blank => vec![(Vec::new(), 0)],
            Extracted::Terminal(symbol) => vec![(vec![context.step(*symbol)], 0)],
            Extracted::NonTerminal(name) => {
                let symbol = *self
                    .symbol_by_name
                    .get(name)
                    .ok_or_else(|| CompileError::undefined(name, owner))?;
                vec![(vec![context.step(symbol)], 0)]
            }
            Extracted::Seq(members) => {
                let mut result: Vec<Alternative> = vec![(Vec::new(), 0)];
                for member in members {
                    let parts = self.flatten(member, context, owner)?;
                    if result.len() * parts.len() > MAX_ALTERNATIVES {
                        return Err(CompileError::TooLarge("rule expands to too many alternatives"));
                    }
                    let mut next = Vec::with_capacity(result.len() * parts.len());
                    for (prefix, prefix_dynamic) in &result {
                        for (suffix, suffix_dynamic) in &parts {
                            let mut steps = prefix.clone();
                            steps.extend(suffix.iter().cloned());
                            let dynamic = if *prefix_dynamic != 0 {
                                *prefix_dynamic
                            } else {
                                *suffix_dynamic
                            };
                            next.push((steps, dynamic));
                        }
                    }
                    result = next;
                }
                result
            }
            Extracted::Choice(members) => {
                let mut result = Vec::new();
                for member in members {
                    result.extend(self.flatten(member, context, owner)?);
                }
                result
            }
            Extracted::Repeat { rule, at_least_one } => {
                let aux = self.new_aux(owner);
                let body = self.flatten(rule, context, owner)?;
                for (steps, dynamic_precedence) in &body {
                    let mut recursive = vec![context.step(aux)];
                    recursive.extend(steps.iter().cloned());
                    self.productions.push(FlatProduction {
                        lhs: aux,
                        steps: recursive,
                        dynamic_precedence: *dynamic_precedence,
                    });
                }
                for (steps, dynamic_precedence) in body {
                    self.productions.push(FlatProduction {
                        lhs: aux,
                        steps,
                        dynamic_precedence,
                    });
                }
                let once = (vec![context.step(aux)], 0);
                if *at_least_one {
                    vec![once]
                } else {
                    vec![(Vec::new(), 0), once]
                }
            }
            Extracted::Prec { kind, value, rule } => match kind {
                PrecKind::Dynamic => self
                    .flatten(rule, context, owner)?
                    .into_iter()
                    .map(|(steps, dynamic)| (steps, if dynamic != 0 { dynamic } else { *value }))
                    .collect(),
                PrecKind::Static | PrecKind::Left | PrecKind::Right => {
                    let inner = Context {
                        precedence: *value,
                        associativity: match kind {
                            PrecKind::Left => Assoc::Left,
                            PrecKind::Right => Assoc::Right,
                            _ => Assoc::None,
                        },
                        field: context.field.clone(),
                    };
                    self.flatten(rule, &inner, owner)?
                }
            },
            Extracted::Field { name, rule } => {
                let inner = Context {
                    field: Some(name.clone()),
                    ..context.clone()
                };
                self.flatten(rule, &inner, owner)?
            }
        })
    }
}
