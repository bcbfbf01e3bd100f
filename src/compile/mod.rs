//! Grammar compilation
//!
//! Turns a [`Grammar`] into a [`Language`] in five passes:
//!
//! 1. name checks
//! 2. lexical extraction (terminals vs. syntactic rules)
//! 3. flattening into productions with per-step precedence
//! 4. reachability and productivity validation
//! 5. LALR(1) table construction with precedence-based conflict resolution
//!
//! Finally every terminal gets its matcher (literal bytes or a DFA) and
//! literals that look like words are marked as keywords.

mod error;
mod extract;
mod flatten;
mod lalr;
mod table;
mod token_set;
mod validate;

pub use error::CompileError;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::grammar::Grammar;
use crate::language::{
    Language, LanguageData, Matcher, Production, Symbol, SymbolMetadata, TokenDef, build_dfa,
};
use extract::{Extraction, TerminalKind};
use flatten::SyntaxGrammar;

/// Compile a grammar into parse tables.
pub fn compile(grammar: &Grammar) -> Result<Language, CompileError> {
    validate::check_names(grammar)?;
    let extraction = extract::extract(grammar)?;

    let start_name = grammar
        .rules
        .keys()
        .next()
        .cloned()
        .ok_or_else(|| CompileError::EmptyGrammar(grammar.name.clone()))?;
    if grammar.rules[&start_name].is_lexical() {
        return Err(CompileError::InvalidStartRule(start_name));
    }

    let syntax = flatten::flatten(&extraction, &start_name)?;
    let word = word_token(grammar, &extraction)?;
    validate::check_reachability(grammar, &extraction, &syntax, word)?;
    validate::check_productivity(&syntax)?;
    let groups = validate::conflict_groups(grammar, &extraction)?;

    let first = lalr::FirstSets::compute(&syntax);
    let closure = lalr::Closure::new(&syntax, &first);
    let automaton = lalr::build_automaton(&syntax, &closure)?;
    let table = table::build_parse_table(&syntax, &extraction, &first, &closure, &automaton, &groups)?;

    let (tokens, keywords) = token_defs(&extraction, word)?;
    let (fields, productions) = productions(&syntax);
    let symbols = symbol_metadata(&extraction, &syntax);
    let externals = extraction
        .terminals
        .iter()
        .enumerate()
        .filter(|(_, def)| matches!(def.kind, TerminalKind::External))
        .map(|(index, _)| Symbol(index as u16))
        .collect();

    debug!(
        grammar = %grammar.name,
        states = table.state_count,
        terminals = table.terminal_count,
        nonterminals = table.nonterminal_count,
        productions = productions.len(),
        lex_modes = table.lex_modes.len(),
        keywords = keywords.len(),
        "compiled grammar"
    );

    Ok(Language::new(LanguageData {
        name: grammar.name.clone(),
        symbols,
        tokens,
        externals,
        extras: extraction.extras.clone().into_boxed_slice(),
        word,
        keywords,
        fields,
        productions,
        table,
        start_symbol: syntax.start,
    }))
}

fn word_token(grammar: &Grammar, extraction: &Extraction) -> Result<Option<Symbol>, CompileError> {
    let Some(name) = &grammar.word else {
        return Ok(None);
    };
    match extraction.terminal_by_name.get(name) {
        Some(&symbol)
            if matches!(
                extraction.terminals[symbol.index()].kind,
                TerminalKind::Pattern(_)
            ) =>
        {
            Ok(Some(symbol))
        }
        _ => Err(CompileError::InvalidWordToken(name.clone())),
    }
}

type Keywords = FxHashMap<Box<[u8]>, Symbol>;

fn token_defs(extraction: &Extraction, word: Option<Symbol>) -> Result<(Vec<TokenDef>, Keywords), CompileError> {
    let mut tokens = Vec::with_capacity(extraction.terminals.len());
    for def in &extraction.terminals {
        let matcher = match &def.kind {
            TerminalKind::End => Matcher::End,
            TerminalKind::Literal(text) => Matcher::Literal(text.as_bytes().into()),
            TerminalKind::External => Matcher::External,
            TerminalKind::Pattern(regex) => {
                let dfa = build_dfa(regex).map_err(|e| CompileError::InvalidRegex {
                    pattern: regex.clone(),
                    message: e.to_string(),
                })?;
                Matcher::Pattern(Box::new(dfa))
            }
        };
        tokens.push(TokenDef {
            matcher,
            precedence: def.precedence,
            immediate: def.immediate,
            keyword: false,
        });
    }

    let mut keywords = Keywords::default();
    if let Some(word) = word {
        for index in 0..tokens.len() {
            let Matcher::Literal(text) = &tokens[index].matcher else {
                continue;
            };
            let whole_word = tokens[word.index()].matcher.longest_match(text, 0).end == Some(text.len());
            if whole_word {
                let text = text.clone();
                tokens[index].keyword = true;
                keywords.entry(text).or_insert(Symbol(index as u16));
            }
        }
    }
    Ok((tokens, keywords))
}

fn productions(syntax: &SyntaxGrammar) -> (Vec<SmolStr>, Vec<Production>) {
    let mut fields: Vec<SmolStr> = Vec::new();
    let mut field_ids: FxHashMap<SmolStr, u16> = FxHashMap::default();
    let productions = syntax
        .productions
        .iter()
        .map(|production| Production {
            lhs: production.lhs,
            child_count: production.steps.len() as u16,
            fields: production
                .steps
                .iter()
                .map(|step| {
                    step.field.as_ref().map(|name| {
                        *field_ids.entry(name.clone()).or_insert_with(|| {
                            fields.push(name.clone());
                            (fields.len() - 1) as u16
                        })
                    })
                })
                .collect(),
            dynamic_precedence: production.dynamic_precedence,
        })
        .collect();
    (fields, productions)
}

fn symbol_metadata(extraction: &Extraction, syntax: &SyntaxGrammar) -> Vec<SymbolMetadata> {
    let terminals = extraction.terminals.iter().map(|def| SymbolMetadata {
        name: def.name.clone(),
        named: def.named,
        visible: def.visible,
    });
    let nonterminals = syntax.nonterminals.iter().map(|info| SymbolMetadata {
        name: info.name.clone(),
        named: true,
        visible: !info.hidden,
    });
    terminals.chain(nonterminals).collect()
}
