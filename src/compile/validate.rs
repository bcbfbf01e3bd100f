//! Grammar sanity checks that run before table construction.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::CompileError;
use super::extract::Extraction;
use super::flatten::SyntaxGrammar;
use crate::grammar::Grammar;
use crate::language::Symbol;

/// Every named rule must be reachable from the start rule, an extra, the
/// word token, or another token that inlines it.
pub(super) fn check_reachability(
    grammar: &Grammar,
    extraction: &Extraction,
    syntax: &SyntaxGrammar,
    word: Option<Symbol>,
) -> Result<(), CompileError> {
    let mut reached: FxHashSet<Symbol> = FxHashSet::default();
    let mut work = vec![syntax.start];
    reached.insert(syntax.start);
    while let Some(symbol) = work.pop() {
        for production in syntax.productions.iter().filter(|p| p.lhs == symbol) {
            for step in &production.steps {
                if reached.insert(step.symbol) {
                    work.push(step.symbol);
                }
            }
        }
    }
    reached.extend(extraction.extras.iter().copied());
    reached.extend(word);

    for name in grammar.rules.keys() {
        if extraction.inlined.contains(name) {
            continue;
        }
        let reachable = syntax
            .symbol_by_name
            .get(name)
            .is_some_and(|symbol| reached.contains(symbol));
        if !reachable {
            return Err(CompileError::UnreachableRule(name.clone()));
        }
    }
    Ok(())
}

/// Every nonterminal must derive at least one finite string of terminals.
pub(super) fn check_productivity(syntax: &SyntaxGrammar) -> Result<(), CompileError> {
    let mut productive = vec![false; syntax.nonterminals.len()];
    let is_productive = |productive: &[bool], symbol: Symbol| {
        syntax.is_terminal(symbol) || productive[symbol.index() - syntax.terminal_count]
    };
    let mut changed = true;
    while changed {
        changed = false;
        for production in &syntax.productions[1..] {
            let index = production.lhs.index() - syntax.terminal_count;
            if !productive[index]
                && production
                    .steps
                    .iter()
                    .all(|step| is_productive(&productive, step.symbol))
            {
                productive[index] = true;
                changed = true;
            }
        }
    }
    match productive.iter().position(|p| !p) {
        Some(index) => Err(CompileError::NonProductiveRule(
            syntax.nonterminals[index].name.clone(),
        )),
        None => Ok(()),
    }
}

/// Conflict groups may only name syntactic rules.
pub(super) fn conflict_groups(
    grammar: &Grammar,
    extraction: &Extraction,
) -> Result<Vec<FxHashSet<SmolStr>>, CompileError> {
    grammar
        .conflicts
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|name| {
                    if extraction.rules.contains_key(name) {
                        Ok(name.clone())
                    } else {
                        Err(CompileError::UnknownConflictRule(name.clone()))
                    }
                })
                .collect()
        })
        .collect()
}

/// Rule names follow identifier rules (`_` prefix allowed for hidden rules).
pub(super) fn check_names(grammar: &Grammar) -> Result<(), CompileError> {
    if grammar.rules.is_empty() {
        return Err(CompileError::EmptyGrammar(grammar.name.clone()));
    }
    if let Some(name) = grammar.duplicates.first() {
        return Err(CompileError::DuplicateRule(name.clone()));
    }
    for name in grammar.rules.keys().chain(&grammar.externals) {
        let mut chars = name.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c == '_' || unicode_ident::is_xid_start(c))
            && chars.all(unicode_ident::is_xid_continue);
        if !valid {
            return Err(CompileError::InvalidRuleName(name.clone()));
        }
    }
    Ok(())
}
