//! Action, goto and lex-mode tables
//!
//! Shift/reduce conflicts are settled by comparing the precedence of the
//! reduced production's last step against the steps preceding the dot in
//! every item that could shift the lookahead. Equal precedence falls back to
//! associativity. Whatever survives must be covered by a declared conflict
//! group, in which case all remaining actions are kept for GLR forking.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::CompileError;
use super::extract::{Extraction, TerminalKind};
use super::flatten::{AUGMENTED, Assoc, FlatProduction, SyntaxGrammar};
use super::lalr::{Automaton, Closure, FirstSets, Item, ItemSet};
use crate::language::{Action, LexMode, NO_ACTIONS, NO_GOTO, ParseTable, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Shift,
    Reduce,
    Conflict,
}

pub(super) fn build_parse_table(
    syntax: &SyntaxGrammar,
    extraction: &Extraction,
    first: &FirstSets,
    closure: &Closure<'_>,
    automaton: &Automaton,
    groups: &[FxHashSet<SmolStr>],
) -> Result<ParseTable, CompileError> {
    let terminal_count = syntax.terminal_count;
    let nonterminal_count = syntax.nonterminals.len();
    let state_count = automaton.kernels.len();

    let mut action_index = vec![NO_ACTIONS; state_count * terminal_count];
    let mut action_lists: Vec<Box<[Action]>> = Vec::new();
    let mut list_ids: FxHashMap<Vec<Action>, u32> = FxHashMap::default();
    let mut gotos = vec![NO_GOTO; state_count * nonterminal_count];

    for (state, kernel) in automaton.kernels.iter().enumerate() {
        let items = closure.close(kernel);
        let transitions = &automaton.transitions[state];

        for (&symbol, &target) in transitions {
            if !syntax.is_terminal(symbol) {
                gotos[state * nonterminal_count + symbol.index() - terminal_count] = target;
            }
        }

        let mut reduces: IndexMap<Symbol, Vec<u16>> = IndexMap::new();
        for (&(production, dot), lookahead) in &items {
            if dot as usize == syntax.productions[production as usize].steps.len() {
                for terminal in lookahead.iter() {
                    reduces.entry(terminal).or_default().push(production);
                }
            }
        }

        let mut terminals: Vec<Symbol> = transitions
            .keys()
            .copied()
            .filter(|s| syntax.is_terminal(*s))
            .chain(reduces.keys().copied())
            .collect();
        terminals.sort();
        terminals.dedup();

        for terminal in terminals {
            let shift = transitions.get(&terminal).copied();
            let mut reduce_list = reduces.get(&terminal).cloned().unwrap_or_default();
            reduce_list.sort_unstable();
            let actions = resolve(
                syntax,
                first,
                &items,
                state,
                terminal,
                shift,
                reduce_list,
                groups,
                extraction,
            )?;
            let next_id = action_lists.len() as u32;
            let id = *list_ids.entry(actions.clone()).or_insert_with(|| {
                action_lists.push(actions.into_boxed_slice());
                next_id
            });
            action_index[state * terminal_count + terminal.index()] = id;
        }
    }

    let (lex_mode_of_state, lex_modes) =
        lex_modes(extraction, terminal_count, state_count, &action_index)?;

    Ok(ParseTable {
        state_count,
        terminal_count,
        nonterminal_count,
        action_index,
        action_lists,
        gotos,
        lex_mode_of_state,
        lex_modes,
    })
}

#[allow(clippy::too_many_arguments)]
fn resolve(
    syntax: &SyntaxGrammar,
    first: &FirstSets,
    items: &ItemSet,
    state: usize,
    terminal: Symbol,
    shift: Option<u16>,
    reduce_list: Vec<u16>,
    groups: &[FxHashSet<SmolStr>],
    extraction: &Extraction,
) -> Result<Vec<Action>, CompileError> {
    if reduce_list.contains(&0) {
        return Ok(vec![Action::Accept]);
    }
    let Some(shift_state) = shift else {
        return resolve_reduces(syntax, state, terminal, reduce_list, &[], false, groups, extraction);
    };
    if reduce_list.is_empty() {
        return Ok(vec![Action::Shift(shift_state)]);
    }

    let shift_items: Vec<Item> = items
        .keys()
        .copied()
        .filter(|&(production, dot)| {
            let steps = &syntax.productions[production as usize].steps;
            dot > 0
                && (dot as usize) < steps.len()
                && first.starts_with(steps[dot as usize].symbol, terminal)
        })
        .collect();
    let shift_precedences: Vec<i32> = shift_items
        .iter()
        .map(|&(production, dot)| syntax.productions[production as usize].steps[dot as usize - 1].precedence)
        .collect();

    let outcomes: Vec<Outcome> = reduce_list
        .iter()
        .map(|&production| {
            let (precedence, associativity) = last_step(&syntax.productions[production as usize]);
            let more = shift_precedences.iter().any(|&p| p > precedence);
            let less = shift_precedences.iter().any(|&p| p < precedence);
            match (more, less) {
                (true, false) => Outcome::Shift,
                (false, true) => Outcome::Reduce,
                (false, false) => match associativity {
                    Assoc::Left => Outcome::Reduce,
                    Assoc::Right => Outcome::Shift,
                    Assoc::None => Outcome::Conflict,
                },
                (true, true) => Outcome::Conflict,
            }
        })
        .collect();

    if outcomes.iter().all(|o| *o == Outcome::Shift) {
        return Ok(vec![Action::Shift(shift_state)]);
    }
    if outcomes.iter().all(|o| *o == Outcome::Reduce) {
        return resolve_reduces(syntax, state, terminal, reduce_list, &[], false, groups, extraction);
    }
    let remaining: Vec<u16> = reduce_list
        .iter()
        .zip(&outcomes)
        .filter(|(_, outcome)| **outcome != Outcome::Shift)
        .map(|(production, _)| *production)
        .collect();
    let mut actions = vec![Action::Shift(shift_state)];
    actions.extend(resolve_reduces(
        syntax,
        state,
        terminal,
        remaining,
        &shift_items,
        true,
        groups,
        extraction,
    )?);
    Ok(actions)
}

/// Reduce/reduce conflicts keep the highest precedence productions; anything
/// still ambiguous must be declared.
#[allow(clippy::too_many_arguments)]
fn resolve_reduces(
    syntax: &SyntaxGrammar,
    state: usize,
    terminal: Symbol,
    mut reduce_list: Vec<u16>,
    shift_items: &[Item],
    shift_kept: bool,
    groups: &[FxHashSet<SmolStr>],
    extraction: &Extraction,
) -> Result<Vec<Action>, CompileError> {
    if reduce_list.len() > 1 {
        let best = reduce_list
            .iter()
            .map(|&p| last_step(&syntax.productions[p as usize]).0)
            .max()
            .unwrap_or(0);
        reduce_list.retain(|&p| last_step(&syntax.productions[p as usize]).0 == best);
    }

    if shift_kept || reduce_list.len() > 1 {
        let mut involved: Vec<SmolStr> = reduce_list
            .iter()
            .map(|&p| syntax.nonterminal(syntax.productions[p as usize].lhs).owner.clone())
            .collect();
        if shift_kept {
            involved.extend(
                shift_items
                    .iter()
                    .map(|&(p, _)| syntax.productions[p as usize].lhs)
                    .filter(|&lhs| lhs != AUGMENTED)
                    .map(|lhs| syntax.nonterminal(lhs).owner.clone()),
            );
        }
        involved.sort();
        involved.dedup();
        let declared = groups
            .iter()
            .any(|group| involved.iter().all(|name| group.contains(name)));
        if !declared {
            let mut actions = String::new();
            if shift_kept {
                actions.push_str("  shift\n");
            }
            for &production in &reduce_list {
                actions.push_str("  reduce ");
                actions.push_str(&describe(syntax, extraction, production));
                actions.push('\n');
            }
            return Err(CompileError::Conflict {
                state,
                lookahead: extraction.terminals[terminal.index()].name.clone(),
                rules: involved,
                actions,
            });
        }
    }

    Ok(reduce_list.into_iter().map(Action::Reduce).collect())
}

fn last_step(production: &FlatProduction) -> (i32, Assoc) {
    production
        .steps
        .last()
        .map_or((0, Assoc::None), |step| (step.precedence, step.associativity))
}

fn symbol_name(syntax: &SyntaxGrammar, extraction: &Extraction, symbol: Symbol) -> SmolStr {
    if syntax.is_terminal(symbol) {
        extraction.terminals[symbol.index()].name.clone()
    } else {
        syntax.nonterminal(symbol).name.clone()
    }
}

fn describe(syntax: &SyntaxGrammar, extraction: &Extraction, production: u16) -> String {
    let production = &syntax.productions[production as usize];
    let steps: Vec<SmolStr> = production
        .steps
        .iter()
        .map(|step| symbol_name(syntax, extraction, step.symbol))
        .collect();
    format!(
        "{} -> {}",
        symbol_name(syntax, extraction, production.lhs),
        steps.join(" ")
    )
}

/// States that accept the same terminals share a lex mode.
fn lex_modes(
    extraction: &Extraction,
    terminal_count: usize,
    state_count: usize,
    action_index: &[u32],
) -> Result<(Vec<u16>, Vec<LexMode>), CompileError> {
    let mut ids: FxHashMap<Vec<Symbol>, u16> = FxHashMap::default();
    let mut modes = Vec::new();
    let mut of_state = Vec::with_capacity(state_count);
    for state in 0..state_count {
        let row = &action_index[state * terminal_count..(state + 1) * terminal_count];
        let valid: Vec<Symbol> = row
            .iter()
            .enumerate()
            .filter(|(_, id)| **id != NO_ACTIONS)
            .map(|(terminal, _)| Symbol(terminal as u16))
            .collect();
        let id = match ids.get(&valid) {
            Some(&id) => id,
            None => {
                if modes.len() >= u16::MAX as usize {
                    return Err(CompileError::TooLarge("too many lex modes"));
                }
                let id = modes.len() as u16;
                let external_valid = extraction
                    .terminals
                    .iter()
                    .enumerate()
                    .filter_map(|(index, def)| match def.kind {
                        TerminalKind::External => Some(valid.contains(&Symbol(index as u16))),
                        _ => None,
                    })
                    .collect();
                modes.push(LexMode {
                    valid: valid.clone().into_boxed_slice(),
                    external_valid,
                });
                ids.insert(valid, id);
                id
            }
        };
        of_state.push(id);
    }
    Ok((of_state, modes))
}
