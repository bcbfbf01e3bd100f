//! Lexical token definitions
//!
//! Patterns are compiled into anchored dense DFAs that report every match
//! (`MatchKind::All`), so the lexer can take the longest one and also learn
//! how far it had to look before the automaton died.

use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::util::primitives::StateID;
use regex_automata::{Anchored, Input, MatchKind};

pub(crate) type Dfa = dense::DFA<Vec<u32>>;

/// Compile a token regex into a DFA anchored at the match start.
pub(crate) fn build_dfa(regex: &str) -> Result<Dfa, Box<dense::BuildError>> {
    dense::Builder::new()
        .configure(
            dense::Config::new()
                .match_kind(MatchKind::All)
                .start_kind(StartKind::Anchored),
        )
        .build(regex)
        .map_err(Box::new)
}

/// Outcome of matching one token definition at an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MatchResult {
    /// End offset of the longest non-empty match
    pub end: Option<usize>,
    /// Exclusive end of the bytes the matcher looked at.
    /// Reaching end of input counts as one byte past the buffer.
    pub examined: usize,
}

#[derive(Debug, Clone)]
pub(crate) enum Matcher {
    End,
    Literal(Box<[u8]>),
    Pattern(Box<Dfa>),
    /// Produced only by the external scanner
    External,
}

impl Matcher {
    pub(crate) fn longest_match(&self, source: &[u8], pos: usize) -> MatchResult {
        match self {
            Matcher::End | Matcher::External => MatchResult {
                end: None,
                examined: pos,
            },
            Matcher::Literal(bytes) => literal_match(bytes, source, pos),
            Matcher::Pattern(dfa) => dfa_match(dfa, source, pos),
        }
    }

    pub(crate) fn is_literal(&self) -> bool {
        matches!(self, Matcher::Literal(_))
    }
}

fn literal_match(literal: &[u8], source: &[u8], pos: usize) -> MatchResult {
    for (i, byte) in literal.iter().enumerate() {
        match source.get(pos + i) {
            Some(b) if b == byte => {}
            Some(_) => {
                return MatchResult {
                    end: None,
                    examined: pos + i + 1,
                };
            }
            None => {
                return MatchResult {
                    end: None,
                    examined: source.len() + 1,
                };
            }
        }
    }
    let end = pos + literal.len();
    MatchResult {
        end: (!literal.is_empty()).then_some(end),
        examined: end,
    }
}

fn dfa_match(dfa: &Dfa, source: &[u8], pos: usize) -> MatchResult {
    let input = Input::new(source).range(pos..).anchored(Anchored::Yes);
    let Ok(mut state) = dfa.start_state_forward(&input) else {
        return MatchResult {
            end: None,
            examined: pos + 1,
        };
    };
    // Matches are reported one byte late: entering a match state after
    // byte `i` means a match ends at `i`.
    let mut last = None;
    for (i, &byte) in source.iter().enumerate().skip(pos) {
        let previous = state;
        state = dfa.next_state(state, byte);
        if dfa.is_special_state(state) {
            if dfa.is_match_state(state) {
                last = Some(i);
            } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
                // A match state that dies on every byte already knew the
                // answer without reading byte `i`.
                let settled = last.is_some_and(|end| end + 1 == i) && is_exhausted(dfa, previous);
                let examined = if settled { i } else { i + 1 };
                return MatchResult {
                    end: last.filter(|&end| end > pos),
                    examined,
                };
            }
        }
    }
    state = dfa.next_eoi_state(state);
    if dfa.is_match_state(state) {
        last = Some(source.len());
    }
    MatchResult {
        end: last.filter(|&end| end > pos),
        examined: source.len() + 1,
    }
}

fn is_exhausted(dfa: &Dfa, state: StateID) -> bool {
    (0..=u8::MAX).all(|byte| dfa.is_dead_state(dfa.next_state(state, byte)))
}

/// A terminal's lexical definition.
#[derive(Debug, Clone)]
pub(crate) struct TokenDef {
    pub matcher: Matcher,
    pub precedence: i32,
    /// Only valid when no extra was lexed just before it
    pub immediate: bool,
    /// A literal that is lexed through the word token
    pub keyword: bool,
}
