//! Context-aware lexing
//!
//! The lexer never tokenizes ahead of the parser. Each call lexes exactly one
//! token at a byte offset for a given [`LexState`]: the lex mode of the parse
//! state (which terminals are acceptable) and whether the previous token was
//! an extra (which rules out immediate tokens).
//!
//! ## Candidate selection
//!
//! Among the terminals that match, the winner has the highest lexical
//! precedence, then the longest match, then literal beats pattern, then the
//! lowest symbol. Keyword literals are never matched directly: the word token
//! is matched instead and its text looked up in the keyword table.
//!
//! When nothing valid matches, the lexer falls back to error mode: every
//! terminal except the immediate ones is tried and the longest match wins.
//! Immediate tokens only make sense glued to what precedes them, and their
//! patterns tend to be broad (string contents), so they would swallow the
//! text recovery needs to see.

mod scanner;

pub use scanner::{ExternalScanner, ScanInput};
pub(crate) use scanner::decode_char;

use std::cmp::Reverse;

use crate::language::{Language, Symbol};

/// What the lexer needs to know about the parse state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct LexState {
    pub mode: u16,
    pub after_extra: bool,
}

/// One lexed token. ERROR tokens cover bytes no terminal could match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub symbol: Symbol,
    pub start: usize,
    pub end: usize,
    /// Exclusive end of the bytes examined; one past the buffer when the
    /// lexer had to look at end of input
    pub examined: usize,
    /// Lexed with every terminal allowed because nothing valid matched
    pub error_mode: bool,
}

impl Token {
    pub fn lookahead_bytes(&self) -> usize {
        self.examined.saturating_sub(self.end)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    symbol: Symbol,
    end: usize,
    precedence: i32,
    literal: bool,
}

/// How competing candidates are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ranking {
    Precedence,
    /// Error mode: match length before precedence
    Length,
}

impl Candidate {
    fn rank(&self, ranking: Ranking) -> (i64, i64, bool, Reverse<Symbol>) {
        let (precedence, end) = (i64::from(self.precedence), self.end as i64);
        match ranking {
            Ranking::Precedence => (precedence, end, self.literal, Reverse(self.symbol)),
            Ranking::Length => (end, precedence, self.literal, Reverse(self.symbol)),
        }
    }
}

pub(crate) struct Lexer<'a> {
    language: &'a Language,
    source: &'a [u8],
}

impl<'a> Lexer<'a> {
    pub fn new(language: &'a Language, source: &'a [u8]) -> Self {
        Self { language, source }
    }

    pub fn next_token(&self, pos: usize, state: LexState) -> Token {
        let mut examined = pos;

        if let Some(token) = self.scan_external(pos, state, &mut examined) {
            return token;
        }
        if pos >= self.source.len() {
            return Token {
                symbol: Symbol::END,
                start: self.source.len(),
                end: self.source.len(),
                examined: self.source.len() + 1,
                error_mode: false,
            };
        }

        let mode = self.language.lex_mode(state.mode);
        let extras = &self.language.data.extras;
        let candidates = mode
            .valid
            .iter()
            .chain(extras.iter().filter(|s| !mode.valid.contains(s)))
            .copied()
            .filter(|&s| !(state.after_extra && self.language.token(s).immediate));
        let is_valid = |s| mode.valid.contains(&s) || extras.contains(&s);
        if let Some(best) = self.best_match(pos, candidates, is_valid, Ranking::Precedence, &mut examined) {
            return Token {
                symbol: best.symbol,
                start: pos,
                end: best.end,
                examined,
                error_mode: false,
            };
        }

        // Nothing acceptable here: find out what the bytes are, ignoring the
        // parse state, so recovery has a real token to work with.
        if let Some(best) = self.best_match(pos, self.error_candidates(), |_| true, Ranking::Length, &mut examined) {
            return Token {
                symbol: best.symbol,
                start: pos,
                end: best.end,
                examined,
                error_mode: true,
            };
        }

        let end = self.skip_unrecognised(pos, &mut examined);
        Token {
            symbol: Symbol::ERROR,
            start: pos,
            end,
            examined,
            error_mode: true,
        }
    }

    /// Terminals tried when the parse state accepts nothing that matches.
    fn error_candidates(&self) -> impl Iterator<Item = Symbol> + '_ {
        (1..self.language.terminal_count())
            .map(|i| Symbol(i as u16))
            .filter(|&s| !self.language.token(s).immediate)
    }

    fn scan_external(&self, pos: usize, state: LexState, examined: &mut usize) -> Option<Token> {
        let scanner = self.language.scanner.as_ref()?;
        let valid = &self.language.lex_mode(state.mode).external_valid;
        if !valid.iter().any(|v| *v) {
            return None;
        }
        let mut input = ScanInput::new(self.source, pos);
        let result = scanner.scan(&mut input, valid);
        *examined = (*examined).max(input.examined());
        let index = result? as usize;
        let end = input.token_end();
        if !valid.get(index).copied().unwrap_or(false) || end <= pos || end > self.source.len() {
            return None;
        }
        Some(Token {
            symbol: self.language.data.externals[index],
            start: pos,
            end,
            examined: (*examined).max(end),
            error_mode: false,
        })
    }

    fn best_match(
        &self,
        pos: usize,
        candidates: impl Iterator<Item = Symbol>,
        is_valid: impl Fn(Symbol) -> bool,
        ranking: Ranking,
        examined: &mut usize,
    ) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        let mut wants_word = false;
        let mut offer = |candidate: Candidate| {
            if best.is_none_or(|b| candidate.rank(ranking) > b.rank(ranking)) {
                best = Some(candidate);
            }
        };

        let word = self.language.data.word;
        for symbol in candidates {
            let def = self.language.token(symbol);
            if def.keyword || Some(symbol) == word {
                wants_word = true;
                continue;
            }
            let result = def.matcher.longest_match(self.source, pos);
            *examined = (*examined).max(result.examined);
            if let Some(end) = result.end {
                offer(Candidate {
                    symbol,
                    end,
                    precedence: def.precedence,
                    literal: def.matcher.is_literal(),
                });
            }
        }

        if let (true, Some(word)) = (wants_word, word) {
            let def = self.language.token(word);
            let result = def.matcher.longest_match(self.source, pos);
            *examined = (*examined).max(result.examined);
            if let Some(end) = result.end {
                let keyword = self
                    .language
                    .data
                    .keywords
                    .get(&self.source[pos..end])
                    .copied()
                    .filter(|&k| is_valid(k));
                match keyword {
                    Some(keyword) => offer(Candidate {
                        symbol: keyword,
                        end,
                        precedence: self.language.token(keyword).precedence,
                        literal: true,
                    }),
                    None if is_valid(word) => offer(Candidate {
                        symbol: word,
                        end,
                        precedence: def.precedence,
                        literal: false,
                    }),
                    None => {}
                }
            }
        }
        best
    }

    /// End of the run of bytes starting at `pos` where no terminal matches.
    fn skip_unrecognised(&self, pos: usize, examined: &mut usize) -> usize {
        let mut end = pos;
        loop {
            let width = decode_char(self.source, end).map_or(1, |(_, w)| w);
            end = (end + width).min(self.source.len());
            if end >= self.source.len() {
                *examined = (*examined).max(self.source.len() + 1);
                return end;
            }
            let mut seen = end;
            let found = self.best_match(end, self.error_candidates(), |_| true, Ranking::Length, &mut seen);
            *examined = (*examined).max(seen);
            if found.is_some() {
                return end;
            }
        }
    }
}
