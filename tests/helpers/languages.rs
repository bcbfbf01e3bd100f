//! Languages shared by the integration tests, compiled once per run.

use std::sync::Arc;

use once_cell::sync::Lazy;
use zeus::grammar::{Grammar, field, optional, pattern, prec_left, prec_right, repeat, sym, token};
use zeus::{ExternalScanner, Language, ScanInput, choice, compile, seq};

pub static ZEUS: Lazy<Language> = Lazy::new(|| zeus::zeus::language().unwrap());

/// Assignments over arithmetic with calls and `#` comments.
pub static CALC: Lazy<Language> = Lazy::new(|| {
    let grammar = Grammar::builder("calc")
        .rule("program", repeat(sym("statement")))
        .rule(
            "statement",
            seq![
                optional(seq![field("target", sym("identifier")), "="]),
                field("value", sym("_expression")),
                ";",
            ],
        )
        .rule(
            "_expression",
            choice![
                sym("number"),
                sym("identifier"),
                sym("binary"),
                sym("call"),
                sym("parenthesized"),
            ],
        )
        .rule(
            "binary",
            choice![
                prec_left(1, seq![field("left", sym("_expression")), field("operator", choice!["+", "-"]), field("right", sym("_expression"))]),
                prec_left(2, seq![field("left", sym("_expression")), field("operator", choice!["*", "/"]), field("right", sym("_expression"))]),
                prec_right(3, seq![field("left", sym("_expression")), field("operator", "^"), field("right", sym("_expression"))]),
            ],
        )
        .rule(
            "call",
            seq![
                field("function", sym("identifier")),
                "(",
                optional(seq![sym("_expression"), repeat(seq![",", sym("_expression")])]),
                ")",
            ],
        )
        .rule("parenthesized", seq!["(", sym("_expression"), ")"])
        .rule("comment", token(seq!["#", pattern(r"[^\n]*")]))
        .rule("number", pattern(r"\d+"))
        .rule("identifier", pattern("[a-z_]+"))
        .extras([pattern(r"\s"), sym("comment")])
        .build();
    compile(&grammar).unwrap()
});

/// Raw strings such as `r##"a "# b"##`, which no regular expression can
/// describe, come from [`RawStrings`].
pub static RAW: Lazy<Language> = Lazy::new(|| {
    let grammar = Grammar::builder("raw")
        .rule("program", repeat(sym("binding")))
        .rule(
            "binding",
            seq![
                field("name", sym("identifier")),
                "=",
                field("value", choice![sym("raw_string"), sym("string")]),
                ";",
            ],
        )
        .rule("string", pattern(r#""[^"]*""#))
        .rule("identifier", pattern("[a-z]+"))
        .externals(["raw_string"])
        .build();
    compile(&grammar).unwrap().with_external_scanner(Arc::new(RawStrings))
});

pub struct RawStrings;

impl ExternalScanner for RawStrings {
    fn scan(&self, input: &mut ScanInput<'_>, valid: &[bool]) -> Option<u16> {
        if !valid.first().copied().unwrap_or(false) || input.lookahead() != Some('r') {
            return None;
        }
        input.advance();
        let mut hashes = 0;
        while input.lookahead() == Some('#') {
            hashes += 1;
            input.advance();
        }
        if input.lookahead() != Some('"') {
            return None;
        }
        input.advance();
        loop {
            match input.lookahead()? {
                '"' => {
                    input.advance();
                    let mut closing = 0;
                    while closing < hashes && input.lookahead() == Some('#') {
                        closing += 1;
                        input.advance();
                    }
                    if closing == hashes {
                        input.mark_end();
                        return Some(0);
                    }
                }
                _ => input.advance(),
            }
        }
    }
}
