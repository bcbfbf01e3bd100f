//! Every way a grammar can be rejected, through the public `compile` entry.

use rstest::rstest;
use zeus::grammar::{Grammar, alias, pattern, repeat, sym, token};
use zeus::{CompileError, choice, compile, seq};

fn named(name: &str) -> smol_str::SmolStr {
    smol_str::SmolStr::new(name)
}

#[rstest]
#[case::empty_grammar(
    Grammar::builder("empty").build(),
    CompileError::EmptyGrammar(named("empty"))
)]
#[case::duplicate_rule(
    Grammar::builder("g").rule("program", "x").rule("program", "y").build(),
    CompileError::DuplicateRule(named("program"))
)]
#[case::invalid_rule_name(
    Grammar::builder("g").rule("program", sym("1st")).rule("1st", "x").build(),
    CompileError::InvalidRuleName(named("1st"))
)]
#[case::undefined_symbol(
    Grammar::builder("g").rule("program", seq!["x", sym("nope")]).build(),
    CompileError::UndefinedSymbol { name: named("nope"), rule: named("program") }
)]
#[case::unreachable_rule(
    Grammar::builder("g").rule("program", seq!["x", "y"]).rule("orphan", seq!["a", "b"]).build(),
    CompileError::UnreachableRule(named("orphan"))
)]
#[case::non_productive_rule(
    Grammar::builder("g").rule("program", seq!["x", sym("program")]).build(),
    CompileError::NonProductiveRule(named("program"))
)]
#[case::non_terminal_extra(
    Grammar::builder("g")
        .rule("program", "x")
        .rule("comment", seq!["/*", "*/"])
        .extras([sym("comment")])
        .build(),
    CompileError::NonTerminalExtra(named("comment"))
)]
#[case::token_start_rule(
    Grammar::builder("g").rule("program", pattern("[a-z]+")).build(),
    CompileError::InvalidStartRule(named("program"))
)]
#[case::hidden_start_rule(
    Grammar::builder("g").rule("_program", repeat("x")).build(),
    CompileError::InvalidStartRule(named("_program"))
)]
#[case::unknown_conflict_rule(
    Grammar::builder("g").rule("program", seq!["x", "y"]).conflict(["program", "ghost"]).build(),
    CompileError::UnknownConflictRule(named("ghost"))
)]
#[case::external_redefined(
    Grammar::builder("g")
        .rule("program", sym("heredoc"))
        .rule("heredoc", pattern("<<[A-Z]+"))
        .externals(["heredoc"])
        .build(),
    CompileError::ExternalRedefined(named("heredoc"))
)]
#[case::invalid_word_token(
    Grammar::builder("g")
        .rule("program", repeat(sym("identifier")))
        .rule("identifier", pattern("[a-z]+"))
        .word("nope")
        .build(),
    CompileError::InvalidWordToken(named("nope"))
)]
#[case::symbol_in_token(
    Grammar::builder("g")
        .rule("program", sym("word"))
        .rule("word", token(seq!["a", sym("inner")]))
        .rule("inner", seq!["b", "c"])
        .build(),
    CompileError::SymbolInToken(named("inner"))
)]
#[case::non_terminal_alias(
    Grammar::builder("g")
        .rule("program", alias(sym("inner"), "other", true))
        .rule("inner", seq!["a", "b"])
        .build(),
    CompileError::NonTerminalAlias(named("other"))
)]
fn test_rejected_grammar(#[case] grammar: Grammar, #[case] expected: CompileError) {
    assert_eq!(compile(&grammar).unwrap_err(), expected);
}

#[test]
fn test_invalid_regex_names_the_pattern() {
    let grammar = Grammar::builder("g")
        .rule("program", sym("bad"))
        .rule("bad", pattern("[a-"))
        .build();
    let error = compile(&grammar).unwrap_err();
    assert!(
        matches!(&error, CompileError::InvalidRegex { pattern, .. } if pattern.contains("[a-")),
        "{error:?}"
    );
}

#[test]
fn test_undeclared_conflict_is_reported_with_rules() {
    let grammar = Grammar::builder("g")
        .rule("program", sym("expression"))
        .rule(
            "expression",
            choice![sym("number"), seq![sym("expression"), "-", sym("expression")]],
        )
        .rule("number", pattern(r"\d+"))
        .build();
    let error = compile(&grammar).unwrap_err();
    let CompileError::Conflict { lookahead, rules, .. } = &error else {
        panic!("expected a conflict, got {error:?}");
    };
    assert_eq!(lookahead, "-");
    assert!(rules.iter().any(|r| r == "expression"));
    // the message lists the competing actions
    assert!(error.to_string().contains("expression"));
}

#[test]
fn test_declared_conflict_compiles() {
    let grammar = Grammar::builder("g")
        .rule("program", sym("expression"))
        .rule(
            "expression",
            choice![sym("number"), seq![sym("expression"), "-", sym("expression")]],
        )
        .rule("number", pattern(r"\d+"))
        .conflict(["expression"])
        .build();
    assert!(compile(&grammar).is_ok());
}

#[test]
fn test_compile_is_deterministic() {
    let grammar = zeus::zeus::grammar();
    let first = compile(&grammar).unwrap();
    let second = compile(&grammar).unwrap();
    assert_eq!(first.state_count(), second.state_count());
    assert_eq!(first.symbol_count(), second.symbol_count());
}
