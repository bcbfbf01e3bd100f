use once_cell::sync::Lazy;

use super::*;
use crate::compile::compile;
use crate::grammar::{Grammar, pattern, prec_dynamic, repeat, sym};
use crate::{choice, seq};

static LETS: Lazy<Language> = Lazy::new(|| {
    let grammar = Grammar::builder("lets")
        .rule("program", repeat(sym("statement")))
        .rule("statement", seq!["let", sym("identifier"), "=", sym("_value"), ";"])
        .rule("_value", choice![sym("number"), sym("list")])
        .rule("list", seq!["(", repeat(sym("_value")), ")"])
        .rule("identifier", pattern("[a-z]+"))
        .rule("number", pattern(r"\d+"))
        .word("identifier")
        .build();
    compile(&grammar).unwrap()
});

/// `1 - 2 - 3` can group either way.
static AMBIGUOUS: Lazy<Language> = Lazy::new(|| {
    let grammar = Grammar::builder("ambiguous")
        .rule("program", sym("expression"))
        .rule(
            "expression",
            choice![sym("number"), seq![sym("expression"), "-", sym("expression")]],
        )
        .rule("number", pattern(r"\d+"))
        .conflict(["expression"])
        .build();
    compile(&grammar).unwrap()
});

fn parse(language: &Language, source: &str) -> Tree {
    Parser::new(language.clone()).parse(source.as_bytes())
}

fn assert_tiles(tree: &Tree) {
    let mut offset = 0;
    for token in tree.tokens() {
        assert_eq!(token.start_byte(), offset, "gap or overlap in {tree:?}");
        offset = token.end_byte();
    }
    assert_eq!(offset, tree.source().len());
}

// =============================================================================
// Plain parsing
// =============================================================================

#[test]
fn test_parse_valid_input() {
    let tree = parse(&LETS, "let a = 1;\nlet b = (2 (3));");
    assert!(!tree.has_error());
    assert_eq!(
        tree.to_sexp(),
        "(program (statement (identifier) (number)) (statement (identifier) (list (number) (list (number)))))"
    );
    assert_tiles(&tree);
}

#[test]
fn test_empty_input_on_nullable_start() {
    let tree = parse(&LETS, "");
    assert!(!tree.has_error());
    assert_eq!(tree.to_sexp(), "(program)");
    assert_eq!(tree.root_node().byte_range(), 0..0);
}

#[test]
fn test_whitespace_only_input() {
    let tree = parse(&LETS, "  \n ");
    assert!(!tree.has_error());
    assert_tiles(&tree);
}

#[test]
fn test_empty_input_on_non_nullable_start() {
    let tree = parse(&AMBIGUOUS, "");
    assert!(tree.root_node().is_error());
    assert!(tree.has_error());
    assert_eq!(tree.root_node().byte_range(), 0..0);
}

#[test]
fn test_deep_nesting() {
    let depth = 500;
    let source = format!("let a = {}1{};", "(".repeat(depth), ")".repeat(depth));
    let tree = parse(&LETS, &source);
    assert!(!tree.has_error());
    assert_tiles(&tree);
}

// =============================================================================
// GLR
// =============================================================================

#[test]
fn test_ambiguity_forks_and_resolves() {
    let mut parser = Parser::new(AMBIGUOUS.clone());
    let tree = parser.parse(b"1 - 2 - 3");
    assert!(!tree.has_error());
    assert!(parser.stats().max_versions > 1);
    let root = tree.root_node();
    assert_eq!(root.child(0).unwrap().kind(), "expression");
    assert_tiles(&tree);
}

#[test]
fn test_dynamic_precedence_picks_version() {
    let grammar = Grammar::builder("dynamic")
        .rule("program", choice![sym("plain"), sym("preferred")])
        .rule("plain", sym("identifier"))
        .rule("preferred", prec_dynamic(1, sym("identifier")))
        .rule("identifier", pattern("[a-z]+"))
        .conflict(["plain", "preferred"])
        .build();
    let language = compile(&grammar).unwrap();
    let tree = parse(&language, "x");
    assert_eq!(tree.to_sexp(), "(program (preferred (identifier)))");
}

#[test]
fn test_single_version_still_parses() {
    let mut parser = Parser::with_options(AMBIGUOUS.clone(), ParserOptions::default().max_versions(1));
    let tree = parser.parse(b"1 - 2 - 3 - 4");
    assert!(!tree.has_error());
    assert_eq!(parser.stats().max_versions, 1);
}

// =============================================================================
// Error recovery
// =============================================================================

#[test]
fn test_missing_token_is_inserted() {
    let mut parser = Parser::new(LETS.clone());
    let tree = parser.parse(b"let a 1;");
    assert_eq!(
        tree.to_sexp(),
        "(program (statement (identifier) (MISSING \"=\") (number)))"
    );
    assert_eq!(parser.stats().recoveries, 1);
    assert_tiles(&tree);
}

#[test]
fn test_unexpected_tokens_are_skipped() {
    let tree = parse(&LETS, "let a = 1; ) ) let b = 2;");
    assert!(tree.has_error());
    let root = tree.root_node();
    let kinds: Vec<_> = root.children().map(|n| n.kind()).collect();
    assert_eq!(kinds, vec!["statement", "ERROR", "statement"]);
    // consecutive skipped tokens share one ERROR node
    assert_eq!(root.child(1).unwrap().byte_range(), 11..14);
    assert_tiles(&tree);
}

#[test]
fn test_pop_recovers_at_end_of_input() {
    let tree = parse(&LETS, "let a = 1; let b = (2");
    assert!(tree.has_error());
    let root = tree.root_node();
    assert_eq!(root.child(0).unwrap().kind(), "statement");
    assert!(!root.child(0).unwrap().has_error());
    assert_eq!(root.child(1).unwrap().kind(), "ERROR");
    assert_tiles(&tree);
}

#[test]
fn test_garbage_input_never_panics() {
    for source in ["))))", "let", "= = =", "let a = (((", "\u{0}\u{1}", "let a = 1;;;;", "é ü"] {
        let tree = parse(&LETS, source);
        assert_tiles(&tree);
    }
}

#[test]
fn test_recovery_limit_yields_error_root() {
    let options = ParserOptions::default().max_recovery_attempts(1);
    let mut parser = Parser::with_options(LETS.clone(), options);
    let tree = parser.parse(b") ) ) let a = 1;");
    assert!(tree.root_node().is_error());
    assert_tiles(&tree);
}

// =============================================================================
// Incremental parsing
// =============================================================================

#[test]
fn test_reparse_matches_full_parse() {
    let old_source = "let a = 1; let b = 2; let c = (3 4);";
    let new_source = "let a = 1; let b = 42; let c = (3 4);";
    let mut parser = Parser::new(LETS.clone());
    let old = parser.parse(old_source.as_bytes());

    let edit = Edit::new(19, 1, 2);
    let new = parser.reparse(&old, &[edit], new_source.as_bytes());
    let stats = *parser.stats();
    assert!(stats.incremental);
    assert!(stats.reused_nodes + stats.reused_leaves > 0);
    assert_eq!(new, parse(&LETS, new_source));
}

#[test]
fn test_reparse_of_insertion_and_deletion() {
    let mut parser = Parser::new(LETS.clone());
    let old = parser.parse(b"let a = 1; let c = 3;");

    let inserted = b"let a = 1; let b = 2; let c = 3;";
    let new = parser.reparse(&old, &[Edit::insert(11, 11)], inserted);
    assert_eq!(new, parse(&LETS, "let a = 1; let b = 2; let c = 3;"));

    let deleted = b"let a = 1; let c = 3;";
    let back = parser.reparse(&new, &[Edit::delete(11, 11)], deleted);
    assert_eq!(back, old);
}

#[test]
fn test_reparse_without_changes_returns_same_tree() {
    let mut parser = Parser::new(LETS.clone());
    let old = parser.parse(b"let a = 1;");
    let new = parser.reparse(&old, &[], b"let a = 1;");
    assert_eq!(new, old);
    assert!(parser.stats().incremental);
    assert_eq!(parser.stats().lexed_tokens, 0);
}

#[test]
fn test_reparse_repairs_error() {
    let mut parser = Parser::new(LETS.clone());
    let old = parser.parse(b"let a = 1 let b = 2;");
    assert!(old.has_error());
    let new = parser.reparse(&old, &[Edit::insert(9, 1)], b"let a = 1; let b = 2;");
    assert!(!new.has_error());
    assert_eq!(new, parse(&LETS, "let a = 1; let b = 2;"));
}

#[test]
fn test_inconsistent_edits_fall_back_to_full_parse() {
    let mut parser = Parser::new(LETS.clone());
    let old = parser.parse(b"let a = 1;");
    // claims one byte was inserted, but the text grew by two
    let new = parser.reparse(&old, &[Edit::insert(8, 1)], b"let a = 123;");
    assert!(!parser.stats().incremental);
    assert_eq!(new, parse(&LETS, "let a = 123;"));

    let out_of_bounds = parser.reparse(&old, &[Edit::new(50, 1, 1)], b"let a = 1;");
    assert!(!parser.stats().incremental);
    assert_eq!(out_of_bounds, old);
}

#[test]
fn test_old_tree_from_other_language_is_ignored() {
    let mut parser = Parser::new(LETS.clone());
    let other = parse(&AMBIGUOUS, "1");
    let tree = parser.reparse(&other, &[Edit::insert(1, 9)], b"let a = 1;");
    assert!(!parser.stats().incremental);
    assert!(!tree.has_error());
}

#[test]
fn test_incremental_can_be_disabled() {
    let mut parser = Parser::with_options(LETS.clone(), ParserOptions::default().incremental(false));
    let old = parser.parse(b"let a = 1;");
    let new = parser.reparse(&old, &[Edit::new(8, 1, 1)], b"let a = 2;");
    let stats = parser.stats();
    assert!(!stats.incremental);
    assert_eq!(stats.reused_nodes + stats.reused_leaves, 0);
    assert_eq!(new, parse(&LETS, "let a = 2;"));
}

// =============================================================================
// Batches
// =============================================================================

#[test]
fn test_parse_batch_keeps_input_order() {
    let sources: Vec<String> = (0..32).map(|i| format!("let x = {i}; let y = ({i} {i});")).collect();
    let inputs: Vec<&[u8]> = sources.iter().map(|s| s.as_bytes()).collect();
    let trees = parse_batch(&LETS, &inputs);
    assert_eq!(trees.len(), sources.len());
    for (tree, source) in trees.iter().zip(&sources) {
        assert_eq!(tree, &parse(&LETS, source));
    }
}
