//! Arbitrary input never panics and always yields a well-formed tree.

use proptest::prelude::*;
use zeus::{Parser, ParserOptions};

use crate::helpers::languages::{CALC, ZEUS};
use crate::helpers::sources::ZEUS_BROKEN;
use crate::helpers::{assert_nested, assert_tiles, parse};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_random_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..200)) {
        let tree = Parser::new(ZEUS.clone()).parse(&bytes);
        assert_tiles(&tree);
        assert_nested(&tree);
        let errors = tree.errors();
        prop_assert_eq!(errors.is_empty(), !tree.has_error());
    }

    #[test]
    fn prop_random_tokens_never_panic(source in "(fn|let|if|\\{|\\}|\\(|\\)|;|:|=|x|1|\\+| |\n){0,60}") {
        let tree = parse(&ZEUS, &source);
        assert_tiles(&tree);
        assert_nested(&tree);
        for error in tree.errors() {
            prop_assert!(usize::from(error.range.end()) <= tree.source().len());
        }
    }

    #[test]
    fn prop_calc_with_single_version(source in "[a-z0-9+*/()=;^ ]{0,40}") {
        let options = ParserOptions::default().max_versions(1);
        let tree = Parser::with_options(CALC.clone(), options).parse(source.as_bytes());
        assert_tiles(&tree);
    }
}

#[test]
fn test_broken_zeus_reports_errors_in_order() {
    let tree = parse(&ZEUS, ZEUS_BROKEN);
    assert!(tree.has_error());
    let errors = tree.errors();
    assert!(!errors.is_empty());
    assert!(errors.windows(2).all(|w| w[0].range.start() <= w[1].range.start()));
    // the well-formed function after the damage survives
    let fine = tree
        .root_node()
        .named_children()
        .find(|n| n.kind() == "function_definition" && n.child_by_field_name("name").is_some_and(|name| name.text() == b"fine"));
    assert!(fine.is_some(), "{}", tree.to_sexp());
}

#[test]
fn test_recovery_limit_still_tiles() {
    let options = ParserOptions::default().max_recovery_attempts(1);
    let tree = Parser::with_options(ZEUS.clone(), options).parse(b"fn ) ) ) ( { ; let");
    assert!(tree.has_error());
    assert_tiles(&tree);
}

#[test]
fn test_non_utf8_input() {
    let tree = Parser::new(CALC.clone()).parse(b"x = \xff\xfe 1;");
    assert!(tree.has_error());
    assert_tiles(&tree);
    assert!(tree.errors().iter().any(|e| e.code == zeus::ErrorCode::E0102));
}
