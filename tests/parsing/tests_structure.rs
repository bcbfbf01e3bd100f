//! Shape of trees over realistic inputs.

use rstest::rstest;

use crate::helpers::languages::{CALC, ZEUS};
use crate::helpers::sources::*;
use crate::helpers::{assert_nested, assert_tiles, parse};

#[rstest]
#[case::hello(ZEUS_HELLO)]
#[case::structs(ZEUS_STRUCTS)]
#[case::control_flow(ZEUS_CONTROL_FLOW)]
#[case::arrays(ZEUS_ARRAYS)]
fn test_zeus_fixture_parses_cleanly(#[case] source: &str) {
    let tree = parse(&ZEUS, source);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert!(tree.errors().is_empty());
    assert_eq!(tree.root_node().kind(), "source_file");
}

#[test]
fn test_every_fixture_tiles_and_nests() {
    for source in ZEUS_ALL {
        let tree = parse(&ZEUS, source);
        assert_tiles(&tree);
        assert_nested(&tree);
    }
    let tree = parse(&CALC, CALC_PROGRAM);
    assert_tiles(&tree);
    assert_nested(&tree);
}

#[test]
fn test_calc_precedence_and_associativity() {
    let tree = parse(&CALC, "z = 1 + 2 * 3 ^ 4 ^ 5;");
    assert!(!tree.has_error());
    assert_eq!(
        tree.to_sexp(),
        "(program (statement target: (identifier) value: (binary left: (number) \
         right: (binary left: (number) right: (binary left: (number) \
         right: (binary left: (number) right: (number)))))))"
    );
}

#[test]
fn test_calc_left_associativity() {
    let tree = parse(&CALC, "1 - 2 - 3;");
    let value = tree.root_node().child(0).unwrap().child_by_field_name("value").unwrap();
    let left = value.child_by_field_name("left").unwrap();
    assert_eq!(left.kind(), "binary");
    assert_eq!(left.text(), b"1 - 2");
    assert_eq!(value.child_by_field_name("right").unwrap().text(), b"3");
}

#[test]
fn test_calc_comments_are_extras() {
    let tree = parse(&CALC, CALC_PROGRAM);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    let root = tree.root_node();
    let comment = root.children().find(|n| n.kind() == "comment").unwrap();
    assert!(comment.is_extra());
    assert_eq!(comment.text(), b"# comment");
    assert_eq!(root.named_children().filter(|n| n.kind() == "statement").count(), 3);
}

#[test]
fn test_calc_call_arguments() {
    let tree = parse(&CALC, "f(1, g(2), (3));");
    assert!(!tree.has_error());
    assert_eq!(
        tree.to_sexp(),
        "(program (statement value: (call function: (identifier) (number) \
         (call function: (identifier) (number)) (parenthesized (number)))))"
    );
}

#[test]
fn test_positions_follow_lines() {
    let tree = parse(&CALC, CALC_PROGRAM);
    let last = tree.root_node().named_children().last().unwrap();
    assert_eq!(last.start_point(), zeus::Point::new(3, 0));
    assert_eq!(last.end_point(), zeus::Point::new(3, 14));
}

#[test]
fn test_empty_inputs() {
    for language in [&*ZEUS, &*CALC] {
        let tree = parse(language, "");
        assert!(!tree.has_error());
        assert_eq!(tree.root_node().child_count(), 0);
        assert_tiles(&tree);
    }
}

#[test]
fn test_reparse_of_same_text_is_idempotent() {
    for source in ZEUS_ALL {
        assert_eq!(parse(&ZEUS, source), parse(&ZEUS, source));
    }
}
