//! Queries over the bundled Zeus grammar and the calculator fixture.

use rstest::rstest;
use zeus::{Query, QueryCursor, QueryError};

use crate::helpers::languages::{CALC, ZEUS};
use crate::helpers::parse;
use crate::helpers::sources::*;

fn captured(language: &zeus::Language, query_source: &str, source: &str) -> Vec<String> {
    let tree = parse(language, source);
    let query = Query::new(language, query_source).unwrap();
    QueryCursor::new()
        .matches(&query, tree.root_node(), tree.source())
        .iter()
        .flat_map(|m| m.captures.iter().map(|c| c.node.utf8_text().unwrap().to_string()).collect::<Vec<_>>())
        .collect()
}

#[rstest]
#[case::function_names(
    "(function_definition name: (identifier) @name)",
    ZEUS_STRUCTS,
    &["area", "build"]
)]
#[case::extern_functions(
    "(extern_function_definition name: (identifier) @name)",
    ZEUS_HELLO,
    &["puts"]
)]
#[case::string_literals("(string_literal) @string", ZEUS_HELLO, &["\"hello\\n\""])]
#[case::struct_fields(
    "(struct_definition (parameter name: (identifier) @field)+)",
    ZEUS_STRUCTS,
    &["width", "height"]
)]
#[case::called_functions(
    "(call_expression function: (identifier) @callee)",
    ZEUS_HELLO,
    &["puts"]
)]
#[case::field_initializers("(field_init name: (identifier) @name)", ZEUS_STRUCTS, &["width", "height"])]
fn test_zeus_captures(#[case] query: &str, #[case] source: &str, #[case] expected: &[&str]) {
    assert_eq!(captured(&ZEUS, query, source), expected);
}

#[test]
fn test_functions_without_return_type() {
    let source = "fn a(): i32 { return 1; }\nfn b() { return 2; }\n";
    let names = captured(
        &ZEUS,
        "(function_definition name: (identifier) @name !return_type)",
        source,
    );
    assert_eq!(names, ["b"]);
}

#[test]
fn test_predicates_filter_zeus_identifiers() {
    let names = captured(
        &ZEUS,
        r#"((function_definition name: (identifier) @name) (#match? @name "^[a-c]"))"#,
        ZEUS_STRUCTS,
    );
    assert_eq!(names, ["area", "build"]);

    let names = captured(
        &ZEUS,
        r#"((function_definition name: (identifier) @name) (#not-eq? @name "area"))"#,
        ZEUS_STRUCTS,
    );
    assert_eq!(names, ["build"]);
}

#[test]
fn test_calc_operators_by_alternation() {
    let operators = captured(
        &CALC,
        r#"(binary operator: ["*" "/"] @op)"#,
        CALC_PROGRAM,
    );
    assert_eq!(operators, ["*", "/"]);
}

#[test]
fn test_calc_assignments_to_calls() {
    let tree = parse(&CALC, CALC_PROGRAM);
    let query = Query::new(
        &CALC,
        "(statement target: (identifier) @target value: (binary right: (call function: (identifier) @callee)))",
    )
    .unwrap();
    let matches = QueryCursor::new().matches(&query, tree.root_node(), tree.source());
    assert_eq!(matches.len(), 1);
    let target = query.capture_index_for_name("target").unwrap();
    let callee = query.capture_index_for_name("callee").unwrap();
    assert_eq!(matches[0].nodes_for_capture_index(target).next().unwrap().text(), b"y");
    assert_eq!(matches[0].nodes_for_capture_index(callee).next().unwrap().text(), b"f");
}

#[test]
fn test_comments_are_queryable() {
    assert_eq!(captured(&CALC, "(comment) @c", CALC_PROGRAM), ["# comment"]);
}

#[test]
fn test_byte_range_limits_matches() {
    let tree = parse(&CALC, CALC_PROGRAM);
    let query = Query::new(&CALC, "(number) @n").unwrap();
    let second_line = CALC_PROGRAM.find("y =").unwrap();
    let third_line = CALC_PROGRAM.find("z =").unwrap();
    let mut cursor = QueryCursor::new();
    cursor.set_byte_range(second_line..third_line);
    let numbers: Vec<_> = cursor
        .matches(&query, tree.root_node(), tree.source())
        .iter()
        .map(|m| m.captures[0].node.text())
        .collect();
    assert_eq!(numbers, [b"4".as_slice(), b"2".as_slice()]);
}

#[test]
fn test_errors_are_queryable_in_broken_code() {
    let tree = parse(&ZEUS, ZEUS_BROKEN);
    let query = Query::new(&ZEUS, "(ERROR) @error").unwrap();
    let matches = QueryCursor::new().matches(&query, tree.root_node(), tree.source());
    assert!(!matches.is_empty());
}

#[rstest]
#[case::unknown_kind("(lambda) @l")]
#[case::unknown_field("(function_definition body: (block))")]
#[case::unbalanced("(function_definition")]
fn test_invalid_queries_against_zeus(#[case] source: &str) {
    let error = Query::new(&ZEUS, source).unwrap_err();
    assert!(error.offset() <= source.len());
    assert!(matches!(
        error,
        QueryError::NodeKind { .. } | QueryError::Field { .. } | QueryError::Syntax { .. }
    ));
}
