//! Tokens produced by an injected scanner take part in parsing, error
//! recovery and incremental reuse like any table-driven token.

use zeus::{Edit, Parser};

use crate::helpers::languages::RAW;
use crate::helpers::{assert_tiles, parse};

#[test]
fn test_raw_string_with_inner_quote() {
    let source = r###"a = r#"say "hi" twice"#;"###;
    let tree = parse(&RAW, source);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_eq!(
        tree.to_sexp(),
        "(program (binding name: (identifier) value: (raw_string)))"
    );
    let value = tree.root_node().child(0).unwrap().child_by_field_name("value").unwrap();
    assert_eq!(value.text(), br###"r#"say "hi" twice"#"###);
}

#[test]
fn test_raw_string_needs_matching_hashes() {
    let source = r###"a = r##"ends "# here"##;"###;
    let tree = parse(&RAW, source);
    assert!(!tree.has_error());
    let value = tree.root_node().child(0).unwrap().child_by_field_name("value").unwrap();
    assert_eq!(value.kind(), "raw_string");
    assert_eq!(value.text(), br###"r##"ends "# here"##"###);
}

#[test]
fn test_regular_strings_still_lex() {
    let tree = parse(&RAW, "a = \"plain\"; b = r\"raw\";");
    assert!(!tree.has_error());
    assert_eq!(
        tree.to_sexp(),
        "(program (binding name: (identifier) value: (string)) (binding name: (identifier) value: (raw_string)))"
    );
}

#[test]
fn test_scanner_is_not_consulted_where_raw_strings_cannot_appear() {
    // `r` in name position is an identifier
    let tree = parse(&RAW, "r = \"x\";");
    assert!(!tree.has_error());
    assert_eq!(tree.root_node().child(0).unwrap().child(0).unwrap().kind(), "identifier");
}

#[test]
fn test_unterminated_raw_string_recovers() {
    let tree = parse(&RAW, "a = r#\"open;\nb = \"x\";");
    assert!(tree.has_error());
    assert!(!tree.errors().is_empty());
    assert_tiles(&tree);
}

#[test]
fn test_edit_inside_raw_string_matches_full_parse() {
    let old_source = r###"a = r#"one "two""#; b = "three";"###;
    let new_source = r###"a = r#"one "#two""#; b = "three";"###;
    let mut parser = Parser::new(RAW.clone());
    let old = parser.parse(old_source.as_bytes());
    assert!(!old.has_error());

    // a `#` right after `"one "` closes the raw string early
    let at = old_source.find("two").unwrap();
    let new = parser.reparse(&old, &[Edit::insert(at, 1)], new_source.as_bytes());
    assert!(parser.stats().incremental);
    assert_eq!(new, parse(&RAW, new_source));
    assert_tiles(&new);
}
