//! Reparsing after edits must give exactly the tree a fresh parse gives.

use proptest::prelude::*;
use zeus::{Edit, Language, Parser, Tree};

use crate::helpers::languages::{CALC, ZEUS};
use crate::helpers::sources::*;
use crate::helpers::{assert_tiles, parse};

/// Replace `start..start + old_len` with `text`, returning the new source
/// and the matching edit.
fn splice(source: &str, start: usize, old_len: usize, text: &str) -> (String, Edit) {
    let mut new = String::with_capacity(source.len() + text.len());
    new.push_str(&source[..start]);
    new.push_str(text);
    new.push_str(&source[start + old_len..]);
    (new, Edit::new(start, old_len, text.len()))
}

fn check_reparse(language: &Language, old: &Tree, new_source: &str, edits: &[Edit]) -> Tree {
    let mut parser = Parser::new(language.clone());
    let new = parser.reparse(old, edits, new_source.as_bytes());
    assert!(parser.stats().incremental);
    let fresh = parse(language, new_source);
    assert_eq!(new, fresh, "incremental and fresh parses differ for {new_source:?}");
    assert_tiles(&new);
    new
}

/// An edit over `source`: a start offset, a removed length and new text.
fn edit_strategy(source: &'static str) -> impl Strategy<Value = (usize, usize, String)> {
    (0..=source.len())
        .prop_flat_map(move |start| (Just(start), 0..=(source.len() - start).min(8)))
        .prop_flat_map(|(start, old_len)| (Just(start), Just(old_len), "[a-z0-9+*()=; \n#-]{0,6}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_calc_reparse_equals_fresh_parse((start, old_len, text) in edit_strategy(CALC_PROGRAM)) {
        let old = parse(&CALC, CALC_PROGRAM);
        let (new_source, edit) = splice(CALC_PROGRAM, start, old_len, &text);
        check_reparse(&CALC, &old, &new_source, &[edit]);
    }

    #[test]
    fn prop_zeus_reparse_equals_fresh_parse((start, old_len, text) in edit_strategy(ZEUS_CONTROL_FLOW)) {
        let old = parse(&ZEUS, ZEUS_CONTROL_FLOW);
        let (new_source, edit) = splice(ZEUS_CONTROL_FLOW, start, old_len, &text);
        check_reparse(&ZEUS, &old, &new_source, &[edit]);
    }

    #[test]
    fn prop_chained_edits_stay_consistent(
        first in edit_strategy(CALC_PROGRAM),
        second_text in "[a-z0-9+*();= ]{0,4}",
        second_at in 0usize..64,
    ) {
        let old = parse(&CALC, CALC_PROGRAM);
        let (middle, edit) = splice(CALC_PROGRAM, first.0, first.1, &first.2);
        let middle_tree = check_reparse(&CALC, &old, &middle, &[edit]);

        let at = second_at.min(middle.len());
        let (last, edit) = splice(&middle, at, 0, &second_text);
        check_reparse(&CALC, &middle_tree, &last, &[edit]);
    }
}

#[test]
fn test_several_edits_in_one_reparse() {
    let old = parse(&CALC, CALC_PROGRAM);
    // both edits are in the coordinates left by the previous one
    let (step, first) = splice(CALC_PROGRAM, 4, 1, "10");
    let (new_source, second) = splice(&step, step.len() - 3, 1, "7");
    let new = check_reparse(&CALC, &old, &new_source, &[first, second]);
    assert!(!new.has_error());
}

#[test]
fn test_edit_far_from_change_reuses_nodes() {
    let old = parse(&ZEUS, ZEUS_STRUCTS);
    let at = ZEUS_STRUCTS.find("return r").unwrap() + "return ".len();
    let (new_source, edit) = splice(ZEUS_STRUCTS, at, 1, "rect");
    let mut parser = Parser::new(ZEUS.clone());
    let new = parser.reparse(&old, &[edit], new_source.as_bytes());
    let stats = *parser.stats();
    assert!(stats.reused_nodes > 0, "{stats:?}");
    assert!(stats.lexed_tokens < parse_token_count(&new_source));
    assert_eq!(new, parse(&ZEUS, &new_source));
}

#[test]
fn test_fixing_broken_code_incrementally() {
    let old = parse(&ZEUS, ZEUS_BROKEN);
    assert!(old.has_error());
    let at = ZEUS_BROKEN.find("(:").unwrap() + 1;
    let (new_source, edit) = splice(ZEUS_BROKEN, at, 0, ")");
    let new = check_reparse(&ZEUS, &old, &new_source, &[edit]);
    assert!(new.has_error());
}

fn parse_token_count(source: &str) -> usize {
    let mut parser = Parser::new(ZEUS.clone());
    parser.parse(source.as_bytes());
    parser.stats().lexed_tokens
}
