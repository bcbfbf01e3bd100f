//! Shared fixtures and assertions for the integration suite.
#![allow(dead_code)]

pub mod languages;
pub mod sources;

use zeus::{Language, Parser, Tree};

pub fn parse(language: &Language, source: &str) -> Tree {
    Parser::new(language.clone()).parse(source.as_bytes())
}

/// Leaves must cover the source in order, without gaps or overlaps.
pub fn assert_tiles(tree: &Tree) {
    let mut offset = 0;
    let mut text = Vec::with_capacity(tree.source().len());
    for token in tree.tokens() {
        assert_eq!(token.start_byte(), offset, "gap or overlap at {offset} in {tree:?}");
        offset = token.end_byte();
        text.extend_from_slice(token.text());
    }
    assert_eq!(offset, tree.source().len(), "leaves stop short in {tree:?}");
    assert_eq!(text, tree.source());

    let root = tree.root_node();
    assert_eq!(root.byte_range(), 0..tree.source().len());
}

/// Every node's children lie inside it, in order.
pub fn assert_nested(tree: &Tree) {
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        let mut previous_end = node.start_byte();
        for child in node.children() {
            assert!(child.start_byte() >= previous_end, "{child:?} overlaps its sibling");
            assert!(child.end_byte() <= node.end_byte(), "{child:?} escapes {node:?}");
            previous_end = child.end_byte();
            stack.push(child);
        }
    }
}
