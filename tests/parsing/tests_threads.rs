//! Languages and trees are shared freely between threads.

use std::thread;

use zeus::{Parser, Tree, parse_batch};

use crate::helpers::languages::ZEUS;
use crate::helpers::parse;
use crate::helpers::sources::ZEUS_ALL;

fn baseline() -> Vec<Tree> {
    ZEUS_ALL.iter().map(|source| parse(&ZEUS, source)).collect()
}

#[test]
fn test_parse_batch_matches_sequential_parses() {
    let sources: Vec<&[u8]> = ZEUS_ALL.iter().map(|s| s.as_bytes()).collect();
    let trees = parse_batch(&ZEUS, &sources);
    assert_eq!(trees, baseline());
}

#[test]
fn test_scoped_threads_share_one_language() {
    let expected = baseline();
    let trees: Vec<Tree> = thread::scope(|scope| {
        let handles: Vec<_> = ZEUS_ALL
            .iter()
            .map(|&source| scope.spawn(move || Parser::new(ZEUS.clone()).parse(source.as_bytes())))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(trees, expected);
}

#[test]
fn test_trees_are_readable_from_other_threads() {
    let tree = parse(&ZEUS, ZEUS_ALL[0]);
    let tree = &tree;
    let kinds: Vec<String> = thread::scope(|scope| {
        (0..4)
            .map(|_| scope.spawn(move || tree.root_node().named_children().map(|n| n.kind().to_string()).collect::<Vec<_>>()))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap().join(","))
            .collect()
    });
    assert!(kinds.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(kinds[0], "extern_function_definition,function_definition");
}
