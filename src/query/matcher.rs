//! Running compiled patterns over a tree
//!
//! Matching is a backtracking search written in continuation-passing
//! style: every step calls the continuation once it has matched, and a
//! `false` from the continuation makes the step try its next alternative.
//! The first assignment whose predicates hold is reported, so each pattern
//! matches a given node at most once.

use std::ops::Range;

use super::parser::{ChildStep, KindTest, Operand, Predicate, Step, StepKind};
use super::{Query, QueryCapture, QueryMatch};
use crate::language::FieldId;
use crate::tree::Node;

type Captures<'tree> = Vec<QueryCapture<'tree>>;

/// Runs a [`Query`] over a node and its descendants.
#[derive(Debug, Clone, Default)]
pub struct QueryCursor {
    range: Option<Range<usize>>,
}

impl QueryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only report matches whose node overlaps `range`.
    pub fn set_byte_range(&mut self, range: Range<usize>) -> &mut Self {
        self.range = Some(range);
        self
    }

    /// Every match under `node`, in document order. Matches rooted at the
    /// same node come in pattern order.
    pub fn matches<'tree>(&self, query: &Query, node: Node<'tree>, source: &[u8]) -> Vec<QueryMatch<'tree>> {
        let matcher = Matcher { source };
        let mut found = Vec::new();
        let mut cursor = node.walk();
        loop {
            let current = cursor.node();
            let visible = self.overlaps(current);
            if visible {
                for (pattern_index, pattern) in query.patterns.iter().enumerate() {
                    if let Some(captures) = matcher.run(&pattern.root, &pattern.predicates, current) {
                        found.push(QueryMatch {
                            pattern_index,
                            captures,
                        });
                    }
                }
            }
            if visible && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.depth() == 0 {
                    return found;
                }
                if cursor.goto_next_sibling() {
                    break;
                }
                cursor.goto_parent();
            }
        }
    }

    fn overlaps(&self, node: Node<'_>) -> bool {
        let Some(range) = &self.range else {
            return true;
        };
        let (start, end) = (node.start_byte(), node.end_byte());
        if start == end {
            return range.start <= start && start <= range.end;
        }
        start < range.end && end > range.start
    }
}

struct Matcher<'s> {
    source: &'s [u8],
}

impl Matcher<'_> {
    fn run<'tree>(&self, root: &Step, predicates: &[Predicate], node: Node<'tree>) -> Option<Captures<'tree>> {
        let mut result = None;
        let mut captures = Vec::new();
        self.match_step(root, node, &mut captures, &mut |captures| {
            if predicates.iter().all(|p| self.holds(p, captures)) {
                result = Some(captures.clone());
                return true;
            }
            false
        });
        result
    }

    fn match_step<'tree>(
        &self,
        step: &Step,
        node: Node<'tree>,
        captures: &mut Captures<'tree>,
        k: &mut dyn FnMut(&mut Captures<'tree>) -> bool,
    ) -> bool {
        let mark = captures.len();
        captures.extend(step.captures.iter().map(|&index| QueryCapture { node, index }));
        let found = match &step.kind {
            StepKind::Alternation(branches) => branches
                .iter()
                .any(|branch| self.match_step(branch, node, captures, &mut *k)),
            StepKind::Node {
                test,
                children,
                absent_fields,
            } => {
                if !accepts(test, node) || absent_fields.iter().any(|&f| has_field(node, f)) {
                    false
                } else if children.is_empty() {
                    k(captures)
                } else {
                    let kids: Vec<(Node<'tree>, Option<FieldId>)> = node.children_with_fields().collect();
                    self.match_children(children, 0, &kids, 0, 0, captures, k)
                }
            }
        };
        if !found {
            captures.truncate(mark);
        }
        found
    }

    /// Match `children[index..]` against `kids[from..]`, where the pattern at
    /// `index` has already matched `count` times. Unmatched kids in between
    /// are skipped, and repetitions are greedy.
    #[allow(clippy::too_many_arguments)]
    fn match_children<'tree>(
        &self,
        children: &[ChildStep],
        index: usize,
        kids: &[(Node<'tree>, Option<FieldId>)],
        from: usize,
        count: usize,
        captures: &mut Captures<'tree>,
        k: &mut dyn FnMut(&mut Captures<'tree>) -> bool,
    ) -> bool {
        let Some(child) = children.get(index) else {
            return k(captures);
        };
        let (min, max) = child.quantifier.bounds();
        if count < max {
            for (j, &(kid, field)) in kids.iter().enumerate().skip(from) {
                if child.field.is_some() && field != child.field {
                    continue;
                }
                let matched = self.match_step(&child.step, kid, captures, &mut |captures| {
                    self.match_children(children, index, kids, j + 1, count + 1, captures, &mut *k)
                });
                if matched {
                    return true;
                }
            }
        }
        count >= min && self.match_children(children, index + 1, kids, from, 0, captures, k)
    }

    fn holds(&self, predicate: &Predicate, captures: &Captures<'_>) -> bool {
        let nodes = |index: u32| captures.iter().filter(move |c| c.index == index).map(|c| c.node);
        match predicate {
            Predicate::Eq {
                capture,
                value,
                negated,
            } => nodes(*capture).all(|node| {
                let text = self.text(node);
                let equal = match value {
                    Operand::Text(expected) => text == expected.as_bytes(),
                    Operand::Capture(other) => nodes(*other).all(|o| self.text(o) == text),
                };
                equal != *negated
            }),
            Predicate::Match {
                capture,
                regex,
                negated,
            } => nodes(*capture).all(|node| regex.is_match(self.text(node)) != *negated),
        }
    }

    fn text(&self, node: Node<'_>) -> &[u8] {
        self.source.get(node.byte_range()).unwrap_or_default()
    }
}

fn accepts(test: &KindTest, node: Node<'_>) -> bool {
    match test {
        KindTest::Any => true,
        KindTest::AnyNamed => node.is_named(),
        KindTest::Symbols(symbols) => symbols.contains(&node.symbol()),
    }
}

fn has_field(node: Node<'_>, field: FieldId) -> bool {
    node.children_with_fields().any(|(_, f)| f == Some(field))
}
