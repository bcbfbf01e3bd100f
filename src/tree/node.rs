//! Borrowed node views
//!
//! A [`Node`] is a subtree plus its absolute start offset. Hidden subtrees
//! are looked through, so the children of a node are its *visible*
//! descendants in order, and invisible tokens such as whitespace are not
//! children at all (they remain reachable through [`Tree::tokens`]).

use std::fmt;

use text_size::{TextRange, TextSize};

use super::Tree;
use super::subtree::Subtree;
use crate::base::Point;
use crate::language::{FieldId, Symbol};

#[derive(Clone, Copy)]
pub struct Node<'tree> {
    pub(crate) tree: &'tree Tree,
    pub(crate) subtree: &'tree Subtree,
    pub(crate) start: usize,
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.subtree.ptr_eq(other.subtree) && self.start == other.start
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}..{}]", self.kind(), self.start_byte(), self.end_byte())
    }
}

impl<'tree> Node<'tree> {
    pub(crate) fn new(tree: &'tree Tree, subtree: &'tree Subtree, start: usize) -> Self {
        Self { tree, subtree, start }
    }

    // =========================================================================
    // Kind and flags
    // =========================================================================

    pub fn kind(&self) -> &'tree str {
        self.tree.language().symbol_name(self.subtree.symbol)
    }

    pub fn symbol(&self) -> Symbol {
        self.subtree.symbol
    }

    pub fn is_named(&self) -> bool {
        self.tree.language().symbol_metadata(self.subtree.symbol).named
    }

    pub fn is_extra(&self) -> bool {
        self.subtree.extra
    }

    pub fn is_error(&self) -> bool {
        self.subtree.is_error()
    }

    /// A zero-width token inserted by error recovery.
    pub fn is_missing(&self) -> bool {
        self.subtree.missing
    }

    /// Whether this node is, or contains, an ERROR or MISSING node.
    pub fn has_error(&self) -> bool {
        self.subtree.has_error
    }

    // =========================================================================
    // Position
    // =========================================================================

    pub fn start_byte(&self) -> usize {
        self.start
    }

    pub fn end_byte(&self) -> usize {
        self.start + self.subtree.size
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_byte()..self.end_byte()
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(text_size(self.start_byte()), text_size(self.end_byte()))
    }

    pub fn start_point(&self) -> Point {
        self.tree.line_index().point(self.start_byte())
    }

    pub fn end_point(&self) -> Point {
        self.tree.line_index().point(self.end_byte())
    }

    pub fn text(&self) -> &'tree [u8] {
        &self.tree.source()[self.byte_range()]
    }

    pub fn utf8_text(&self) -> Result<&'tree str, std::str::Utf8Error> {
        std::str::from_utf8(self.text())
    }

    // =========================================================================
    // Children
    // =========================================================================

    pub fn child_count(&self) -> usize {
        self.subtree.visible_child_count
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn child(&self, index: usize) -> Option<Node<'tree>> {
        self.children().nth(index)
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'tree>> {
        self.named_children().nth(index)
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        self.children_with_fields().map(|(node, _)| node)
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        self.children().filter(Node::is_named)
    }

    pub(crate) fn children_with_fields(&self) -> VisibleChildren<'tree> {
        VisibleChildren::new(*self)
    }

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'tree>> {
        let field = self.tree.language().field_id(name)?;
        self.children_with_fields()
            .find(|(_, f)| *f == Some(field))
            .map(|(node, _)| node)
    }

    pub fn children_by_field_name(&self, name: &str) -> impl Iterator<Item = Node<'tree>> + 'tree {
        let field = self.tree.language().field_id(name);
        self.children_with_fields()
            .filter(move |(_, f)| field.is_some() && *f == field)
            .map(|(node, _)| node)
    }

    pub fn field_name_for_child(&self, index: usize) -> Option<&'tree str> {
        let (_, field) = self.children_with_fields().nth(index)?;
        self.tree.language().field_name(field?)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// The visible node whose children include this one. Found by
    /// descending from the root, since nodes keep no back-pointers.
    pub fn parent(&self) -> Option<Node<'tree>> {
        let root = self.tree.root_node();
        if *self == root {
            return None;
        }
        let mut stack = vec![root];
        while let Some(candidate) = stack.pop() {
            let mut containing = Vec::new();
            for child in candidate.children() {
                if child == *self {
                    return Some(candidate);
                }
                if child.child_count() > 0
                    && child.start_byte() <= self.start_byte()
                    && self.end_byte() <= child.end_byte()
                {
                    containing.push(child);
                }
            }
            stack.extend(containing.into_iter().rev());
        }
        None
    }

    pub fn next_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let mut siblings = parent.children();
        siblings.find(|n| n == self)?;
        siblings.next()
    }

    pub fn prev_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let mut previous = None;
        for sibling in parent.children() {
            if sibling == *self {
                return previous;
            }
            previous = Some(sibling);
        }
        None
    }

    pub fn next_named_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let mut siblings = parent.children();
        siblings.find(|n| n == self)?;
        siblings.find(Node::is_named)
    }

    /// The smallest node within this one that spans `start..end`.
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'tree>> {
        if start > end || start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut node = *self;
        'descend: loop {
            for child in node.children() {
                let spans = child.start_byte() <= start && end <= child.end_byte();
                let nonempty = child.start_byte() < child.end_byte() || start == end;
                if spans && nonempty {
                    node = child;
                    continue 'descend;
                }
                if child.start_byte() > start {
                    break;
                }
            }
            return Some(node);
        }
    }

    pub fn walk(&self) -> super::TreeCursor<'tree> {
        super::TreeCursor::new(*self)
    }

    // =========================================================================
    // S-expressions
    // =========================================================================

    /// Named nodes as an S-expression, with field labels and MISSING markers.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.open_sexp(&mut out);
        let mut stack = vec![self.children_with_fields()];
        while let Some(children) = stack.last_mut() {
            let Some((child, field)) = children.next() else {
                stack.pop();
                out.push(')');
                continue;
            };
            if !child.is_named() && !child.is_missing() {
                continue;
            }
            out.push(' ');
            if let Some(name) = field.and_then(|f| self.tree.language().field_name(f)) {
                out.push_str(name);
                out.push_str(": ");
            }
            child.open_sexp(&mut out);
            stack.push(child.children_with_fields());
        }
        out
    }

    fn open_sexp(&self, out: &mut String) {
        out.push('(');
        if self.is_missing() {
            out.push_str("MISSING ");
            if self.is_named() {
                out.push_str(self.kind());
            } else {
                out.push('"');
                out.push_str(self.kind());
                out.push('"');
            }
        } else {
            out.push_str(self.kind());
        }
    }
}

fn text_size(offset: usize) -> TextSize {
    TextSize::try_from(offset).unwrap_or(TextSize::new(u32::MAX))
}

struct Frame<'tree> {
    subtree: &'tree Subtree,
    index: usize,
    offset: usize,
    inherited: Option<FieldId>,
}

/// Visible children of a node with their fields, looking through hidden
/// subtrees without recursion.
pub(crate) struct VisibleChildren<'tree> {
    tree: &'tree Tree,
    stack: Vec<Frame<'tree>>,
}

impl<'tree> VisibleChildren<'tree> {
    fn new(node: Node<'tree>) -> Self {
        Self {
            tree: node.tree,
            stack: vec![Frame {
                subtree: node.subtree,
                index: 0,
                offset: node.start,
                inherited: None,
            }],
        }
    }
}

impl<'tree> Iterator for VisibleChildren<'tree> {
    type Item = (Node<'tree>, Option<FieldId>);

    fn next(&mut self) -> Option<Self::Item> {
        let language = self.tree.language();
        loop {
            let frame = self.stack.last_mut()?;
            let parent: &'tree Subtree = frame.subtree;
            let Some(child) = parent.children.get(frame.index) else {
                self.stack.pop();
                continue;
            };
            let field = parent.field_for_child(frame.index).or(frame.inherited);
            let start = frame.offset;
            frame.index += 1;
            frame.offset += child.size;

            if child.is_transparent(language) {
                self.stack.push(Frame {
                    subtree: child,
                    index: 0,
                    offset: start,
                    inherited: field,
                });
            } else if child.is_visible(language) {
                return Some((Node::new(self.tree, child, start), field));
            }
        }
    }
}
