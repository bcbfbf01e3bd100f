//! Syntax trees
//!
//! A [`Tree`] owns its root subtree, the [`Language`] it was parsed with and
//! a copy of the source. Trees are immutable; reparsing produces a new tree
//! that shares every reused subtree with the old one.

mod cursor;
mod node;
pub(crate) mod subtree;

pub use cursor::TreeCursor;
pub use node::Node;

use std::fmt;
use std::sync::Arc;

use crate::base::LineIndex;
use crate::errors::SyntaxError;
use crate::language::Language;
use subtree::Subtree;

#[derive(Clone)]
pub struct Tree {
    root: Subtree,
    language: Language,
    source: Arc<[u8]>,
    line_index: Arc<LineIndex>,
}

impl Tree {
    pub(crate) fn new(root: Subtree, language: Language, source: Arc<[u8]>) -> Self {
        let line_index = Arc::new(LineIndex::new(&source));
        Self {
            root,
            language,
            source,
            line_index,
        }
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::new(self, &self.root, 0)
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Source text covered by `node`.
    pub fn text<'a>(&'a self, node: &Node<'a>) -> &'a [u8] {
        &self.source[node.byte_range()]
    }

    pub fn has_error(&self) -> bool {
        self.root.has_error
    }

    /// Every ERROR and MISSING node as a diagnostic.
    pub fn errors(&self) -> Vec<SyntaxError> {
        crate::errors::collect(self)
    }

    /// Every leaf in document order, including invisible tokens such as
    /// whitespace. Their byte ranges tile the source exactly.
    pub fn tokens(&self) -> Vec<Node<'_>> {
        let mut tokens = Vec::new();
        let mut stack: Vec<(&Subtree, usize)> = vec![(&self.root, 0)];
        while let Some((subtree, start)) = stack.pop() {
            if subtree.leaf {
                tokens.push(Node::new(self, subtree, start));
                continue;
            }
            let mut offset = start + subtree.size;
            for child in subtree.children.iter().rev() {
                offset -= child.size;
                stack.push((child, offset));
            }
        }
        tokens
    }

    pub fn walk(&self) -> TreeCursor<'_> {
        self.root_node().walk()
    }

    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }

    pub(crate) fn root(&self) -> &Subtree {
        &self.root
    }
}

/// Trees are equal when they have the same source and the same shape:
/// symbols, sizes, flags and fields of every subtree.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        if self.source != other.source || !self.language.same_tables(&other.language) {
            return false;
        }
        let mut stack = vec![(&self.root, &other.root)];
        while let Some((a, b)) = stack.pop() {
            if a.ptr_eq(b) {
                continue;
            }
            let same = a.symbol == b.symbol
                && a.leaf == b.leaf
                && a.size == b.size
                && a.extra == b.extra
                && a.missing == b.missing
                && a.has_error == b.has_error
                && a.fields == b.fields
                && a.children.len() == b.children.len();
            if !same {
                return false;
            }
            stack.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

impl Eq for Tree {}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("language", &self.language.name())
            .field("len", &self.source.len())
            .field("root", &self.to_sexp())
            .finish()
    }
}
