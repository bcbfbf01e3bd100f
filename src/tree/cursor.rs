use super::node::{Node, VisibleChildren};

struct CursorFrame<'tree> {
    node: Node<'tree>,
    field: Option<&'tree str>,
    /// Remaining siblings after `node`
    siblings: Option<VisibleChildren<'tree>>,
}

/// A stateful walker over the visible nodes of a tree.
///
/// The cursor never moves above the node it was created from.
pub struct TreeCursor<'tree> {
    stack: Vec<CursorFrame<'tree>>,
}

impl<'tree> TreeCursor<'tree> {
    pub(crate) fn new(node: Node<'tree>) -> Self {
        Self {
            stack: vec![CursorFrame {
                node,
                field: None,
                siblings: None,
            }],
        }
    }

    fn top(&self) -> &CursorFrame<'tree> {
        // the stack always holds the starting node
        &self.stack[self.stack.len() - 1]
    }

    pub fn node(&self) -> Node<'tree> {
        self.top().node
    }

    pub fn field_name(&self) -> Option<&'tree str> {
        self.top().field
    }

    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn reset(&mut self, node: Node<'tree>) {
        *self = Self::new(node);
    }

    pub fn goto_first_child(&mut self) -> bool {
        let node = self.node();
        let mut children = node.children_with_fields();
        match children.next() {
            Some((child, field)) => {
                self.stack.push(CursorFrame {
                    node: child,
                    field: field.and_then(|f| node.tree.language().field_name(f)),
                    siblings: Some(children),
                });
                true
            }
            None => false,
        }
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        let Some(frame) = self.stack.last_mut() else {
            return false;
        };
        let Some(siblings) = frame.siblings.as_mut() else {
            return false;
        };
        match siblings.next() {
            Some((node, field)) => {
                frame.node = node;
                frame.field = field.and_then(|f| node.tree.language().field_name(f));
                true
            }
            None => false,
        }
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Move to the first child that extends past `byte`, returning its index.
    pub fn goto_first_child_for_byte(&mut self, byte: usize) -> Option<usize> {
        if !self.goto_first_child() {
            return None;
        }
        let mut index = 0;
        loop {
            if self.node().end_byte() > byte {
                return Some(index);
            }
            if !self.goto_next_sibling() {
                self.goto_parent();
                return None;
            }
            index += 1;
        }
    }
}
