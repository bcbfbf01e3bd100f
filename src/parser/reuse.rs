//! Walking an old tree in step with a new parse
//!
//! The cursor follows the parse position (in new-text coordinates) through
//! the old tree and offers the subtrees that start exactly there. Whether an
//! offered subtree can actually be reused is up to the parser; the cursor
//! only answers where things are and whether their bytes survived.

use crate::edit::ChangeSet;
use crate::tree::subtree::Subtree;

struct Frame<'a> {
    subtree: &'a Subtree,
    /// Index of the current child
    child: usize,
    /// Old offset of the current child
    offset: usize,
}

pub(super) struct ReuseCursor<'a> {
    changes: ChangeSet,
    old_source: &'a [u8],
    stack: Vec<Frame<'a>>,
}

impl<'a> ReuseCursor<'a> {
    pub fn new(root: &'a Subtree, old_source: &'a [u8], changes: ChangeSet) -> Self {
        Self {
            changes,
            old_source,
            stack: vec![Frame {
                subtree: root,
                child: 0,
                offset: 0,
            }],
        }
    }

    /// The old leaf that starts at new offset `position`, if any.
    pub fn leaf_at(&mut self, position: usize) -> Option<(&'a Subtree, usize)> {
        loop {
            let (candidate, old_start) = self.seek(position)?;
            if candidate.leaf {
                return Some((candidate, old_start));
            }
            self.stack.push(Frame {
                subtree: candidate,
                child: 0,
                offset: old_start,
            });
        }
    }

    /// Inner nodes on the current path that start at `position`, outermost
    /// first, with their depth and old offset.
    pub fn nodes_at(&self, position: usize) -> Vec<(usize, &'a Subtree, usize)> {
        self.stack
            .iter()
            .enumerate()
            .filter_map(|(depth, frame)| {
                let child = frame.subtree.children.get(frame.child)?;
                (!child.leaf && self.changes.map_start(frame.offset) == Some(position))
                    .then_some((depth, child, frame.offset))
            })
            .collect()
    }

    /// Step past the node returned by [`nodes_at`](Self::nodes_at) at `depth`.
    pub fn skip_node(&mut self, depth: usize) {
        self.stack.truncate(depth + 1);
        self.advance();
    }

    /// Whether old bytes `old_start..old_start + len` are unchanged and now
    /// sit at `new_start` in `new_source`. `len` may reach one past the old
    /// text for subtrees that saw end of input.
    pub fn region_matches(&self, old_start: usize, len: usize, new_start: usize, new_source: &[u8]) -> bool {
        if !self.changes.untouched(old_start, old_start + len) {
            return false;
        }
        let old_end = (old_start + len).min(self.old_source.len());
        let new_end = new_start + (old_end - old_start);
        new_end <= new_source.len() && self.old_source[old_start..old_end] == new_source[new_start..new_end]
    }

    /// Move to the first child at or after `position`, descending into
    /// children that straddle it. Returns the current child when it starts
    /// exactly at `position`.
    fn seek(&mut self, position: usize) -> Option<(&'a Subtree, usize)> {
        loop {
            let frame = self.stack.last()?;
            let subtree: &'a Subtree = frame.subtree;
            let Some(child) = subtree.children.get(frame.child) else {
                self.stack.pop();
                self.advance();
                continue;
            };
            let start = frame.offset;
            let end = start + child.size;
            if child.size == 0 || self.changes.to_new(end) <= position {
                self.advance();
                continue;
            }
            if self.changes.map_start(start) == Some(position) {
                return Some((child, start));
            }
            if self.changes.to_new(start) > position {
                return None;
            }
            if child.leaf {
                self.advance();
            } else {
                self.stack.push(Frame {
                    subtree: child,
                    child: 0,
                    offset: start,
                });
            }
        }
    }

    fn advance(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            if let Some(child) = frame.subtree.children.get(frame.child) {
                frame.offset += child.size;
            }
            frame.child += 1;
        }
    }
}
