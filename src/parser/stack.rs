//! Arena-backed parse stacks
//!
//! Every version's stack is a chain of entries linked through `prev`.
//! Entries are never mutated once pushed, so a fork only copies a head index
//! and popping is moving the head down the chain. The arena lives for a
//! single parse.

use crate::language::StateId;
use crate::tree::subtree::Subtree;

pub(super) type EntryId = usize;

#[derive(Debug, Clone)]
pub(super) struct Entry {
    pub state: StateId,
    /// `None` only for the bottom entry
    pub subtree: Option<Subtree>,
    pub prev: Option<EntryId>,
    /// Byte offset just past `subtree`
    pub position: usize,
}

impl Entry {
    pub fn is_extra(&self) -> bool {
        self.subtree.as_ref().is_some_and(|s| s.extra)
    }
}

#[derive(Debug, Default)]
pub(super) struct Stack {
    entries: Vec<Entry>,
}

impl Stack {
    /// A stack holding only the bottom entry in `state`.
    pub fn new(state: StateId) -> (Self, EntryId) {
        let mut stack = Self::default();
        let base = stack.push(None, state, None, 0);
        (stack, base)
    }

    pub fn push(
        &mut self,
        prev: Option<EntryId>,
        state: StateId,
        subtree: Option<Subtree>,
        position: usize,
    ) -> EntryId {
        self.entries.push(Entry {
            state,
            subtree,
            prev,
            position,
        });
        self.entries.len() - 1
    }

    pub fn get(&self, id: EntryId) -> &Entry {
        &self.entries[id]
    }

    /// Subtrees from the bottom of the stack up to `head`.
    pub fn subtrees(&self, head: EntryId) -> Vec<Subtree> {
        let mut subtrees = Vec::new();
        let mut id = Some(head);
        while let Some(current) = id {
            let entry = self.get(current);
            if let Some(subtree) = &entry.subtree {
                subtrees.push(subtree.clone());
            }
            id = entry.prev;
        }
        subtrees.reverse();
        subtrees
    }

    /// States of the non-extra entries from the bottom up to `head`, which
    /// is all the LR automaton looks at.
    pub fn states(&self, head: EntryId) -> Vec<StateId> {
        let mut states = Vec::new();
        let mut id = Some(head);
        while let Some(current) = id {
            let entry = self.get(current);
            if !entry.is_extra() {
                states.push(entry.state);
            }
            id = entry.prev;
        }
        states.reverse();
        states
    }

    /// Two stacks behave identically from here on when every entry agrees
    /// on state, position and extra-ness down to a shared entry.
    pub fn equivalent(&self, mut a: EntryId, mut b: EntryId) -> bool {
        loop {
            if a == b {
                return true;
            }
            let (x, y) = (self.get(a), self.get(b));
            if x.state != y.state || x.position != y.position || x.is_extra() != y.is_extra() {
                return false;
            }
            match (x.prev, y.prev) {
                (Some(pa), Some(pb)) => (a, b) = (pa, pb),
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}
