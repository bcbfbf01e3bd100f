//! Fixed-capacity bit set over terminal symbols.

use crate::language::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct TokenSet {
    words: Vec<u64>,
}

impl TokenSet {
    pub fn new(terminal_count: usize) -> Self {
        Self {
            words: vec![0; terminal_count.div_ceil(64)],
        }
    }

    pub fn insert(&mut self, symbol: Symbol) -> bool {
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        let before = self.words[word];
        self.words[word] |= 1 << bit;
        before != self.words[word]
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        let (word, bit) = (symbol.index() / 64, symbol.index() % 64);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    /// Returns whether any new symbol was added.
    pub fn union_with(&mut self, other: &TokenSet) -> bool {
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let merged = *mine | theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &bits)| {
            (0..64)
                .filter(move |b| bits & (1u64 << b) != 0)
                .map(move |b| Symbol((w * 64 + b) as u16))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_union() {
        let mut a = TokenSet::new(100);
        assert!(a.insert(Symbol(3)));
        assert!(!a.insert(Symbol(3)));
        let mut b = TokenSet::new(100);
        b.insert(Symbol(70));
        assert!(a.union_with(&b));
        assert!(!a.union_with(&b));
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![Symbol(3), Symbol(70)]);
    }
}
