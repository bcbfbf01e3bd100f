//! Grammar description DSL
//!
//! A [`Grammar`] is an ordered set of named [`Rule`]s plus the lexical
//! configuration (extras, externals, keyword token) and the declared
//! conflict groups. The first rule added is the start rule.
//!
//! ```
//! use zeus::grammar::{Grammar, pattern, repeat, sym};
//! use zeus::seq;
//!
//! let grammar = Grammar::builder("lists")
//!     .rule("list", seq!["(", repeat(sym("item")), ")"])
//!     .rule("item", pattern(r"[a-z]+"))
//!     .build();
//! assert_eq!(grammar.start_rule(), Some("list"));
//! ```

mod rule;

pub use rule::{
    PrecKind, Rule, alias, blank, choice, field, optional, pattern, prec, prec_dynamic, prec_left,
    prec_right, repeat, repeat1, seq, string, sym, token, token_immediate,
};

use indexmap::IndexMap;
use smol_str::SmolStr;

/// A grammar ready to be compiled into a [`Language`](crate::Language).
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) name: SmolStr,
    pub(crate) rules: IndexMap<SmolStr, Rule>,
    pub(crate) extras: Vec<Rule>,
    pub(crate) conflicts: Vec<Vec<SmolStr>>,
    pub(crate) externals: Vec<SmolStr>,
    pub(crate) word: Option<SmolStr>,
    /// Rule names that were defined more than once, reported at compile time
    pub(crate) duplicates: Vec<SmolStr>,
}

impl Grammar {
    pub fn builder(name: &str) -> GrammarBuilder {
        GrammarBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_rule(&self) -> Option<&str> {
        self.rules.keys().next().map(SmolStr::as_str)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn rules(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }
}

/// Builder for [`Grammar`].
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    grammar: Grammar,
    extras_set: bool,
}

impl GrammarBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            grammar: Grammar {
                name: SmolStr::new(name),
                rules: IndexMap::new(),
                extras: Vec::new(),
                conflicts: Vec::new(),
                externals: Vec::new(),
                word: None,
                duplicates: Vec::new(),
            },
            extras_set: false,
        }
    }

    /// Add a named rule. Rules keep their insertion order.
    pub fn rule(mut self, name: &str, rule: impl Into<Rule>) -> Self {
        let name = SmolStr::new(name);
        if self.grammar.rules.contains_key(&name) {
            self.grammar.duplicates.push(name);
        } else {
            self.grammar.rules.insert(name, rule.into());
        }
        self
    }

    /// Tokens that may appear anywhere between other tokens.
    ///
    /// Defaults to a single whitespace pattern when never called.
    pub fn extras<I>(mut self, extras: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Rule>,
    {
        self.grammar.extras = extras.into_iter().map(Into::into).collect();
        self.extras_set = true;
        self
    }

    /// Declare that the named rules may conflict; the parser explores
    /// the alternatives with GLR instead of failing compilation.
    pub fn conflict<I, S>(mut self, group: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.grammar
            .conflicts
            .push(group.into_iter().map(|s| SmolStr::new(s.as_ref())).collect());
        self
    }

    /// Tokens produced by the injected external scanner.
    pub fn externals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.grammar.externals = names.into_iter().map(|s| SmolStr::new(s.as_ref())).collect();
        self
    }

    /// The identifier-like token used for keyword extraction.
    pub fn word(mut self, name: &str) -> Self {
        self.grammar.word = Some(SmolStr::new(name));
        self
    }

    pub fn build(mut self) -> Grammar {
        if !self.extras_set {
            self.grammar.extras = vec![pattern(r"\s")];
        }
        self.grammar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extras_is_whitespace() {
        let grammar = Grammar::builder("g").rule("a", "x").build();
        assert_eq!(grammar.extras, vec![pattern(r"\s")]);
    }

    #[test]
    fn test_explicit_empty_extras() {
        let grammar = Grammar::builder("g")
            .rule("a", "x")
            .extras(Vec::<Rule>::new())
            .build();
        assert!(grammar.extras.is_empty());
    }

    #[test]
    fn test_duplicate_rules_are_recorded() {
        let grammar = Grammar::builder("g")
            .rule("a", "x")
            .rule("a", "y")
            .build();
        assert_eq!(grammar.rules.len(), 1);
        assert_eq!(grammar.duplicates, vec![SmolStr::new("a")]);
        assert_eq!(grammar.rule("a"), Some(&string("x")));
    }

    #[test]
    fn test_rules_keep_insertion_order() {
        let grammar = Grammar::builder("g")
            .rule("z", sym("a"))
            .rule("a", "x")
            .build();
        let names: Vec<_> = grammar.rules().map(|(name, _)| name).collect();
        assert_eq!(names, ["z", "a"]);
        assert_eq!(grammar.start_rule(), Some("z"));
    }
}
