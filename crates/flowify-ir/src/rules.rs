//! Rewrite rules.
//!
//! Two rule shapes cover everything the compiler emits:
//! - **Substitution**: a direct rewrite of a pattern into a replacement.
//! - **Chaining**: a contextual match that invokes nested routines at
//!   individual pattern positions.

use serde::{Deserialize, Serialize};

use crate::types::{GlyphSet, RoutineId};

// ── Substitution ─────────────────────────────────────────────────────

/// A direct rewrite: `input` is consumed and `replacement` is emitted.
///
/// An empty replacement deletes the matched glyphs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub input: Vec<GlyphSet>,
    pub replacement: Vec<GlyphSet>,
}

impl Substitution {
    pub fn new(input: Vec<GlyphSet>, replacement: Vec<GlyphSet>) -> Self {
        Self { input, replacement }
    }

    /// Delete every glyph in `set`.
    pub fn deletion(set: GlyphSet) -> Self {
        Self {
            input: vec![set],
            replacement: vec![],
        }
    }

    pub fn is_deletion(&self) -> bool {
        self.replacement.is_empty()
    }

    /// Expand a single-position rewrite into one concrete rewrite per input glyph.
    ///
    /// Replacement sets as large as the input set follow the input glyph
    /// position by position; singleton sets are copied as they are. Any other
    /// replacement set has no per-glyph meaning and yields `None`.
    pub fn expand(&self) -> Option<Vec<(String, Vec<String>)>> {
        let [input] = self.input.as_slice() else {
            return None;
        };
        let mut out = Vec::with_capacity(input.len());
        for (i, glyph) in input.iter().enumerate() {
            let mut replacement = Vec::with_capacity(self.replacement.len());
            for set in &self.replacement {
                let chosen = if set.len() == input.len() {
                    set.get(i)
                } else if set.len() == 1 {
                    set.get(0)
                } else {
                    None
                };
                replacement.push(chosen?.to_string());
            }
            out.push((glyph.clone(), replacement));
        }
        Some(out)
    }
}

// ── Chaining ─────────────────────────────────────────────────────────

/// A contextual rule.
///
/// `precontext` and `postcontext` must match but are not consumed. For each
/// position of `input`, `lookups` holds the routines to invoke there, in
/// order; an empty list passes the glyph through unchanged. A rule whose
/// positions invoke nothing acts as an exception that stops later rules of
/// the same routine from matching.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chaining {
    pub precontext: Vec<GlyphSet>,
    pub input: Vec<GlyphSet>,
    pub postcontext: Vec<GlyphSet>,
    pub lookups: Vec<Vec<RoutineId>>,
}

impl Chaining {
    /// A chaining rule without context. `lookups` must be as long as `input`.
    pub fn new(input: Vec<GlyphSet>, lookups: Vec<Vec<RoutineId>>) -> Self {
        Self {
            precontext: vec![],
            input,
            postcontext: vec![],
            lookups,
        }
    }

    /// A rule that matches `input` and invokes nothing.
    pub fn pass_through(input: Vec<GlyphSet>) -> Self {
        let lookups = vec![vec![]; input.len()];
        Self::new(input, lookups)
    }

    pub fn with_precontext(mut self, precontext: Vec<GlyphSet>) -> Self {
        self.precontext = precontext;
        self
    }

    pub fn with_postcontext(mut self, postcontext: Vec<GlyphSet>) -> Self {
        self.postcontext = postcontext;
        self
    }

    /// Whether no position invokes a routine.
    pub fn is_exception(&self) -> bool {
        self.lookups.iter().all(Vec::is_empty)
    }

    /// All routines referenced by this rule, in position order.
    pub fn referenced(&self) -> impl Iterator<Item = RoutineId> + '_ {
        self.lookups.iter().flatten().copied()
    }
}

// ── Rule ─────────────────────────────────────────────────────────────

/// A rule inside a routine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    Substitution(Substitution),
    Chaining(Chaining),
}

impl Rule {
    /// Routines this rule invokes.
    pub fn referenced(&self) -> Vec<RoutineId> {
        match self {
            Self::Substitution(_) => vec![],
            Self::Chaining(c) => c.referenced().collect(),
        }
    }

    /// Every glyph set the rule mentions, for well-formedness checks.
    pub fn glyph_sets(&self) -> Vec<&GlyphSet> {
        match self {
            Self::Substitution(s) => s.input.iter().chain(s.replacement.iter()).collect(),
            Self::Chaining(c) => c
                .precontext
                .iter()
                .chain(c.input.iter())
                .chain(c.postcontext.iter())
                .collect(),
        }
    }
}

impl From<Substitution> for Rule {
    fn from(s: Substitution) -> Self {
        Self::Substitution(s)
    }
}

impl From<Chaining> for Rule {
    fn from(c: Chaining) -> Self {
        Self::Chaining(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> GlyphSet {
        names.iter().copied().collect()
    }

    #[test]
    fn expand_follows_input_positionally() {
        let sub = Substitution::new(
            vec![set(&["a", "b"])],
            vec![GlyphSet::single("_start"), set(&["a", "b"])],
        );
        let expanded = sub.expand().unwrap();
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0], ("a".into(), vec!["_start".into(), "a".into()]));
        assert_eq!(expanded[1], ("b".into(), vec!["_start".into(), "b".into()]));
    }

    #[test]
    fn expand_rejects_mismatched_replacement() {
        let sub = Substitution::new(vec![set(&["a", "b", "c"])], vec![set(&["x", "y"])]);
        assert!(sub.expand().is_none());
    }

    #[test]
    fn expand_deletion() {
        let sub = Substitution::deletion(set(&["_carry.e1", "_carry.e2"]));
        let expanded = sub.expand().unwrap();
        assert!(expanded.iter().all(|(_, r)| r.is_empty()));
        assert!(sub.is_deletion());
    }

    #[test]
    fn pass_through_is_exception() {
        let rule = Chaining::pass_through(vec![set(&["a"]), set(&["b"])]);
        assert!(rule.is_exception());
        assert_eq!(rule.lookups.len(), 2);
    }

    #[test]
    fn referenced_routines_in_order() {
        let rule = Chaining::new(
            vec![set(&["a"]), set(&["b"])],
            vec![vec![RoutineId(3)], vec![RoutineId(1), RoutineId(2)]],
        );
        let refs: Vec<_> = rule.referenced().collect();
        assert_eq!(refs, vec![RoutineId(3), RoutineId(1), RoutineId(2)]);
        assert!(!rule.is_exception());
    }
}
