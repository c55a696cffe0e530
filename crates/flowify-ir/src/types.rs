//! Core types for the rule graph.
//!
//! Defines glyph sets, GDEF glyph categories, lookup flags, and the
//! arena handle used to share routines between call sites.

use serde::{Deserialize, Serialize};

// ── Routine Handle ───────────────────────────────────────────────────

/// Stable handle to a routine stored in a [`RoutineArena`](crate::RoutineArena).
///
/// Two call sites that hold the same `RoutineId` reference the same routine;
/// routines are never copied when shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoutineId(pub u32);

impl RoutineId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for RoutineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "routine#{}", self.0)
    }
}

// ── Glyph Set ────────────────────────────────────────────────────────

/// An ordered, duplicate-free set of glyph names.
///
/// Order is significant: a direct rewrite maps an input set onto a
/// replacement set of the same size position by position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlyphSet {
    glyphs: Vec<String>,
}

impl GlyphSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding exactly one glyph.
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            glyphs: vec![name.into()],
        }
    }

    /// Insert a glyph, keeping first-seen order. Returns false if it was present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.glyphs.push(name);
        true
    }

    /// Merge another set into this one.
    pub fn extend_from(&mut self, other: &GlyphSet) {
        for g in &other.glyphs {
            self.insert(g.clone());
        }
    }

    pub fn union(&self, other: &GlyphSet) -> GlyphSet {
        let mut out = self.clone();
        out.extend_from(other);
        out
    }

    pub fn contains(&self, name: &str) -> bool {
        self.glyphs.iter().any(|g| g == name)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.glyphs.iter()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.glyphs.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.glyphs
    }

    /// A new set with every glyph name passed through `f`, order preserved.
    pub fn map_names(&self, f: impl Fn(&str) -> String) -> GlyphSet {
        self.glyphs.iter().map(|g| f(g)).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for GlyphSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = GlyphSet::new();
        for g in iter {
            set.insert(g);
        }
        set
    }
}

impl<'a> IntoIterator for &'a GlyphSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.glyphs.iter()
    }
}

impl std::fmt::Display for GlyphSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.glyphs.len() == 1 {
            return write!(f, "{}", self.glyphs[0]);
        }
        write!(f, "[{}]", self.glyphs.join(" "))
    }
}

// ── Glyph Category ───────────────────────────────────────────────────

/// GDEF glyph class of a glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphCategory {
    Base,
    Ligature,
    Mark,
    Component,
}

impl std::fmt::Display for GlyphCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Ligature => write!(f, "ligature"),
            Self::Mark => write!(f, "mark"),
            Self::Component => write!(f, "component"),
        }
    }
}

impl std::str::FromStr for GlyphCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Self::Base),
            "ligature" => Ok(Self::Ligature),
            "mark" => Ok(Self::Mark),
            "component" => Ok(Self::Component),
            other => Err(format!("unknown glyph category '{}'", other)),
        }
    }
}

// ── Lookup Flags ─────────────────────────────────────────────────────

/// OpenType lookup flags relevant to generated routines.
///
/// `UseMarkFilteringSet` is not stored here: it is implied by a routine
/// carrying a mark-filtering set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupFlags(pub u16);

impl LookupFlags {
    pub const NONE: LookupFlags = LookupFlags(0);
    pub const IGNORE_MARKS: LookupFlags = LookupFlags(0x0008);

    pub fn ignore_marks(self) -> bool {
        self.0 & Self::IGNORE_MARKS.0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_set_dedups_and_keeps_order() {
        let mut set = GlyphSet::new();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert_eq!(set.as_slice(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn glyph_set_union_appends_new_members() {
        let left: GlyphSet = ["a", "b"].into_iter().collect();
        let right: GlyphSet = ["b", "c"].into_iter().collect();
        let merged = left.union(&right);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(2), Some("c"));
    }

    #[test]
    fn glyph_set_display() {
        assert_eq!(GlyphSet::single("_end").to_string(), "_end");
        let set: GlyphSet = ["a", "b"].into_iter().collect();
        assert_eq!(set.to_string(), "[a b]");
    }

    #[test]
    fn map_names_preserves_positions() {
        let set: GlyphSet = ["_w.1e0", "_w.2e0"].into_iter().collect();
        let upper = set.map_names(|g| g.to_uppercase());
        assert_eq!(upper.get(0), Some("_W.1E0"));
        assert_eq!(upper.get(1), Some("_W.2E0"));
    }

    #[test]
    fn category_parses() {
        assert_eq!("mark".parse::<GlyphCategory>().unwrap(), GlyphCategory::Mark);
        assert!("accent".parse::<GlyphCategory>().is_err());
    }

    #[test]
    fn lookup_flags() {
        assert!(LookupFlags::IGNORE_MARKS.ignore_marks());
        assert!(!LookupFlags::NONE.ignore_marks());
    }
}
