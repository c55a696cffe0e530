//! Kerning as injected widths.
//!
//! A kerning pair `A V -> -10` becomes `sub A' lookup kern_minus10 V;`,
//! where `kern_minus10` appends `encode(-10)` after `A`. The adder then sums
//! the injected value with everything else in the run; negative values work
//! because their complement rolls the total over.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use flowify_ir::{Chaining, FeatureGraph, GlyphSet, Routine, RoutineId, Rule, Substitution};

use crate::alphabet::Alphabet;
use crate::error::{FlowError, FlowResult};
use crate::font::HostFont;

/// A kerning pair with both sides resolved to in-scope glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPair {
    pub left: GlyphSet,
    pub right: GlyphSet,
    pub value: i64,
}

/// Resolve the host's kerning table against the in-scope glyphs.
///
/// Group names expand to their members. Members that are not in scope are
/// dropped; references to glyphs the font does not have are logged. Pairs
/// left with an empty side, and pairs with a zero value, are skipped.
pub fn resolve_pairs(font: &(impl HostFont + ?Sized), relevant: &GlyphSet) -> Vec<ResolvedPair> {
    let mut pairs = Vec::new();
    for pair in font.kerning() {
        if pair.value == 0 {
            continue;
        }
        let left = resolve_side(font, &pair.left, relevant);
        let right = resolve_side(font, &pair.right, relevant);
        if left.is_empty() || right.is_empty() {
            debug!(
                left = %pair.left,
                right = %pair.right,
                "Skipping kerning pair with no in-scope glyphs"
            );
            continue;
        }
        pairs.push(ResolvedPair {
            left,
            right,
            value: pair.value,
        });
    }
    pairs
}

fn resolve_side(font: &(impl HostFont + ?Sized), name: &str, relevant: &GlyphSet) -> GlyphSet {
    let members = font.group(name).unwrap_or_else(|| vec![name.to_string()]);
    members
        .into_iter()
        .filter(|glyph| {
            if font.advance_width(glyph).is_none() {
                warn!(glyph = %glyph, kerning = %name, "Kerning references an unknown glyph");
                return false;
            }
            font.is_exported(glyph) && relevant.contains(glyph)
        })
        .collect()
}

/// Builds kerning routines, sharing one injection routine per value.
#[derive(Debug)]
pub struct KerningInjector<'a> {
    alphabet: &'a Alphabet,
    max_rules: usize,
    injections: BTreeMap<i64, RoutineId>,
}

impl<'a> KerningInjector<'a> {
    pub fn new(alphabet: &'a Alphabet, max_rules: usize) -> FlowResult<Self> {
        if max_rules == 0 {
            return Err(FlowError::Configuration(
                "kerning rule cap must be at least 1".into(),
            ));
        }
        Ok(Self {
            alphabet,
            max_rules,
            injections: BTreeMap::new(),
        })
    }

    /// The routine appending `encode(value)` after any glyph of `left`.
    ///
    /// The first request for a value builds the routine; later requests widen
    /// its coverage to include `left`.
    pub fn injection_for(
        &mut self,
        graph: &mut FeatureGraph,
        left: &GlyphSet,
        value: i64,
    ) -> FlowResult<RoutineId> {
        let encoded = self.alphabet.encode(value)?;
        let id = match self.injections.get(&value) {
            Some(id) => *id,
            None => {
                let name = format!("kern_{}", value.to_string().replace('-', "minus"));
                let mut replacement = vec![GlyphSet::new()];
                replacement.extend(encoded);
                let routine = Routine::new(name)
                    .with_rule(Substitution::new(vec![GlyphSet::new()], replacement));
                let id = graph.add_routine(routine)?;
                self.injections.insert(value, id);
                id
            }
        };

        let routine = graph.arena.get_mut(id)?;
        if let Some(Rule::Substitution(sub)) = routine.rules.first_mut() {
            let covered = sub.input[0].union(left);
            sub.input[0] = covered.clone();
            sub.replacement[0] = covered;
        }
        Ok(id)
    }

    /// Turn resolved pairs into chaining routines of at most `max_rules`
    /// rules each, named `slug_kerning_{n}` in order.
    pub fn build(
        &mut self,
        graph: &mut FeatureGraph,
        pairs: &[ResolvedPair],
    ) -> FlowResult<Vec<RoutineId>> {
        let mut routines: Vec<Routine> = Vec::new();
        for pair in pairs {
            let inject = self.injection_for(graph, &pair.left, pair.value)?;
            let needs_new = routines
                .last()
                .map_or(true, |r| r.rule_count() >= self.max_rules);
            if needs_new {
                routines.push(Routine::new(format!("slug_kerning_{}", routines.len())));
            }
            if let Some(current) = routines.last_mut() {
                current.push_rule(
                    Chaining::new(vec![pair.left.clone()], vec![vec![inject]])
                        .with_postcontext(vec![pair.right.clone()]),
                );
            }
        }

        let ids = routines
            .into_iter()
            .map(|r| graph.add_routine(r))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            pairs = pairs.len(),
            routines = ids.len(),
            injections = self.injections.len(),
            "Built kerning routines"
        );
        Ok(ids)
    }

    /// Number of distinct injected values.
    pub fn injection_count(&self) -> usize {
        self.injections.len()
    }
}
