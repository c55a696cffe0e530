//! The feature graph: routines, glyph categories, and features.
//!
//! A [`Program`] is the ordered routine list of one feature; the order is the
//! order in which the shaping engine runs the routines. The graph is built
//! once and handed to a serializer; nothing mutates it afterwards.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::{IrError, IrResult};
use crate::routine::{Routine, RoutineArena};
use crate::types::{GlyphCategory, RoutineId};

// ── Program ──────────────────────────────────────────────────────────

/// The ordered routine list of one named feature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Program {
    /// OpenType feature tag, e.g. `rlig`.
    pub tag: String,
    pub routines: Vec<RoutineId>,
}

impl Program {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            routines: Vec::new(),
        }
    }

    pub fn push(&mut self, id: RoutineId) {
        self.routines.push(id);
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = RoutineId>) {
        self.routines.extend(ids);
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

// ── Feature Graph ────────────────────────────────────────────────────

/// Everything the serializer needs: routines, GDEF categories, features.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FeatureGraph {
    pub arena: RoutineArena,
    /// GDEF category per glyph, for glyphs the compiler classifies.
    pub categories: BTreeMap<String, GlyphCategory>,
    pub features: Vec<Program>,
}

impl FeatureGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_routine(&mut self, routine: Routine) -> IrResult<RoutineId> {
        self.arena.add(routine)
    }

    pub fn routine(&self, id: RoutineId) -> IrResult<&Routine> {
        self.arena.get(id)
    }

    pub fn set_category(&mut self, glyph: impl Into<String>, category: GlyphCategory) {
        self.categories.insert(glyph.into(), category);
    }

    pub fn add_feature(&mut self, program: Program) {
        self.features.push(program);
    }

    pub fn feature(&self, tag: &str) -> Option<&Program> {
        self.features.iter().find(|p| p.tag == tag)
    }

    /// Glyphs of one category, sorted by name.
    pub fn glyphs_in(&self, category: GlyphCategory) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|(_, c)| **c == category)
            .map(|(g, _)| g.as_str())
            .collect()
    }

    /// Routines reachable from every feature, callees before callers.
    ///
    /// Fails on unknown handles and on reference cycles, which no shaping
    /// engine can execute.
    pub fn dependency_order(&self) -> IrResult<Vec<RoutineId>> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut on_path = HashSet::new();
        for program in &self.features {
            for &id in &program.routines {
                self.visit(id, &mut done, &mut on_path, &mut order)?;
            }
        }
        Ok(order)
    }

    fn visit(
        &self,
        id: RoutineId,
        done: &mut HashSet<RoutineId>,
        on_path: &mut HashSet<RoutineId>,
        order: &mut Vec<RoutineId>,
    ) -> IrResult<()> {
        if done.contains(&id) {
            return Ok(());
        }
        let routine = self.arena.get(id)?;
        if !on_path.insert(id) {
            return Err(IrError::LimitExceeded {
                key: routine.name.clone(),
                detail: "routine invokes itself through a reference cycle".into(),
            });
        }
        for child in routine.children() {
            self.visit(child, done, on_path, order)?;
        }
        on_path.remove(&id);
        done.insert(id);
        order.push(id);
        Ok(())
    }

    /// Longest chain of nested routine invocations starting at `id`
    /// (a routine that invokes nothing has depth 1).
    pub fn nesting_depth(&self, id: RoutineId) -> IrResult<usize> {
        let mut memo = BTreeMap::new();
        self.depth_of(id, &mut memo, 0)
    }

    fn depth_of(
        &self,
        id: RoutineId,
        memo: &mut BTreeMap<RoutineId, usize>,
        guard: usize,
    ) -> IrResult<usize> {
        if let Some(&d) = memo.get(&id) {
            return Ok(d);
        }
        let routine = self.arena.get(id)?;
        if guard > self.arena.len() {
            return Err(IrError::LimitExceeded {
                key: routine.name.clone(),
                detail: "routine invokes itself through a reference cycle".into(),
            });
        }
        let mut deepest = 0;
        for child in routine.children() {
            deepest = deepest.max(self.depth_of(child, memo, guard + 1)?);
        }
        memo.insert(id, deepest + 1);
        Ok(deepest + 1)
    }
}
