//! Routines and the arena that owns them.
//!
//! A routine is a named, ordered list of rules (first match wins at each
//! position). Routines live in a [`RoutineArena`] and are referenced by
//! [`RoutineId`], so a routine invoked from many chaining rules exists once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::rules::Rule;
use crate::types::{GlyphSet, LookupFlags, RoutineId};

// ── Routine ──────────────────────────────────────────────────────────

/// A named, ordered list of rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub name: String,
    pub flags: LookupFlags,
    /// Marks outside this set are skipped during matching.
    pub mark_filtering_set: Option<GlyphSet>,
    pub rules: Vec<Rule>,
}

impl Routine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: LookupFlags::NONE,
            mark_filtering_set: None,
            rules: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: LookupFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_mark_filtering_set(mut self, set: GlyphSet) -> Self {
        self.mark_filtering_set = Some(set);
        self
    }

    pub fn with_rule(mut self, rule: impl Into<Rule>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn push_rule(&mut self, rule: impl Into<Rule>) {
        self.rules.push(rule.into());
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Distinct routines invoked by this routine's rules, first-seen order.
    pub fn children(&self) -> Vec<RoutineId> {
        let mut out = Vec::new();
        for id in self.rules.iter().flat_map(Rule::referenced) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

// ── Routine Arena ────────────────────────────────────────────────────

/// Owns every routine of a compilation. Names are unique.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RoutineArena {
    routines: Vec<Routine>,
    #[serde(skip)]
    by_name: HashMap<String, RoutineId>,
}

impl RoutineArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a routine and return its handle.
    pub fn add(&mut self, routine: Routine) -> IrResult<RoutineId> {
        if self.by_name.contains_key(&routine.name) {
            return Err(IrError::DuplicateRoutine(routine.name));
        }
        let index = u32::try_from(self.routines.len()).map_err(|_| IrError::LimitExceeded {
            key: routine.name.clone(),
            detail: "routine arena is full".into(),
        })?;
        let id = RoutineId(index);
        self.by_name.insert(routine.name.clone(), id);
        self.routines.push(routine);
        Ok(id)
    }

    pub fn get(&self, id: RoutineId) -> IrResult<&Routine> {
        self.routines
            .get(id.index())
            .ok_or_else(|| IrError::UnknownRoutine(id.to_string()))
    }

    /// Mutable access while the graph is still under construction.
    pub fn get_mut(&mut self, id: RoutineId) -> IrResult<&mut Routine> {
        self.routines
            .get_mut(id.index())
            .ok_or_else(|| IrError::UnknownRoutine(id.to_string()))
    }

    pub fn contains(&self, id: RoutineId) -> bool {
        id.index() < self.routines.len()
    }

    pub fn named(&self, name: &str) -> Option<RoutineId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Every routine with its handle, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (RoutineId, &Routine)> {
        self.routines
            .iter()
            .enumerate()
            .map(|(i, r)| (RoutineId(i as u32), r))
    }
}
