//! Ripple-carry adder built from substitution routines.
//!
//! Addition happens one digit place at a time. Inside a place, every digit
//! adds its value into the next digit of the same place, so a stream of
//! encoded widths collapses into running totals from left to right:
//!
//! ```text
//!   place 0:   _w.2e0 ... _w.3e0 ...      add_2 applied to _w.3e0
//!          ->  _w.2e0 ... _w.1e0 _carry.e1 ...
//!   place 1:   ... _w.0e1 ... _carry.e1 _w.1e1 ...   add_16_c applied
//! ```
//!
//! Carries emitted at place `e` are consumed by the pass over place `e + 1`,
//! which is why the full adder runs the places in ascending order.

use std::collections::HashMap;

use tracing::debug;

use flowify_ir::{Chaining, FeatureGraph, GlyphSet, Routine, RoutineId, Substitution};

use crate::alphabet::{Alphabet, END, START};
use crate::error::{FlowError, FlowResult};

/// Builds adder routines, reusing one routine per key.
#[derive(Debug)]
pub struct AdderCompiler<'a> {
    alphabet: &'a Alphabet,
    /// `(exponent, addend)` to the routine adding `addend` at that place.
    add_routines: HashMap<(u32, u32), RoutineId>,
    /// `exponent` to the routine that adds neighbouring digits of that place.
    place_adders: HashMap<u32, RoutineId>,
}

impl<'a> AdderCompiler<'a> {
    pub fn new(alphabet: &'a Alphabet) -> Self {
        Self {
            alphabet,
            add_routines: HashMap::new(),
            place_adders: HashMap::new(),
        }
    }

    /// The routine adding `addend` to a digit at `exponent`.
    ///
    /// `addend == BASE` applies an incoming carry to a digit that is itself
    /// being incremented by `BASE - 1`. A sum reaching `BASE` wraps and emits
    /// the carry for the next place, except at the top place where it is
    /// dropped.
    pub fn add_routine(
        &mut self,
        graph: &mut FeatureGraph,
        exponent: u32,
        addend: u32,
    ) -> FlowResult<RoutineId> {
        let radix = *self.alphabet.radix();
        if exponent >= radix.places() || addend == 0 || addend > radix.base() {
            return Err(FlowError::Configuration(format!(
                "no adder for addend {} at place {}",
                addend, exponent
            )));
        }
        if let Some(id) = self.add_routines.get(&(exponent, addend)) {
            return Ok(*id);
        }

        let base = radix.base();
        let mut name = format!("add_{}", i64::from(addend) * radix.place_value(exponent));
        if addend == base {
            name.push_str("_c");
        }
        let mut routine = Routine::new(name);
        for before in 0..base {
            let after = before + addend;
            let digit = self.alphabet.digit(after % base, exponent);
            let mut replacement = vec![GlyphSet::single(digit)];
            if after >= base {
                if let Some(carry) = self.alphabet.carry(exponent + 1) {
                    replacement.push(GlyphSet::single(carry));
                }
            }
            routine.push_rule(Substitution::new(
                vec![GlyphSet::single(self.alphabet.digit(before, exponent))],
                replacement,
            ));
        }
        let id = graph.add_routine(routine)?;
        self.add_routines.insert((exponent, addend), id);
        Ok(id)
    }

    /// The routine that adds each digit at `exponent` into the next one.
    ///
    /// Marks other than this place's digits, its incoming carry, and the run
    /// boundaries are filtered out, so consecutive digits of the place look
    /// adjacent. Rules consuming a pending carry come first.
    pub fn place_adder(
        &mut self,
        graph: &mut FeatureGraph,
        exponent: u32,
    ) -> FlowResult<RoutineId> {
        if let Some(id) = self.place_adders.get(&exponent) {
            return Ok(*id);
        }
        let base = self.alphabet.radix().base();
        let place = self.alphabet.place(exponent).clone();

        let mut filter: GlyphSet = [START, END].into_iter().collect();
        let carry = self.alphabet.carry(exponent);
        if let Some(carry) = &carry {
            filter.insert(carry.clone());
        }
        filter.extend_from(&place);

        let mut routine =
            Routine::new(format!("adder_place_{}", exponent)).with_mark_filtering_set(filter);

        if let Some(carry) = &carry {
            for value in 0..base {
                let add = self.add_routine(graph, exponent, value + 1)?;
                routine.push_rule(Chaining::new(
                    vec![
                        GlyphSet::single(self.alphabet.digit(value, exponent)),
                        GlyphSet::single(carry.clone()),
                        place.clone(),
                    ],
                    vec![vec![], vec![], vec![add]],
                ));
            }
        }
        for value in 1..base {
            let add = self.add_routine(graph, exponent, value)?;
            routine.push_rule(Chaining::new(
                vec![GlyphSet::single(self.alphabet.digit(value, exponent)), place.clone()],
                vec![vec![], vec![add]],
            ));
        }

        let id = graph.add_routine(routine)?;
        self.place_adders.insert(exponent, id);
        Ok(id)
    }

    /// One summation pass: a wrapper per place invoking the shared place
    /// adder on every digit of that place, places in ascending order.
    ///
    /// Each generation gets its own wrappers (`adder{e}_{generation}`); the
    /// place adders and add routines underneath are shared.
    pub fn full_adder(
        &mut self,
        graph: &mut FeatureGraph,
        generation: u32,
    ) -> FlowResult<Vec<RoutineId>> {
        let places = self.alphabet.radix().places();
        let mut wrappers = Vec::with_capacity(places as usize);
        for exponent in 0..places {
            let place_adder = self.place_adder(graph, exponent)?;
            let mut wrapper = Routine::new(format!("adder{}_{}", exponent, generation));
            if exponent > 0 {
                wrapper =
                    wrapper.with_mark_filtering_set(self.alphabet.calculation_glyphs().clone());
            }
            wrapper.push_rule(Chaining::new(
                vec![self.alphabet.place(exponent).clone()],
                vec![vec![place_adder]],
            ));
            wrappers.push(graph.add_routine(wrapper)?);
        }
        debug!(
            generation,
            add_routines = self.add_routines.len(),
            place_adders = self.place_adders.len(),
            "Built full adder"
        );
        Ok(wrappers)
    }

    /// Number of distinct add routines built so far.
    pub fn add_routine_count(&self) -> usize {
        self.add_routines.len()
    }
}
