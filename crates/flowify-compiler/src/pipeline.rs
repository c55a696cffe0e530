//! Assembles every generated routine into one ordered program.
//!
//! ```text
//!  strip marks ─► mark boundaries ─► kerning ─► encode ─► sum (gen 1)
//!       ┌────────────────────────────────────────────────────┘
//!       ▼  pill only
//!  tidy ─► compare (end cap, start cap, blank) ─► sum (gen 2)
//!       ▼
//!  delete carries ─► record result ─► delete rubbish
//! ```
//!
//! Each stage only sees the output of the previous one; the engine runs
//! the program's routines in order.

use tracing::debug;

use flowify_ir::{
    Chaining, FeatureGraph, GlyphSet, LookupFlags, Program, Routine, RoutineId, Substitution,
};

use crate::adder::AdderCompiler;
use crate::alphabet::{Alphabet, END, SLUG_LEFT, SLUG_RIGHT, START};
use crate::comparator::Comparator;
use crate::config::SlugShape;
use crate::error::FlowResult;
use crate::kerning::{KerningInjector, ResolvedPair};

// ── Stage ────────────────────────────────────────────────────────────

/// A step of the assembled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    StripMarks,
    MarkBoundaries,
    InjectKerning,
    Encode,
    Sum { generation: u32 },
    Tidy,
    Compare,
    DeleteCarries,
    RecordResult,
    DeleteRubbish,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StripMarks => write!(f, "strip-marks"),
            Self::MarkBoundaries => write!(f, "mark-boundaries"),
            Self::InjectKerning => write!(f, "inject-kerning"),
            Self::Encode => write!(f, "encode"),
            Self::Sum { generation } => write!(f, "sum-{}", generation),
            Self::Tidy => write!(f, "tidy"),
            Self::Compare => write!(f, "compare"),
            Self::DeleteCarries => write!(f, "delete-carries"),
            Self::RecordResult => write!(f, "record-result"),
            Self::DeleteRubbish => write!(f, "delete-rubbish"),
        }
    }
}

// ── Inputs & Output ──────────────────────────────────────────────────

/// Host-derived data the program is written against.
#[derive(Debug, Clone, Default)]
pub struct RunScope {
    /// In-scope glyphs with their advance widths, in glyph order.
    pub relevant: Vec<(String, i64)>,
    /// Host marks and zero-width glyphs to strip up front.
    pub marks: GlyphSet,
    pub kerning: Vec<ResolvedPair>,
}

impl RunScope {
    pub fn relevant_set(&self) -> GlyphSet {
        self.relevant.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// The assembled program, with the routines each stage contributed.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub program: Program,
    pub stages: Vec<(Stage, Vec<RoutineId>)>,
}

impl Assembly {
    pub fn stage(&self, stage: Stage) -> Option<&[RoutineId]> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, ids)| ids.as_slice())
    }
}

// ── Assembler ────────────────────────────────────────────────────────

/// Orders all routines of one compilation.
#[derive(Debug)]
pub struct PipelineAssembler<'a> {
    alphabet: &'a Alphabet,
    threshold: i64,
    shape: SlugShape,
    blank: bool,
    max_kern_rules: usize,
}

impl<'a> PipelineAssembler<'a> {
    pub fn new(alphabet: &'a Alphabet, threshold: i64) -> Self {
        Self {
            alphabet,
            threshold,
            shape: SlugShape::Pill,
            blank: true,
            max_kern_rules: 20,
        }
    }

    pub fn with_shape(mut self, shape: SlugShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_blanking(mut self, blank: bool) -> Self {
        self.blank = blank;
        self
    }

    pub fn with_max_kern_rules(mut self, max_kern_rules: usize) -> Self {
        self.max_kern_rules = max_kern_rules;
        self
    }

    /// Build every routine into `graph` and return the ordered program.
    pub fn assemble(
        &self,
        graph: &mut FeatureGraph,
        scope: &RunScope,
        tag: &str,
    ) -> FlowResult<Assembly> {
        let alphabet = self.alphabet;
        let relevant = scope.relevant_set();
        let mut adder = AdderCompiler::new(alphabet);
        let mut stages: Vec<(Stage, Vec<RoutineId>)> = Vec::new();

        if !scope.marks.is_empty() {
            let strip = graph.add_routine(
                Routine::new("delete_marks").with_rule(Substitution::deletion(scope.marks.clone())),
            )?;
            stages.push((Stage::StripMarks, vec![strip]));
        }

        stages.push((Stage::MarkBoundaries, self.boundaries(graph, &relevant)?));

        let mut injector = KerningInjector::new(alphabet, self.max_kern_rules)?;
        let kerning = injector.build(graph, &scope.kerning)?;
        if !kerning.is_empty() {
            stages.push((Stage::InjectKerning, kerning));
        }

        let mut encode = Routine::new("encode");
        for (glyph, width) in &scope.relevant {
            encode.push_rule(Substitution::new(
                vec![GlyphSet::single(glyph.clone())],
                alphabet.encode(*width)?,
            ));
        }
        stages.push((Stage::Encode, vec![graph.add_routine(encode)?]));

        stages.push((Stage::Sum { generation: 1 }, adder.full_adder(graph, 1)?));

        let working = alphabet.calculation_glyphs().union(alphabet.carries());
        let delete = graph.add_routine(
            Routine::new("delete").with_rule(Substitution::deletion(working.clone())),
        )?;

        if self.shape == SlugShape::Pill {
            stages.push((Stage::Tidy, vec![self.tidy(graph, &working, delete)?]));
            stages.push((Stage::Compare, self.compare(graph)?));
            stages.push((Stage::Sum { generation: 2 }, adder.full_adder(graph, 2)?));
        }

        if !alphabet.carries().is_empty() {
            let delete_carries = graph.add_routine(
                Routine::new("delete_carries")
                    .with_rule(Substitution::deletion(alphabet.carries().clone())),
            )?;
            stages.push((Stage::DeleteCarries, vec![delete_carries]));
        }

        stages.push((Stage::RecordResult, vec![self.record_result(graph, &working, delete)?]));

        let rubbish: GlyphSet = [START, END].into_iter().collect();
        let delete_rubbish = graph.add_routine(
            Routine::new("delete_rubbish").with_rule(Substitution::deletion(rubbish)),
        )?;
        stages.push((Stage::DeleteRubbish, vec![delete_rubbish]));

        let mut program = Program::new(tag);
        for (stage, ids) in &stages {
            debug!(stage = %stage, routines = ids.len(), "Assembled stage");
            program.extend(ids.iter().copied());
        }
        Ok(Assembly { program, stages })
    }

    /// `_start` before the first glyph of every run; a zero total and `_end`
    /// after the last.
    fn boundaries(
        &self,
        graph: &mut FeatureGraph,
        relevant: &GlyphSet,
    ) -> FlowResult<Vec<RoutineId>> {
        let do_add_start = graph.add_routine(Routine::new("do_add_start").with_rule(
            Substitution::new(
                vec![relevant.clone()],
                vec![GlyphSet::single(START), relevant.clone()],
            ),
        ))?;
        let add_start = graph.add_routine(
            Routine::new("add_start")
                .with_flags(LookupFlags::IGNORE_MARKS)
                .with_rule(
                    Chaining::pass_through(vec![relevant.clone()])
                        .with_precontext(vec![relevant.clone()]),
                )
                .with_rule(Chaining::new(vec![relevant.clone()], vec![vec![do_add_start]])),
        )?;

        let mut end_replacement = vec![relevant.clone()];
        end_replacement.extend(self.alphabet.encode(0)?);
        end_replacement.push(GlyphSet::single(END));
        let do_add_end = graph.add_routine(
            Routine::new("do_add_end")
                .with_rule(Substitution::new(vec![relevant.clone()], end_replacement)),
        )?;
        let add_end = graph.add_routine(
            Routine::new("add_end")
                .with_flags(LookupFlags::IGNORE_MARKS)
                .with_rule(
                    Chaining::pass_through(vec![relevant.clone()])
                        .with_postcontext(vec![relevant.clone()]),
                )
                .with_rule(Chaining::new(vec![relevant.clone()], vec![vec![do_add_end]])),
        )?;
        Ok(vec![add_start, add_end])
    }

    /// Keep only the final total before `_end`, deleting the partial sums.
    fn tidy(
        &self,
        graph: &mut FeatureGraph,
        working: &GlyphSet,
        delete: RoutineId,
    ) -> FlowResult<RoutineId> {
        let mut filter = self.alphabet.calculation_glyphs().clone();
        filter.insert(END);
        filter.extend_from(self.alphabet.carries());
        let id = graph.add_routine(
            Routine::new("tidy_result")
                .with_mark_filtering_set(filter)
                .with_rule(
                    Chaining::pass_through(self.alphabet.places().to_vec())
                        .with_postcontext(vec![GlyphSet::single(END)]),
                )
                .with_rule(Chaining::new(vec![working.clone()], vec![vec![delete]])),
        )?;
        Ok(id)
    }

    /// Cap runs longer than the threshold, blank the others.
    ///
    /// The end cap goes in first, together with `encode(-H)` so the second
    /// summation takes the caps' combined width back off. Inserting the start
    /// cap first would shift the run and push `_end` out of the pattern.
    fn compare(&self, graph: &mut FeatureGraph) -> FlowResult<Vec<RoutineId>> {
        let alphabet = self.alphabet;
        let comparator = Comparator::new(alphabet, self.threshold)?;
        let places = alphabet.radix().places() as usize;

        let mut end_replacement = alphabet.encode(-self.threshold)?;
        end_replacement.push(GlyphSet::single(END));
        end_replacement.push(GlyphSet::single(SLUG_RIGHT));
        let insert_end = graph.add_routine(
            Routine::new("insert_negative_and_end_slug")
                .with_rule(Substitution::new(vec![GlyphSet::single(END)], end_replacement)),
        )?;
        let insert_start = graph.add_routine(Routine::new("insert_start_slug").with_rule(
            Substitution::new(
                vec![GlyphSet::single(START)],
                vec![GlyphSet::single(SLUG_LEFT), GlyphSet::single(START)],
            ),
        ))?;

        let mut compare1 = Routine::new("compare1");
        let mut compare2 = Routine::new("compare2");
        for pattern in comparator.patterns() {
            let mut input = vec![GlyphSet::single(START)];
            input.extend(pattern.iter().cloned());
            input.push(GlyphSet::single(END));
            let mut lookups = vec![vec![]; places + 1];
            lookups.push(vec![insert_end]);
            compare1.push_rule(Chaining::new(input, lookups));

            let mut input = vec![GlyphSet::single(START)];
            input.extend(pattern.iter().cloned());
            let mut lookups = vec![vec![insert_start]];
            lookups.extend(std::iter::repeat(vec![]).take(places));
            compare2.push_rule(Chaining::new(input, lookups));
        }

        if self.blank {
            let do_blank = graph.add_routine(Routine::new("do_blank").with_rule(Substitution::new(
                vec![alphabet.calculation_glyphs().clone()],
                vec![alphabet.blank_glyphs()],
            )))?;
            let mut input = vec![GlyphSet::single(START)];
            input.extend(alphabet.places().iter().cloned());
            input.push(GlyphSet::single(END));
            let mut lookups = vec![vec![]];
            lookups.extend(std::iter::repeat(vec![do_blank]).take(places));
            lookups.push(vec![]);
            compare2.push_rule(Chaining::new(input, lookups));
        }

        Ok(vec![graph.add_routine(compare1)?, graph.add_routine(compare2)?])
    }

    /// Promote the total before `_end` to result glyphs; delete the rest.
    fn record_result(
        &self,
        graph: &mut FeatureGraph,
        working: &GlyphSet,
        delete: RoutineId,
    ) -> FlowResult<RoutineId> {
        let alphabet = self.alphabet;
        let places = alphabet.radix().places() as usize;
        let do_record = graph.add_routine(Routine::new("do_record_result").with_rule(
            Substitution::new(
                vec![alphabet.calculation_glyphs().clone()],
                vec![alphabet.result_glyphs()],
            ),
        ))?;

        let mut filter = alphabet.calculation_glyphs().clone();
        filter.insert(END);
        let id = graph.add_routine(
            Routine::new("record_result")
                .with_mark_filtering_set(filter)
                .with_rule(
                    Chaining::new(alphabet.places().to_vec(), vec![vec![do_record]; places])
                        .with_postcontext(vec![GlyphSet::single(END)]),
                )
                .with_rule(Chaining::new(vec![working.clone()], vec![vec![delete]])),
        )?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Radix;
    use flowify_ir::{GraphVerifier, LimitVerifier, Rule};

    fn scope() -> RunScope {
        RunScope {
            relevant: vec![("a".into(), 300), ("b".into(), 250)],
            marks: GlyphSet::single("acutecomb"),
            kerning: vec![ResolvedPair {
                left: GlyphSet::single("a"),
                right: GlyphSet::single("b"),
                value: -20,
            }],
        }
    }

    fn stage_names(assembly: &Assembly) -> Vec<String> {
        assembly.stages.iter().map(|(s, _)| s.to_string()).collect()
    }

    #[test]
    fn pill_program_runs_every_stage_in_order() {
        let alphabet = Alphabet::new(Radix::new(4, 7).unwrap());
        let mut graph = FeatureGraph::new();
        let assembly = PipelineAssembler::new(&alphabet, 500)
            .assemble(&mut graph, &scope(), "rlig")
            .unwrap();
        assert_eq!(
            stage_names(&assembly),
            vec![
                "strip-marks",
                "mark-boundaries",
                "inject-kerning",
                "encode",
                "sum-1",
                "tidy",
                "compare",
                "sum-2",
                "delete-carries",
                "record-result",
                "delete-rubbish",
            ]
        );
        // 1 + 2 + 1 + 1 + 7 + 1 + 2 + 7 + 1 + 1 + 1
        assert_eq!(assembly.program.len(), 25);
        assert!(LimitVerifier::default().verify(&graph).all_passed);
    }

    #[test]
    fn rectangle_skips_the_shape_branch() {
        let alphabet = Alphabet::new(Radix::new(4, 7).unwrap());
        let mut graph = FeatureGraph::new();
        let assembly = PipelineAssembler::new(&alphabet, 500)
            .with_shape(SlugShape::Rectangle)
            .assemble(&mut graph, &scope(), "rlig")
            .unwrap();
        assert!(assembly.stage(Stage::Tidy).is_none());
        assert!(assembly.stage(Stage::Sum { generation: 2 }).is_none());
        assert!(graph.arena.named("compare1").is_none());
        assert!(graph.arena.named("record_result").is_some());
    }

    #[test]
    fn empty_marks_and_kerning_are_omitted() {
        let alphabet = Alphabet::new(Radix::new(10, 4).unwrap());
        let mut graph = FeatureGraph::new();
        let scope = RunScope {
            relevant: vec![("a".into(), 30)],
            ..RunScope::default()
        };
        let assembly = PipelineAssembler::new(&alphabet, 50)
            .assemble(&mut graph, &scope, "rlig")
            .unwrap();
        assert!(assembly.stage(Stage::StripMarks).is_none());
        assert!(assembly.stage(Stage::InjectKerning).is_none());
        assert_eq!(assembly.stages[0].0, Stage::MarkBoundaries);
    }

    #[test]
    fn end_marker_follows_a_zero_total() {
        let alphabet = Alphabet::new(Radix::new(10, 4).unwrap());
        let mut graph = FeatureGraph::new();
        PipelineAssembler::new(&alphabet, 50)
            .assemble(&mut graph, &scope(), "rlig")
            .unwrap();
        let id = graph.arena.named("do_add_end").unwrap();
        let Rule::Substitution(sub) = &graph.routine(id).unwrap().rules[0] else {
            panic!("expected substitution");
        };
        assert_eq!(sub.replacement.len(), 1 + 4 + 1);
        assert_eq!(sub.replacement[1], GlyphSet::single("_w.0e0"));
        assert_eq!(sub.replacement[5], GlyphSet::single(END));
    }

    #[test]
    fn blanking_adds_a_fallback_rule() {
        let alphabet = Alphabet::new(Radix::new(4, 7).unwrap());
        let comparator = Comparator::new(&alphabet, 500).unwrap();

        let mut graph = FeatureGraph::new();
        PipelineAssembler::new(&alphabet, 500)
            .assemble(&mut graph, &scope(), "rlig")
            .unwrap();
        let compare2 = graph.routine(graph.arena.named("compare2").unwrap()).unwrap();
        assert_eq!(compare2.rule_count(), comparator.patterns().len() + 1);

        let mut graph = FeatureGraph::new();
        PipelineAssembler::new(&alphabet, 500)
            .with_blanking(false)
            .assemble(&mut graph, &scope(), "rlig")
            .unwrap();
        let compare2 = graph.routine(graph.arena.named("compare2").unwrap()).unwrap();
        assert_eq!(compare2.rule_count(), comparator.patterns().len());
        assert!(graph.arena.named("do_blank").is_none());
    }

    #[test]
    fn end_cap_carries_the_negative_threshold() {
        let alphabet = Alphabet::new(Radix::new(10, 4).unwrap());
        let mut graph = FeatureGraph::new();
        PipelineAssembler::new(&alphabet, 500)
            .assemble(&mut graph, &scope(), "rlig")
            .unwrap();
        let id = graph.arena.named("insert_negative_and_end_slug").unwrap();
        let Rule::Substitution(sub) = &graph.routine(id).unwrap().rules[0] else {
            panic!("expected substitution");
        };
        // -500 is 9500 in four decimal places
        let digits: Vec<&str> = sub.replacement[..4].iter().filter_map(|s| s.get(0)).collect();
        assert_eq!(digits, vec!["_w.0e0", "_w.0e1", "_w.5e2", "_w.9e3"]);
        assert_eq!(sub.replacement[4], GlyphSet::single(END));
        assert_eq!(sub.replacement[5], GlyphSet::single(SLUG_RIGHT));
    }
}
