//! Feature graph serialization.
//!
//! Supports two formats:
//! - **Fea**: AFDKO feature-file syntax, appended to a font's feature text
//! - **Json**: the raw graph, for inspection and debugging
//!
//! The `FeatureSerializer` trait is implemented by `FeaSerializer` and
//! `JsonSerializer`.

use std::fmt::Write as _;

use crate::error::{IrError, IrResult};
use crate::graph::FeatureGraph;
use crate::routine::Routine;
use crate::rules::{Chaining, Rule, Substitution};
use crate::types::{GlyphCategory, GlyphSet};

// ── Serialization Format ─────────────────────────────────────────────

/// Output format for a feature graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureFormat {
    /// OpenType feature-file syntax.
    Fea,
    /// Pretty-printed JSON of the graph.
    Json,
}

impl std::fmt::Display for FeatureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fea => write!(f, "fea"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Header line written at the top of generated feature code.
pub const FEA_HEADER: &str = "# Automatically generated by flowify";

// ── Serialized Output ────────────────────────────────────────────────

/// Result of serializing a feature graph.
#[derive(Clone, Debug)]
pub struct SerializedFeatures {
    pub format: FeatureFormat,
    pub text: String,
    pub size_bytes: usize,
    /// Feature tags contained in the output, in graph order.
    pub feature_tags: Vec<String>,
    /// Number of lookup blocks written.
    pub routine_count: usize,
}

// ── Serializer Trait ─────────────────────────────────────────────────

/// Trait for turning a feature graph into text.
pub trait FeatureSerializer: Send + Sync {
    /// The format this serializer produces.
    fn format(&self) -> FeatureFormat;

    /// Serialize every feature of the graph and the routines they reach.
    fn serialize(&self, graph: &FeatureGraph) -> IrResult<SerializedFeatures>;

    /// Name of this serializer implementation.
    fn name(&self) -> &str;
}

// ── Feature-File Serializer ──────────────────────────────────────────

/// Writes AFDKO feature syntax.
///
/// Every reachable routine becomes a standalone `lookup` block, callees
/// first, and each feature block then references its program's routines
/// in order.
pub struct FeaSerializer;

impl FeaSerializer {
    pub fn new() -> Self {
        Self
    }

    fn write_gdef(&self, out: &mut String, graph: &FeatureGraph) {
        if graph.categories.is_empty() {
            return;
        }
        let class = |category| {
            let glyphs = graph.glyphs_in(category);
            if glyphs.is_empty() {
                String::new()
            } else {
                format!("[{}]", glyphs.join(" "))
            }
        };
        out.push_str("table GDEF {\n");
        let _ = writeln!(
            out,
            "    GlyphClassDef {}, {}, {}, {};",
            class(GlyphCategory::Base),
            class(GlyphCategory::Ligature),
            class(GlyphCategory::Mark),
            class(GlyphCategory::Component),
        );
        out.push_str("} GDEF;\n\n");
    }

    fn write_routine(
        &self,
        out: &mut String,
        graph: &FeatureGraph,
        routine: &Routine,
    ) -> IrResult<()> {
        let _ = writeln!(out, "lookup {} {{", routine.name);

        let mut flags = Vec::new();
        if routine.flags.ignore_marks() {
            flags.push("IgnoreMarks".to_string());
        }
        if let Some(set) = &routine.mark_filtering_set {
            flags.push(format!("UseMarkFilteringSet {}", glyph_class(set, routine)?));
        }
        if !flags.is_empty() {
            let _ = writeln!(out, "    lookupflag {};", flags.join(" "));
        }

        // A lookup holding any one-to-many rewrite is a multiple-substitution
        // lookup: those rules go first so one-to-one rewrites join it.
        let expands = routine.rules.iter().any(|r| match r {
            Rule::Substitution(s) => s.replacement.len() != 1,
            Rule::Chaining(_) => false,
        });
        let mut lines = Vec::new();
        let mut trailing = Vec::new();
        for rule in &routine.rules {
            match rule {
                Rule::Substitution(s) if expands && s.replacement.len() == 1 => {
                    trailing.extend(self.substitution_lines(s, routine, true)?);
                }
                Rule::Substitution(s) => {
                    lines.extend(self.substitution_lines(s, routine, expands)?);
                }
                Rule::Chaining(c) => lines.push(self.chaining_line(c, graph, routine)?),
            }
        }
        for line in lines.iter().chain(trailing.iter()) {
            let _ = writeln!(out, "    {}", line);
        }
        let _ = writeln!(out, "}} {};\n", routine.name);
        Ok(())
    }

    fn substitution_lines(
        &self,
        sub: &Substitution,
        routine: &Routine,
        per_glyph: bool,
    ) -> IrResult<Vec<String>> {
        let malformed = |detail: &str| IrError::MalformedRule {
            routine: routine.name.clone(),
            detail: detail.to_string(),
        };

        for set in sub.input.iter().chain(&sub.replacement) {
            glyph_class(set, routine)?;
        }

        match (sub.input.as_slice(), sub.replacement.as_slice()) {
            ([input], [replacement])
                if !per_glyph && (replacement.len() == input.len() || replacement.len() == 1) =>
            {
                Ok(vec![format!(
                    "sub {} by {};",
                    glyph_class(input, routine)?,
                    glyph_class(replacement, routine)?
                )])
            }
            ([_], _) => {
                let expanded = sub.expand().ok_or_else(|| {
                    malformed("replacement sets do not line up with the input set")
                })?;
                Ok(expanded
                    .into_iter()
                    .map(|(glyph, replacement)| {
                        if replacement.is_empty() {
                            format!("sub {} by NULL;", glyph)
                        } else {
                            format!("sub {} by {};", glyph, replacement.join(" "))
                        }
                    })
                    .collect())
            }
            (inputs, [replacement]) if inputs.len() > 1 && replacement.len() == 1 => {
                let pattern = inputs
                    .iter()
                    .map(|s| glyph_class(s, routine))
                    .collect::<IrResult<Vec<_>>>()?;
                Ok(vec![format!("sub {} by {};", pattern.join(" "), replacement)])
            }
            _ => Err(malformed("many-to-many rewrites have no feature-file form")),
        }
    }

    fn chaining_line(
        &self,
        rule: &Chaining,
        graph: &FeatureGraph,
        routine: &Routine,
    ) -> IrResult<String> {
        if rule.lookups.len() != rule.input.len() {
            return Err(IrError::MalformedRule {
                routine: routine.name.clone(),
                detail: format!(
                    "{} lookup positions for {} input positions",
                    rule.lookups.len(),
                    rule.input.len()
                ),
            });
        }

        let mut parts = Vec::new();
        for set in &rule.precontext {
            parts.push(glyph_class(set, routine)?);
        }
        for (set, lookups) in rule.input.iter().zip(&rule.lookups) {
            let mut part = format!("{}'", glyph_class(set, routine)?);
            for id in lookups {
                let _ = write!(part, " lookup {}", graph.routine(*id)?.name);
            }
            parts.push(part);
        }
        for set in &rule.postcontext {
            parts.push(glyph_class(set, routine)?);
        }

        let keyword = if rule.is_exception() { "ignore sub" } else { "sub" };
        Ok(format!("{} {};", keyword, parts.join(" ")))
    }
}

impl Default for FeaSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureSerializer for FeaSerializer {
    fn format(&self) -> FeatureFormat {
        FeatureFormat::Fea
    }

    fn serialize(&self, graph: &FeatureGraph) -> IrResult<SerializedFeatures> {
        let order = graph.dependency_order()?;

        let mut out = String::new();
        let _ = writeln!(out, "{}\n", FEA_HEADER);
        self.write_gdef(&mut out, graph);
        for id in &order {
            self.write_routine(&mut out, graph, graph.routine(*id)?)?;
        }
        for program in &graph.features {
            let _ = writeln!(out, "feature {} {{", program.tag);
            for id in &program.routines {
                let _ = writeln!(out, "    lookup {};", graph.routine(*id)?.name);
            }
            let _ = writeln!(out, "}} {};\n", program.tag);
        }

        tracing::debug!(
            routines = order.len(),
            bytes = out.len(),
            "serialized feature graph"
        );

        let size_bytes = out.len();
        Ok(SerializedFeatures {
            format: FeatureFormat::Fea,
            text: out,
            size_bytes,
            feature_tags: graph.features.iter().map(|p| p.tag.clone()).collect(),
            routine_count: order.len(),
        })
    }

    fn name(&self) -> &str {
        "fea-serializer"
    }
}

// ── JSON Serializer ──────────────────────────────────────────────────

/// Dumps the whole graph as pretty JSON.
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureSerializer for JsonSerializer {
    fn format(&self) -> FeatureFormat {
        FeatureFormat::Json
    }

    fn serialize(&self, graph: &FeatureGraph) -> IrResult<SerializedFeatures> {
        let text = serde_json::to_string_pretty(graph)
            .map_err(|e| IrError::SerializationFailed(e.to_string()))?;
        let size_bytes = text.len();
        Ok(SerializedFeatures {
            format: FeatureFormat::Json,
            text,
            size_bytes,
            feature_tags: graph.features.iter().map(|p| p.tag.clone()).collect(),
            routine_count: graph.arena.len(),
        })
    }

    fn name(&self) -> &str {
        "json-serializer"
    }
}

fn glyph_class(set: &GlyphSet, routine: &Routine) -> IrResult<String> {
    if set.is_empty() {
        return Err(IrError::MalformedRule {
            routine: routine.name.clone(),
            detail: "empty glyph set".into(),
        });
    }
    Ok(set.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Program;
    use crate::types::LookupFlags;

    fn set(names: &[&str]) -> GlyphSet {
        names.iter().copied().collect()
    }

    fn graph_with(routines: Vec<Routine>) -> FeatureGraph {
        let mut graph = FeatureGraph::new();
        let mut program = Program::new("rlig");
        for r in routines {
            program.push(graph.add_routine(r).unwrap());
        }
        graph.add_feature(program);
        graph
    }

    #[test]
    fn single_class_substitution() {
        let graph = graph_with(vec![Routine::new("record").with_rule(Substitution::new(
            vec![set(&["_w.1e0", "_w.2e0"])],
            vec![set(&["_W.1E0", "_W.2E0"])],
        ))]);
        let text = FeaSerializer::new().serialize(&graph).unwrap().text;
        assert!(text.contains("sub [_w.1e0 _w.2e0] by [_W.1E0 _W.2E0];"));
        assert!(text.contains("feature rlig {\n    lookup record;\n} rlig;"));
    }

    #[test]
    fn multiple_substitution_expands_per_glyph() {
        let graph = graph_with(vec![Routine::new("do_add_start").with_rule(Substitution::new(
            vec![set(&["a", "b"])],
            vec![GlyphSet::single("_start"), set(&["a", "b"])],
        ))]);
        let text = FeaSerializer::new().serialize(&graph).unwrap().text;
        assert!(text.contains("sub a by _start a;"));
        assert!(text.contains("sub b by _start b;"));
    }

    #[test]
    fn deletion_uses_null() {
        let graph = graph_with(vec![Routine::new("delete_rubbish")
            .with_rule(Substitution::deletion(set(&["_start", "_end"])))]);
        let text = FeaSerializer::new().serialize(&graph).unwrap().text;
        assert!(text.contains("sub _start by NULL;"));
        assert!(text.contains("sub _end by NULL;"));
    }

    #[test]
    fn mixed_lookup_lists_multiple_rules_first() {
        let graph = graph_with(vec![Routine::new("add_1")
            .with_rule(Substitution::new(
                vec![GlyphSet::single("_w.0e0")],
                vec![GlyphSet::single("_w.1e0")],
            ))
            .with_rule(Substitution::new(
                vec![GlyphSet::single("_w.1e0")],
                vec![GlyphSet::single("_w.0e0"), GlyphSet::single("_carry.e1")],
            ))]);
        let text = FeaSerializer::new().serialize(&graph).unwrap().text;
        let multiple = text.find("sub _w.1e0 by _w.0e0 _carry.e1;").unwrap();
        let single = text.find("sub _w.0e0 by _w.1e0;").unwrap();
        assert!(multiple < single);
    }

    #[test]
    fn chaining_with_lookups_and_context() {
        let mut graph = FeatureGraph::new();
        let inner = graph
            .add_routine(Routine::new("kern_minus10").with_rule(Substitution::new(
                vec![GlyphSet::single("A")],
                vec![GlyphSet::single("A"), GlyphSet::single("_w.2e0")],
            )))
            .unwrap();
        let outer = graph
            .add_routine(Routine::new("slug_kerning_0").with_rule(
                Chaining::new(vec![GlyphSet::single("A")], vec![vec![inner]])
                    .with_postcontext(vec![set(&["V", "W"])]),
            ))
            .unwrap();
        let mut program = Program::new("rlig");
        program.push(outer);
        graph.add_feature(program);

        let text = FeaSerializer::new().serialize(&graph).unwrap().text;
        assert!(text.contains("sub A' lookup kern_minus10 [V W];"));
        // nested lookup defined before its caller
        let nested = text.find("lookup kern_minus10 {").unwrap();
        let caller = text.find("lookup slug_kerning_0 {").unwrap();
        assert!(nested < caller);
    }

    #[test]
    fn exception_rules_use_ignore() {
        let graph = graph_with(vec![Routine::new("add_start")
            .with_flags(LookupFlags::IGNORE_MARKS)
            .with_rule(
                Chaining::pass_through(vec![set(&["a", "b"])])
                    .with_precontext(vec![set(&["a", "b"])]),
            )]);
        let text = FeaSerializer::new().serialize(&graph).unwrap().text;
        assert!(text.contains("lookupflag IgnoreMarks;"));
        assert!(text.contains("ignore sub [a b] [a b]';"));
    }

    #[test]
    fn mark_filtering_set_flag() {
        let graph = graph_with(vec![Routine::new("adder_place_0")
            .with_mark_filtering_set(set(&["_start", "_end"]))
            .with_rule(Substitution::deletion(GlyphSet::single("x")))]);
        let text = FeaSerializer::new().serialize(&graph).unwrap().text;
        assert!(text.contains("lookupflag UseMarkFilteringSet [_start _end];"));
    }

    #[test]
    fn gdef_lists_categories() {
        let mut graph = graph_with(vec![]);
        graph.set_category("_w.0e0", GlyphCategory::Mark);
        graph.set_category("_W.0E0", GlyphCategory::Base);
        let text = FeaSerializer::new().serialize(&graph).unwrap().text;
        assert!(text.contains("GlyphClassDef [_W.0E0], , [_w.0e0], ;"));
    }

    #[test]
    fn empty_glyph_set_rejected() {
        let graph = graph_with(vec![
            Routine::new("broken").with_rule(Substitution::deletion(GlyphSet::new()))
        ]);
        assert!(FeaSerializer::new().serialize(&graph).is_err());
    }

    #[test]
    fn empty_replacement_set_rejected() {
        let graph = graph_with(vec![Routine::new("broken").with_rule(Substitution::new(
            vec![set(&["a", "b"])],
            vec![set(&["a", "b"]), GlyphSet::new()],
        ))]);
        let err = FeaSerializer::new().serialize(&graph).unwrap_err();
        assert!(matches!(err, IrError::MalformedRule { ref routine, .. } if routine == "broken"));
    }

    #[test]
    fn json_serializer_names_routines() {
        let graph = graph_with(vec![Routine::new("encode")]);
        let out = JsonSerializer::new().serialize(&graph).unwrap();
        assert_eq!(out.format, FeatureFormat::Json);
        assert!(out.text.contains("\"encode\""));
        assert_eq!(out.feature_tags, vec!["rlig".to_string()]);
    }
}
