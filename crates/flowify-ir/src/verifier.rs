//! Feature graph verification against shaping-engine limits.
//!
//! The verifier checks independent aspects of a graph:
//! 1. **Reference Integrity**: every routine handle resolves
//! 2. **Acyclicity**: no routine reaches itself through nested lookups
//! 3. **Nesting Depth**: nested lookups stay within the engine's depth
//! 4. **Rule Count**: no routine holds more rules than the engine accepts
//! 5. **Rule Shape**: glyph sets are non-empty, lookup lists line up

use std::collections::BTreeSet;

use crate::error::{IrError, IrResult};
use crate::graph::FeatureGraph;
use crate::rules::Rule;
use crate::types::RoutineId;

// ── Engine Limits ────────────────────────────────────────────────────

/// Limits of the shaping engine that will run the generated program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineLimits {
    /// Maximum rules in one routine.
    pub max_rules_per_routine: usize,
    /// Maximum depth of nested lookup invocation, the top routine included.
    pub max_nesting_depth: usize,
    /// Largest advance width a glyph may carry.
    pub max_advance_width: i64,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_rules_per_routine: 4096,
            max_nesting_depth: 6,
            max_advance_width: 32767,
        }
    }
}

// ── Verification Aspect ──────────────────────────────────────────────

/// An independent aspect of graph verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerificationAspect {
    ReferenceIntegrity,
    Acyclicity,
    NestingDepth,
    RuleCount,
    RuleShape,
}

impl VerificationAspect {
    pub const ALL: [VerificationAspect; 5] = [
        Self::ReferenceIntegrity,
        Self::Acyclicity,
        Self::NestingDepth,
        Self::RuleCount,
        Self::RuleShape,
    ];
}

impl std::fmt::Display for VerificationAspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReferenceIntegrity => write!(f, "reference-integrity"),
            Self::Acyclicity => write!(f, "acyclicity"),
            Self::NestingDepth => write!(f, "nesting-depth"),
            Self::RuleCount => write!(f, "rule-count"),
            Self::RuleShape => write!(f, "rule-shape"),
        }
    }
}

// ── Verification Result ──────────────────────────────────────────────

/// Result of checking one aspect.
#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub aspect: VerificationAspect,
    pub passed: bool,
    /// Routine that failed the check, if any.
    pub key: Option<String>,
    pub details: String,
    pub items_checked: usize,
}

impl VerificationResult {
    pub fn pass(aspect: VerificationAspect, items_checked: usize) -> Self {
        Self {
            aspect,
            passed: true,
            key: None,
            details: "ok".into(),
            items_checked,
        }
    }

    pub fn fail(
        aspect: VerificationAspect,
        items_checked: usize,
        key: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            aspect,
            passed: false,
            key: Some(key.into()),
            details: details.into(),
            items_checked,
        }
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({} items) - {}",
            self.aspect,
            if self.passed { "PASS" } else { "FAIL" },
            self.items_checked,
            self.details,
        )
    }
}

// ── Verification Report ──────────────────────────────────────────────

/// Aggregated report over all aspects.
#[derive(Clone, Debug)]
pub struct VerificationReport {
    pub results: Vec<VerificationResult>,
    pub all_passed: bool,
}

impl VerificationReport {
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let all_passed = results.iter().all(|r| r.passed);
        Self {
            results,
            all_passed,
        }
    }

    pub fn result_for(&self, aspect: &VerificationAspect) -> Option<&VerificationResult> {
        self.results.iter().find(|r| r.aspect == *aspect)
    }

    pub fn failures(&self) -> Vec<&VerificationResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    /// Turn the first failure into an error naming the offending routine.
    pub fn into_result(self) -> IrResult<()> {
        match self.results.into_iter().find(|r| !r.passed) {
            None => Ok(()),
            Some(failure) => Err(IrError::LimitExceeded {
                key: failure.key.unwrap_or_else(|| failure.aspect.to_string()),
                detail: failure.details,
            }),
        }
    }
}

impl std::fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "VerificationReport: {}",
            if self.all_passed { "PASS" } else { "FAIL" }
        )?;
        for result in &self.results {
            writeln!(f, "  {}", result)?;
        }
        Ok(())
    }
}

// ── Verifier Trait ───────────────────────────────────────────────────

/// Trait for checking a feature graph before it is serialized.
pub trait GraphVerifier: Send + Sync {
    fn verify(&self, graph: &FeatureGraph) -> VerificationReport;

    fn name(&self) -> &str;
}

// ── Limit Verifier ───────────────────────────────────────────────────

/// Checks a graph against [`EngineLimits`].
pub struct LimitVerifier {
    limits: EngineLimits,
}

impl LimitVerifier {
    pub fn new(limits: EngineLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    fn check_references(&self, graph: &FeatureGraph) -> VerificationResult {
        let aspect = VerificationAspect::ReferenceIntegrity;
        let mut checked = 0;
        for program in &graph.features {
            for id in &program.routines {
                checked += 1;
                if !graph.arena.contains(*id) {
                    return VerificationResult::fail(
                        aspect,
                        checked,
                        &program.tag,
                        format!("feature references unknown {}", id),
                    );
                }
            }
        }
        for (_, routine) in graph.arena.iter() {
            for id in routine.children() {
                checked += 1;
                if !graph.arena.contains(id) {
                    return VerificationResult::fail(
                        aspect,
                        checked,
                        &routine.name,
                        format!("rule references unknown {}", id),
                    );
                }
            }
        }
        VerificationResult::pass(aspect, checked)
    }

    fn check_cycles(&self, graph: &FeatureGraph) -> VerificationResult {
        let aspect = VerificationAspect::Acyclicity;
        match graph.dependency_order() {
            Ok(order) => VerificationResult::pass(aspect, order.len()),
            Err(IrError::LimitExceeded { key, detail }) => {
                VerificationResult::fail(aspect, 0, key, detail)
            }
            Err(other) => {
                VerificationResult::fail(aspect, 0, aspect.to_string(), other.to_string())
            }
        }
    }

    fn check_depth(&self, graph: &FeatureGraph) -> VerificationResult {
        let aspect = VerificationAspect::NestingDepth;
        let roots: BTreeSet<RoutineId> = graph
            .features
            .iter()
            .flat_map(|p| p.routines.iter().copied())
            .collect();
        let mut checked = 0;
        for id in roots {
            checked += 1;
            let name = graph
                .routine(id)
                .map(|r| r.name.clone())
                .unwrap_or_else(|_| id.to_string());
            match graph.nesting_depth(id) {
                Ok(depth) if depth > self.limits.max_nesting_depth => {
                    return VerificationResult::fail(
                        aspect,
                        checked,
                        name,
                        format!(
                            "nesting depth {} exceeds {}",
                            depth, self.limits.max_nesting_depth
                        ),
                    );
                }
                Ok(_) => {}
                Err(e) => return VerificationResult::fail(aspect, checked, name, e.to_string()),
            }
        }
        VerificationResult::pass(aspect, checked)
    }

    fn check_rule_counts(&self, graph: &FeatureGraph) -> VerificationResult {
        let aspect = VerificationAspect::RuleCount;
        for (_, routine) in graph.arena.iter() {
            if routine.rule_count() > self.limits.max_rules_per_routine {
                return VerificationResult::fail(
                    aspect,
                    graph.arena.len(),
                    &routine.name,
                    format!(
                        "{} rules exceed {}",
                        routine.rule_count(),
                        self.limits.max_rules_per_routine
                    ),
                );
            }
        }
        VerificationResult::pass(aspect, graph.arena.len())
    }

    fn check_shapes(&self, graph: &FeatureGraph) -> VerificationResult {
        let aspect = VerificationAspect::RuleShape;
        let mut checked = 0;
        for (_, routine) in graph.arena.iter() {
            for rule in &routine.rules {
                checked += 1;
                let input_empty = match rule {
                    Rule::Substitution(s) => s.input.is_empty(),
                    Rule::Chaining(c) => c.input.is_empty(),
                };
                if input_empty {
                    return VerificationResult::fail(
                        aspect,
                        checked,
                        &routine.name,
                        "rule has no input positions",
                    );
                }
                if rule.glyph_sets().iter().any(|s| s.is_empty()) {
                    return VerificationResult::fail(
                        aspect,
                        checked,
                        &routine.name,
                        "rule mentions an empty glyph set",
                    );
                }
                if let Rule::Chaining(c) = rule {
                    if c.lookups.len() != c.input.len() {
                        return VerificationResult::fail(
                            aspect,
                            checked,
                            &routine.name,
                            format!(
                                "{} lookup positions for {} input positions",
                                c.lookups.len(),
                                c.input.len()
                            ),
                        );
                    }
                }
            }
        }
        VerificationResult::pass(aspect, checked)
    }
}

impl Default for LimitVerifier {
    fn default() -> Self {
        Self::new(EngineLimits::default())
    }
}

impl GraphVerifier for LimitVerifier {
    fn verify(&self, graph: &FeatureGraph) -> VerificationReport {
        let references = self.check_references(graph);
        if !references.passed {
            return VerificationReport::from_results(vec![references]);
        }
        VerificationReport::from_results(vec![
            references,
            self.check_cycles(graph),
            self.check_depth(graph),
            self.check_rule_counts(graph),
            self.check_shapes(graph),
        ])
    }

    fn name(&self) -> &str {
        "limit-verifier"
    }
}
