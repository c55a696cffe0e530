//! Top-level compilation: host font in, flow font out.

use serde::Serialize;
use tracing::{debug, info};

use flowify_ir::{
    EngineLimits, FeaSerializer, FeatureGraph, FeatureSerializer, GlyphCategory, GlyphSet,
    GraphVerifier, LimitVerifier,
};

use crate::alphabet::{Alphabet, Radix, END, SLUG_LEFT, SLUG_RIGHT, START};
use crate::config::{FlowConfig, SlugHeight};
use crate::drawing::{self, CapSide};
use crate::error::{FlowError, FlowResult};
use crate::font::{Glyph, HostFont};
use crate::kerning::resolve_pairs;
use crate::pipeline::{PipelineAssembler, RunScope};

/// Appended to the host's style name after a successful compilation.
pub const STYLE_SUFFIX: &str = " Flow";

/// Glyphs that never take part in a run, whatever their width.
const EXCLUDED_GLYPHS: [&str; 2] = ["space", ".notdef"];

/// Number of `w.*` glyphs added in debugging builds.
const DEBUGGING_GLYPHS: i64 = 50;

// ── Flow Artifact ────────────────────────────────────────────────────

/// What a compilation produced.
#[derive(Debug, Clone, Serialize)]
pub struct FlowArtifact {
    pub feature_tag: String,
    /// Feature-file text appended to the host.
    pub feature_text: String,
    /// Glyphs whose widths the program sums.
    pub relevant_glyphs: Vec<String>,
    /// Glyphs added to the host.
    pub added_glyphs: Vec<String>,
    pub routine_count: usize,
    pub threshold: i64,
    /// The threshold's digits, least significant first.
    pub encoded_threshold: Vec<String>,
}

// ── Flowifier ────────────────────────────────────────────────────────

/// Compiles a host font into a flow font.
#[derive(Debug, Clone, Default)]
pub struct Flowifier {
    config: FlowConfig,
    limits: EngineLimits,
}

impl Flowifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FlowConfig) -> Self {
        Self {
            config,
            limits: EngineLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Compile `font` in place.
    ///
    /// The font is only modified once the whole program has been built,
    /// verified, and serialized; any error leaves it untouched.
    pub fn compile<F: HostFont + ?Sized>(&self, font: &mut F) -> FlowResult<FlowArtifact> {
        let config = &self.config;
        let radix = config.validate()?;
        info!(
            font = %font.display_name(),
            base = radix.base(),
            places = radix.places(),
            "Flowifying font"
        );

        let threshold = resolve_threshold(config.slug_height, &*font)?;
        let debugging = if config.debugging_glyphs {
            debugging_glyphs()
        } else {
            Vec::new()
        };

        let mut relevant = relevant_glyphs(&*font);
        relevant.extend(
            debugging
                .iter()
                .filter(|g| g.width != 0)
                .map(|g| (g.name.clone(), g.width)),
        );
        if relevant.is_empty() {
            return Err(FlowError::HostData(
                "font has no glyphs with a measurable width".into(),
            ));
        }
        let scope = RunScope {
            marks: strip_marks(&*font),
            kerning: resolve_pairs(&*font, &relevant.iter().map(|(n, _)| n.as_str()).collect()),
            relevant,
        };
        self.check_ranges(&radix, threshold, &scope)?;

        let alphabet = Alphabet::new(radix);
        let mut added = flow_glyphs(&alphabet, threshold, config.margin);
        added.extend(debugging.into_iter().map(|g| (g, GlyphCategory::Base)));
        if let Some((glyph, _)) = added
            .iter()
            .find(|(g, _)| font.advance_width(&g.name).is_some())
        {
            return Err(FlowError::HostData(format!(
                "font already has a glyph named '{}'",
                glyph.name
            )));
        }

        let mut graph = FeatureGraph::new();
        for name in font.glyph_names() {
            if let Some(category) = font.category(&name) {
                graph.set_category(name, category);
            }
        }
        for (glyph, category) in &added {
            graph.set_category(glyph.name.clone(), *category);
        }

        let assembly = PipelineAssembler::new(&alphabet, threshold)
            .with_shape(config.shape)
            .with_blanking(config.blank)
            .with_max_kern_rules(config.max_kern_rules)
            .assemble(&mut graph, &scope, &config.feature)?;
        graph.add_feature(assembly.program);

        LimitVerifier::new(self.limits).verify(&graph).into_result()?;
        let serialized = FeaSerializer::new().serialize(&graph)?;
        debug!(
            routines = serialized.routine_count,
            bytes = serialized.size_bytes,
            "Serialized feature code"
        );

        let artifact = FlowArtifact {
            feature_tag: config.feature.clone(),
            feature_text: serialized.text,
            relevant_glyphs: scope.relevant.iter().map(|(n, _)| n.clone()).collect(),
            added_glyphs: added.iter().map(|(g, _)| g.name.clone()).collect(),
            routine_count: serialized.routine_count,
            threshold,
            encoded_threshold: alphabet
                .radix()
                .encode(threshold)?
                .digits()
                .iter()
                .map(|d| d.intermediate_name())
                .collect(),
        };

        for (glyph, category) in added {
            font.add_glyph(glyph, category)?;
        }
        font.append_features(&artifact.feature_text);
        font.append_style_suffix(STYLE_SUFFIX);

        info!(
            font = %font.display_name(),
            relevant = artifact.relevant_glyphs.len(),
            added = artifact.added_glyphs.len(),
            routines = artifact.routine_count,
            "Flowified font"
        );
        Ok(artifact)
    }

    /// Every value the program will encode must fit the number system, and
    /// every glyph the compiler draws must fit the engine's width ceiling.
    fn check_ranges(&self, radix: &Radix, threshold: i64, scope: &RunScope) -> FlowResult<()> {
        radix.check_admissible(threshold, "slug height")?;
        radix.check_admissible(-threshold, "negated slug height")?;
        for (glyph, width) in &scope.relevant {
            radix.check_admissible(*width, &format!("width of '{}'", glyph))?;
        }
        for pair in &scope.kerning {
            radix.check_admissible(pair.value, &format!("kerning value before {}", pair.right))?;
        }

        let ceiling = self.limits.max_advance_width;
        let widest = radix.widest_digit();
        if widest > ceiling {
            return Err(FlowError::ResourceLimit {
                key: format!("_W.{}E{}", radix.base() - 1, radix.places() - 1),
                detail: format!("advance width {} exceeds {}", widest, ceiling),
            });
        }
        let (_, right_cap) = drawing::cap_widths(threshold);
        if right_cap > ceiling {
            return Err(FlowError::ResourceLimit {
                key: SLUG_RIGHT.into(),
                detail: format!("advance width {} exceeds {}", right_cap, ceiling),
            });
        }
        Ok(())
    }
}

// ── Host Selection ───────────────────────────────────────────────────

/// The slug height `H` in font units.
pub fn resolve_threshold(height: SlugHeight, font: &(impl HostFont + ?Sized)) -> FlowResult<i64> {
    let (value, what) = match height {
        SlugHeight::X => (font.x_height(), "x-height"),
        SlugHeight::Cap => (font.cap_height(), "cap-height"),
        SlugHeight::Units(units) => (Some(units), "slug height"),
    };
    match value {
        Some(h) if h > 0 => Ok(h),
        Some(h) => Err(FlowError::HostData(format!("{} must be positive, got {}", what, h))),
        None => Err(FlowError::HostData(format!("font has no {}", what))),
    }
}

/// Exported glyphs with a measurable width, in glyph order.
pub fn relevant_glyphs(font: &(impl HostFont + ?Sized)) -> Vec<(String, i64)> {
    font.glyph_names()
        .into_iter()
        .filter(|name| font.is_exported(name))
        .filter(|name| {
            !EXCLUDED_GLYPHS.contains(&name.as_str())
                && !name.starts_with("slug")
                && !name.starts_with('_')
        })
        .filter_map(|name| match font.advance_width(&name) {
            Some(width) if width != 0 => Some((name, width)),
            _ => None,
        })
        .collect()
}

/// Exported host marks and zero-width glyphs.
pub fn strip_marks(font: &(impl HostFont + ?Sized)) -> GlyphSet {
    font.glyph_names()
        .into_iter()
        .filter(|name| font.is_exported(name))
        .filter(|name| {
            font.category(name) == Some(GlyphCategory::Mark) || font.advance_width(name) == Some(0)
        })
        .collect()
}

// ── Added Glyphs ─────────────────────────────────────────────────────

/// Every glyph the program needs, drawn for slug height `threshold`.
pub fn flow_glyphs(
    alphabet: &Alphabet,
    threshold: i64,
    margin: i64,
) -> Vec<(Glyph, GlyphCategory)> {
    let radix = alphabet.radix();
    let (left_width, right_width) = drawing::cap_widths(threshold);
    let mut glyphs = vec![
        (
            Glyph::new(SLUG_LEFT, left_width)
                .with_contours(vec![drawing::semicircle(threshold, CapSide::Left, margin)]),
            GlyphCategory::Base,
        ),
        (
            Glyph::new(SLUG_RIGHT, right_width)
                .with_contours(vec![drawing::semicircle(threshold, CapSide::Right, margin)]),
            GlyphCategory::Base,
        ),
    ];

    for exponent in 0..radix.places() {
        for digit in alphabet.digits().filter(|d| d.exponent == exponent) {
            let width = digit.width(radix);
            glyphs.push((Glyph::new(digit.intermediate_name(), 0), GlyphCategory::Mark));
            glyphs.push((
                Glyph::new(digit.result_name(), width)
                    .with_contours(vec![drawing::rectangle(width, threshold)]),
                GlyphCategory::Base,
            ));
            glyphs.push((Glyph::new(digit.blank_name(), width), GlyphCategory::Base));
        }
        if let Some(carry) = alphabet.carry(exponent) {
            glyphs.push((Glyph::new(carry, 0), GlyphCategory::Mark));
        }
    }

    glyphs.push((Glyph::new(START, 0), GlyphCategory::Mark));
    glyphs.push((Glyph::new(END, 0), GlyphCategory::Mark));
    glyphs
}

/// `w.zero` .. `w.forty-nine`: widths 0-49 on U+E000 onwards.
pub fn debugging_glyphs() -> Vec<Glyph> {
    (0..DEBUGGING_GLYPHS)
        .map(|width| {
            Glyph::new(format!("w.{}", number_words(width)), width)
                .with_unicode(0xE000 + width as u32)
        })
        .collect()
}

fn number_words(n: i64) -> String {
    const ONES: [&str; 20] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
        "nineteen",
    ];
    const TENS: [&str; 10] = [
        "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    ];
    let n = n.clamp(0, 99) as usize;
    match (n / 10, n % 10) {
        _ if n < 20 => ONES[n].to_string(),
        (tens, 0) => TENS[tens].to_string(),
        (tens, ones) => format!("{}-{}", TENS[tens], ONES[ones]),
    }
}
