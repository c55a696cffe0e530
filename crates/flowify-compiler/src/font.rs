//! Host font model.
//!
//! [`HostFont`] is everything the compiler reads from, and writes back to,
//! the font it flowifies. [`FontSource`] is a serde-backed implementation
//! holding a UFO-like font as one JSON document.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use flowify_ir::GlyphCategory;

use crate::error::{FlowError, FlowResult};

// ── Outlines ─────────────────────────────────────────────────────────

/// Role of a point in a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Move,
    Line,
    Curve,
    OffCurve,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourPoint {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: PointKind,
}

/// One closed outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<ContourPoint>,
}

impl Contour {
    /// Horizontal extent of the on- and off-curve points.
    pub fn x_bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |acc, p| match acc {
            None => Some((p.x, p.x)),
            Some((lo, hi)) => Some((lo.min(p.x), hi.max(p.x))),
        })
    }
}

// ── Glyphs, Kerning, Info ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub name: String,
    pub width: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unicodes: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contours: Vec<Contour>,
}

impl Glyph {
    pub fn new(name: impl Into<String>, width: i64) -> Self {
        Self {
            name: name.into(),
            width,
            unicodes: Vec::new(),
            contours: Vec::new(),
        }
    }

    pub fn with_unicode(mut self, codepoint: u32) -> Self {
        self.unicodes.push(codepoint);
        self
    }

    pub fn with_contours(mut self, contours: Vec<Contour>) -> Self {
        self.contours = contours;
        self
    }
}

/// A kerning entry. Either side may name a glyph or a kerning group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KerningPair {
    pub left: String,
    pub right: String,
    pub value: i64,
}

impl KerningPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>, value: i64) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_height: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_height: Option<i64>,
}

// ── Host Font ────────────────────────────────────────────────────────

/// The compiler's view of the font being flowified.
pub trait HostFont {
    /// Glyph names in glyph order.
    fn glyph_names(&self) -> Vec<String>;

    fn advance_width(&self, glyph: &str) -> Option<i64>;

    fn category(&self, glyph: &str) -> Option<GlyphCategory>;

    /// Whether the glyph exists and is not listed as skip-export.
    fn is_exported(&self, glyph: &str) -> bool;

    /// Members of a kerning group, if `name` is a group.
    fn group(&self, name: &str) -> Option<Vec<String>>;

    /// Kerning pairs in table order.
    fn kerning(&self) -> Vec<KerningPair>;

    fn x_height(&self) -> Option<i64>;

    fn cap_height(&self) -> Option<i64>;

    /// Human-readable name for log messages.
    fn display_name(&self) -> String;

    fn add_glyph(&mut self, glyph: Glyph, category: GlyphCategory) -> FlowResult<()>;

    fn append_features(&mut self, text: &str);

    fn append_style_suffix(&mut self, suffix: &str);
}

// ── Font Source ──────────────────────────────────────────────────────

/// An in-memory font loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontSource {
    #[serde(default)]
    pub info: FontInfo,
    pub glyphs: Vec<Glyph>,
    #[serde(default, rename = "public.openTypeCategories")]
    pub categories: BTreeMap<String, GlyphCategory>,
    #[serde(default, rename = "public.skipExportGlyphs")]
    pub skip_export: Vec<String>,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub kerning: Vec<KerningPair>,
    #[serde(default)]
    pub features: String,
}

impl FontSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> FlowResult<Self> {
        let font: Self = serde_json::from_str(json).map_err(|e| FlowError::Parse(e.to_string()))?;
        font.check_unique_names()?;
        Ok(font)
    }

    pub fn to_json(&self) -> FlowResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FlowError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> FlowResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> FlowResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.name == name)
    }

    /// Add a host glyph while building a font by hand.
    pub fn with_glyph(mut self, glyph: Glyph) -> Self {
        self.glyphs.push(glyph);
        self
    }

    pub fn with_kerning(mut self, left: &str, right: &str, value: i64) -> Self {
        self.kerning.push(KerningPair::new(left, right, value));
        self
    }

    fn check_unique_names(&self) -> FlowResult<()> {
        let mut seen = std::collections::HashSet::new();
        for g in &self.glyphs {
            if !seen.insert(g.name.as_str()) {
                return Err(FlowError::HostData(format!(
                    "glyph '{}' is defined more than once",
                    g.name
                )));
            }
        }
        Ok(())
    }
}

impl HostFont for FontSource {
    fn glyph_names(&self) -> Vec<String> {
        self.glyphs.iter().map(|g| g.name.clone()).collect()
    }

    fn advance_width(&self, glyph: &str) -> Option<i64> {
        self.glyph(glyph).map(|g| g.width)
    }

    fn category(&self, glyph: &str) -> Option<GlyphCategory> {
        self.categories.get(glyph).copied()
    }

    fn is_exported(&self, glyph: &str) -> bool {
        self.glyph(glyph).is_some() && !self.skip_export.iter().any(|g| g == glyph)
    }

    fn group(&self, name: &str) -> Option<Vec<String>> {
        self.groups.get(name).cloned()
    }

    fn kerning(&self) -> Vec<KerningPair> {
        self.kerning.clone()
    }

    fn x_height(&self) -> Option<i64> {
        self.info.x_height
    }

    fn cap_height(&self) -> Option<i64> {
        self.info.cap_height
    }

    fn display_name(&self) -> String {
        match (&self.info.family_name, &self.info.style_name) {
            (Some(family), Some(style)) => format!("{} {}", family, style),
            (Some(family), None) => family.clone(),
            _ => "<unnamed font>".into(),
        }
    }

    fn add_glyph(&mut self, glyph: Glyph, category: GlyphCategory) -> FlowResult<()> {
        if self.glyph(&glyph.name).is_some() {
            return Err(FlowError::HostData(format!(
                "font already has a glyph named '{}'",
                glyph.name
            )));
        }
        self.categories.insert(glyph.name.clone(), category);
        self.glyphs.push(glyph);
        Ok(())
    }

    fn append_features(&mut self, text: &str) {
        if !self.features.is_empty() && !self.features.ends_with('\n') {
            self.features.push('\n');
        }
        self.features.push_str(text);
    }

    fn append_style_suffix(&mut self, suffix: &str) {
        let style = self.info.style_name.get_or_insert_with(|| "Regular".into());
        style.push_str(suffix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "info": { "familyName": "Sample", "styleName": "Bold", "xHeight": 500, "capHeight": 700 },
        "glyphs": [
            { "name": "a", "width": 300, "unicodes": [97] },
            { "name": "b", "width": 250 },
            { "name": "acutecomb", "width": 0 }
        ],
        "public.openTypeCategories": { "acutecomb": "mark" },
        "public.skipExportGlyphs": ["b"],
        "groups": { "public.kern1.round": ["a", "b"] },
        "kerning": [ { "left": "public.kern1.round", "right": "a", "value": -10 } ],
        "features": "languagesystem DFLT dflt;"
    }"#;

    #[test]
    fn parse_font_source() {
        let font = FontSource::from_json(SAMPLE).unwrap();
        assert_eq!(font.glyph_names(), vec!["a", "b", "acutecomb"]);
        assert_eq!(font.advance_width("a"), Some(300));
        assert_eq!(font.category("acutecomb"), Some(GlyphCategory::Mark));
        assert_eq!(font.category("a"), None);
        assert!(font.is_exported("a"));
        assert!(!font.is_exported("b"));
        assert!(!font.is_exported("missing"));
        assert_eq!(font.group("public.kern1.round").unwrap().len(), 2);
        assert_eq!(font.kerning()[0].value, -10);
        assert_eq!(font.x_height(), Some(500));
        assert_eq!(font.display_name(), "Sample Bold");
    }

    #[test]
    fn duplicate_glyphs_are_host_data_errors() {
        let json = r#"{ "glyphs": [ { "name": "a", "width": 1 }, { "name": "a", "width": 2 } ] }"#;
        assert!(matches!(
            FontSource::from_json(json),
            Err(FlowError::HostData(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            FontSource::from_json("{ glyphs: }"),
            Err(FlowError::Parse(_))
        ));
    }

    #[test]
    fn add_glyph_records_category() {
        let mut font = FontSource::new();
        font.add_glyph(Glyph::new("_start", 0), GlyphCategory::Mark)
            .unwrap();
        assert_eq!(font.category("_start"), Some(GlyphCategory::Mark));
        assert!(font
            .add_glyph(Glyph::new("_start", 0), GlyphCategory::Mark)
            .is_err());
    }

    #[test]
    fn append_features_and_style() {
        let mut font = FontSource::from_json(SAMPLE).unwrap();
        font.append_features("feature rlig { } rlig;\n");
        assert_eq!(
            font.features,
            "languagesystem DFLT dflt;\nfeature rlig { } rlig;\n"
        );
        font.append_style_suffix(" Flow");
        assert_eq!(font.info.style_name.as_deref(), Some("Bold Flow"));

        let mut bare = FontSource::new();
        bare.append_style_suffix(" Flow");
        assert_eq!(bare.info.style_name.as_deref(), Some("Regular Flow"));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.json");
        let font = FontSource::from_json(SAMPLE).unwrap();
        font.save(&path).unwrap();
        assert_eq!(FontSource::load(&path).unwrap(), font);
    }

    #[test]
    fn contour_bounds() {
        let contour = Contour {
            points: vec![
                ContourPoint { x: 20.0, y: 0.0, kind: PointKind::Move },
                ContourPoint { x: 250.0, y: 500.0, kind: PointKind::Line },
            ],
        };
        assert_eq!(contour.x_bounds(), Some((20.0, 250.0)));
        assert_eq!(Contour::default().x_bounds(), None);
    }
}
