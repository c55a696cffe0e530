//! Compilation configuration.
//!
//! Loaded from TOML; every field has a default so a partial file (or no
//! file at all) is valid:
//!
//! ```toml
//! slug_height = "x"        # "x", "cap", or font units
//! number_system = "production"
//! shape = "pill"
//! blank = true
//! margin = 20
//! feature = "rlig"
//! max_kern_rules = 20
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::alphabet::Radix;
use crate::error::{FlowError, FlowResult};

// ── Slug Height ──────────────────────────────────────────────────────

/// Threshold height `H`: a font metric preset or a literal value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugHeight {
    /// The font's x-height.
    #[default]
    X,
    /// The font's cap-height.
    Cap,
    /// A literal height in font units.
    #[serde(untagged)]
    Units(i64),
}

impl std::str::FromStr for SlugHeight {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "x" => Ok(Self::X),
            "cap" => Ok(Self::Cap),
            other => other.parse::<i64>().map(Self::Units).map_err(|_| {
                FlowError::Configuration(format!(
                    "slug height must be 'x', 'cap', or an integer, got '{}'",
                    other
                ))
            }),
        }
    }
}

impl std::fmt::Display for SlugHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Cap => write!(f, "cap"),
            Self::Units(n) => write!(f, "{}", n),
        }
    }
}

// ── Number System ────────────────────────────────────────────────────

/// The `(BASE, PLACES)` pair digits are written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberSystem {
    /// Base 4 with 7 places: few glyphs per digit, range up to 16383.
    #[default]
    Production,
    /// Base 10 with 4 places: glyph names read as decimal numbers.
    Debugging,
    #[serde(untagged)]
    Custom { base: u32, places: u32 },
}

impl NumberSystem {
    pub fn base_and_places(&self) -> (u32, u32) {
        match *self {
            Self::Production => (4, 7),
            Self::Debugging => (10, 4),
            Self::Custom { base, places } => (base, places),
        }
    }

    pub fn radix(&self) -> FlowResult<Radix> {
        let (base, places) = self.base_and_places();
        Radix::new(base, places)
    }
}

// ── Slug Shape ───────────────────────────────────────────────────────

/// How a run is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugShape {
    /// Rounded caps on runs longer than the slug height, blanks otherwise.
    #[default]
    Pill,
    /// A plain bar of exactly the summed width.
    Rectangle,
}

impl std::str::FromStr for SlugShape {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pill" => Ok(Self::Pill),
            "rectangle" => Ok(Self::Rectangle),
            other => Err(FlowError::Configuration(format!(
                "shape must be 'pill' or 'rectangle', got '{}'",
                other
            ))),
        }
    }
}

// ── Flow Config ──────────────────────────────────────────────────────

/// Everything one compilation needs besides the host font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub slug_height: SlugHeight,
    pub number_system: NumberSystem,
    pub shape: SlugShape,
    /// Replace short runs with invisible glyphs of the same width.
    pub blank: bool,
    /// Inset of each cap's outer edge.
    pub margin: i64,
    /// Feature tag the program is registered under.
    pub feature: String,
    /// Ceiling on chaining rules per kerning routine.
    pub max_kern_rules: usize,
    /// Add `w.zero` .. `w.forty-nine` for typing widths directly.
    pub debugging_glyphs: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            slug_height: SlugHeight::default(),
            number_system: NumberSystem::default(),
            shape: SlugShape::default(),
            blank: true,
            margin: 20,
            feature: "rlig".into(),
            max_kern_rules: 20,
            debugging_glyphs: false,
        }
    }
}

impl FlowConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> FlowResult<Self> {
        toml::from_str(contents).map_err(|e| FlowError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> FlowResult<String> {
        toml::to_string(self).map_err(|e| FlowError::Parse(e.to_string()))
    }

    /// Switch to the debugging number system and glyphs.
    pub fn debugging(mut self) -> Self {
        self.number_system = NumberSystem::Debugging;
        self.debugging_glyphs = true;
        self
    }

    /// Check every setting that does not depend on the host font.
    pub fn validate(&self) -> FlowResult<Radix> {
        let radix = self.number_system.radix()?;

        if let SlugHeight::Units(h) = self.slug_height {
            if h <= 0 {
                return Err(FlowError::Configuration(format!(
                    "slug height must be positive, got {}",
                    h
                )));
            }
        }
        if self.margin < 0 {
            return Err(FlowError::Configuration(format!(
                "margin must not be negative, got {}",
                self.margin
            )));
        }
        if self.feature.is_empty()
            || self.feature.len() > 4
            || !self.feature.chars().all(|c| c.is_ascii_graphic())
        {
            return Err(FlowError::Configuration(format!(
                "feature tag must be 1-4 printable ASCII characters, got '{}'",
                self.feature
            )));
        }
        if self.max_kern_rules == 0 {
            return Err(FlowError::Configuration(
                "kerning rule cap must be at least 1".into(),
            ));
        }
        Ok(radix)
    }
}
