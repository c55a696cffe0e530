//! # flowify-compiler
//!
//! Turns a font into a *flow font*: every word renders as a slug whose
//! length is the sum of the advance widths of its letters. The arithmetic
//! is compiled into OpenType substitution routines and run by the shaping
//! engine at display time; nothing here executes it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Flowifier                           │
//! │  FlowConfig ─► threshold ─► range checks ─► HostFont     │
//! ├──────────────────────────────────────────────────────────┤
//! │  Alphabet & Radix (encode)                               │
//! │      │                 │                                 │
//! │      ▼                 ▼                                 │
//! │  AdderCompiler    KerningInjector     Comparator         │
//! │  (add / place     (one routine        (bigger-than       │
//! │   caches)          per value)          patterns)         │
//! │      └────────────┬────┴──────────────────┘              │
//! │                   ▼                                      │
//! │           PipelineAssembler ─► Program                   │
//! ├──────────────────────────────────────────────────────────┤
//! │  flowify-ir: FeatureGraph ─► LimitVerifier ─► FEA text   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use flowify_compiler::{FlowConfig, Flowifier, FontSource};
//!
//! let mut font = FontSource::load("Sample.json")?;
//! let artifact = Flowifier::with_config(FlowConfig::default()).compile(&mut font)?;
//! println!("{} routines", artifact.routine_count);
//! font.save("SampleFlow.json")?;
//! # Ok::<(), flowify_compiler::FlowError>(())
//! ```

#![deny(unsafe_code)]

pub mod adder;
pub mod alphabet;
pub mod comparator;
pub mod compiler;
pub mod config;
pub mod drawing;
pub mod error;
pub mod font;
pub mod kerning;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────

pub use adder::AdderCompiler;
pub use alphabet::{
    carry_name, Alphabet, DigitGlyph, EncodedValue, Radix, END, SLUG_LEFT, SLUG_RIGHT, START,
};
pub use comparator::Comparator;
pub use compiler::{FlowArtifact, Flowifier, STYLE_SUFFIX};
pub use config::{FlowConfig, NumberSystem, SlugHeight, SlugShape};
pub use error::{FlowError, FlowResult};
pub use font::{
    Contour, ContourPoint, FontInfo, FontSource, Glyph, HostFont, KerningPair, PointKind,
};
pub use kerning::{resolve_pairs, KerningInjector, ResolvedPair};
pub use pipeline::{Assembly, PipelineAssembler, RunScope, Stage};
