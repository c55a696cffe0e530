//! # flowify-ir
//!
//! The abstract rewrite-rule graph that flowify compiles into, and the
//! tooling to check and serialize it.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                     FeatureGraph                       │
//! │  ┌──────────────────────────┐   ┌────────────────────┐ │
//! │  │ RoutineArena             │   │ Program (feature)  │ │
//! │  │  Routine ── Rule         │◄──│  ordered RoutineIds│ │
//! │  │     Substitution         │   └────────────────────┘ │
//! │  │     Chaining ─► RoutineId│   ┌────────────────────┐ │
//! │  └──────────────────────────┘   │ GDEF categories    │ │
//! │                                 └────────────────────┘ │
//! ├────────────────────────────────────────────────────────┤
//! │  LimitVerifier (5 aspects)  │  FeaSerializer / Json    │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Routines are owned by the arena and shared by handle; a chaining rule
//! never holds a copy of the routine it invokes.

#![deny(unsafe_code)]

pub mod error;
pub mod graph;
pub mod routine;
pub mod rules;
pub mod serialization;
pub mod types;
pub mod verifier;

// ── Re-exports ───────────────────────────────────────────────────────

pub use error::{IrError, IrResult};
pub use graph::{FeatureGraph, Program};
pub use routine::{Routine, RoutineArena};
pub use rules::{Chaining, Rule, Substitution};
pub use serialization::{
    FeaSerializer, FeatureFormat, FeatureSerializer, JsonSerializer, SerializedFeatures,
    FEA_HEADER,
};
pub use types::{GlyphCategory, GlyphSet, LookupFlags, RoutineId};
pub use verifier::{
    EngineLimits, GraphVerifier, LimitVerifier, VerificationAspect, VerificationReport,
    VerificationResult,
};
