//! Rule-graph error types.
//!
//! Covers failures while building the routine arena, verifying a feature
//! graph against engine limits, and serializing it to feature syntax.

use thiserror::Error;

/// Errors that can occur in rule-graph operations.
#[derive(Debug, Error)]
pub enum IrError {
    /// A routine with the same name is already registered in the arena.
    #[error("Duplicate routine: {0}")]
    DuplicateRoutine(String),

    /// A rule or feature references a routine id the arena does not hold.
    #[error("Unknown routine reference: {0}")]
    UnknownRoutine(String),

    /// A rule is structurally malformed (empty glyph set, mismatched arity).
    #[error("Malformed rule in routine '{routine}': {detail}")]
    MalformedRule { routine: String, detail: String },

    /// The graph would exceed a limit of the shaping engine.
    #[error("Engine limit exceeded at '{key}': {detail}")]
    LimitExceeded { key: String, detail: String },

    /// Serialization failed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

/// Result type for rule-graph operations.
pub type IrResult<T> = Result<T, IrError>;
