//! Compiler error types.
//!
//! Covers every way a flowify compilation can fail: configuration,
//! values the number system cannot represent, unusable host data, engine
//! limits, and the I/O and parsing of outer surfaces.

use thiserror::Error;

use flowify_ir::IrError;

/// Errors that can occur while compiling a flow font.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Invalid configuration, raised before any rule is built.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A value falls outside the range the number system can encode without
    /// aliasing another value.
    #[error("Overflow risk: {value} is outside the encodable range [{min}, {max}]")]
    OverflowRisk { value: i64, min: i64, max: i64 },

    /// Required host font data is missing or malformed.
    #[error("Host data error: {0}")]
    HostData(String),

    /// The generated program would exceed a limit of the shaping engine.
    #[error("Resource limit exceeded at '{key}': {detail}")]
    ResourceLimit { key: String, detail: String },

    /// Rule graph construction or serialization failed.
    #[error(transparent)]
    Ir(IrError),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A font or configuration document could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<IrError> for FlowError {
    fn from(e: IrError) -> Self {
        match e {
            IrError::LimitExceeded { key, detail } => Self::ResourceLimit { key, detail },
            other => Self::Ir(other),
        }
    }
}

/// Result type for compiler operations.
pub type FlowResult<T> = Result<T, FlowError>;
