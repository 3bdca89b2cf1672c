//! Cross-cutting error types for gcwire.
//!
//! Domain-specific errors (`ParserError`, `InstrumentError`, `ConfigError`) are
//! defined in their respective crates. A unified error is deferred to
//! `gcw-cli` where all crate errors converge into `anyhow`.

use thiserror::Error;

/// Errors raised while building model values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A source extent is malformed (zero line/column or end before start).
    #[error("Invalid extent in {file}: {reason}")]
    InvalidExtent { file: String, reason: String },

    /// Data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}
