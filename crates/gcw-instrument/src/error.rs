//! Error and diagnostic types for the instrumentation pipeline.
//!
//! Errors abort the whole run before anything is written. Diagnostics are
//! recoverable: the offending class is skipped and the rest of the unit is
//! still rewritten.

use std::fmt;
use std::path::PathBuf;

use gcw_core::{AccessPolicy, ClassKey};
use serde::Serialize;
use thiserror::Error;

/// Fatal instrumentation errors.
#[derive(Debug, Error)]
pub enum InstrumentError {
    /// A file already holds generated blocks under another access convention.
    #[error(
        "{file}:{line}: generated block is emitted under '{found}' access but the configured policy is '{expected}'"
    )]
    ConflictingAccessPolicy {
        file: String,
        line: u32,
        found: AccessPolicy,
        expected: AccessPolicy,
    },

    /// A begin marker without a matching end marker (or the reverse).
    #[error("{file}:{line}: unbalanced generated-block markers")]
    UnbalancedMarkers { file: String, line: u32 },
}

/// Category of a recoverable problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The byte at the computed brace position is not `}`.
    AmbiguousInsertion,
    /// An extent points into a file whose text the front end did not capture.
    MissingSource,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AmbiguousInsertion => "ambiguous insertion",
            Self::MissingSource => "missing source",
        };
        write!(f, "{s}")
    }
}

/// A recoverable problem attached to one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    pub class: ClassKey,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} for {}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.kind,
            self.class,
            self.message
        )
    }
}
