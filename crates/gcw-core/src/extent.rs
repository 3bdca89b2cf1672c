//! Source locations and extents.
//!
//! Lines and columns are 1-based. Columns count bytes, not characters, so a
//! column can be turned into a slice index of the line text directly. An
//! extent's end column points one past its last byte, the way clang reports
//! cursor extents: for a class body the byte at `end.column - 2` (0-based) is
//! the closing brace.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// A single position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start/end pair without the file; the grouping key inside one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    /// Whether `at` lies inside the span (end exclusive).
    #[must_use]
    pub fn contains(&self, at: Location) -> bool {
        self.start <= at && at < self.end
    }

    /// Whether `other` lies inside this span and is not the same span.
    #[must_use]
    pub fn strictly_encloses(&self, other: &Self) -> bool {
        self != other && self.start <= other.start && other.end <= self.end
    }
}

/// A source range in a specific file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub file: PathBuf,
    pub start: Location,
    pub end: Location,
}

impl Extent {
    /// Build a validated extent.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidExtent`] if any line or column is zero or
    /// the end precedes the start.
    pub fn new(
        file: impl Into<PathBuf>,
        start: Location,
        end: Location,
    ) -> Result<Self, ModelError> {
        let file = file.into();
        if start.line == 0 || start.column == 0 || end.line == 0 || end.column == 0 {
            return Err(ModelError::InvalidExtent {
                file: file.display().to_string(),
                reason: format!("lines and columns are 1-based, got {start}..{end}"),
            });
        }
        if end < start {
            return Err(ModelError::InvalidExtent {
                file: file.display().to_string(),
                reason: format!("end {end} precedes start {start}"),
            });
        }
        Ok(Self { file, start, end })
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
        }
    }

    /// Zero-based byte index of the closing brace on the end line.
    #[must_use]
    pub fn closing_brace_index(&self) -> Option<usize> {
        (self.end.column as usize).checked_sub(2)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}",
            self.file.display(),
            self.start,
            self.end
        )
    }
}
