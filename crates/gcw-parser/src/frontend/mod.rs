//! C++ front end: parses a main file plus the headers it includes and
//! lowers everything into one [`TranslationUnit`].
//!
//! Includes are followed textually, so a header's classes appear in the tree
//! at the point of inclusion. Each file is parsed at most once per unit.
//! Headers that cannot be found are outside the analyzed unit and are
//! skipped.

mod lines;
mod lower;

pub use lines::LineIndex;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use gcw_core::{SyntaxNode, TranslationUnit};
use tracing::{debug, warn};

use crate::error::ParserError;
use crate::parser::detect_language;

/// Include search configuration for one compiler invocation.
#[derive(Debug, Clone, Default)]
pub struct CppFrontend {
    include_paths: Vec<PathBuf>,
    quote_paths: Vec<PathBuf>,
    skipped_headers: Vec<String>,
}

impl CppFrontend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories searched for both `"..."` and `<...>` includes (`-I`, `-isystem`).
    #[must_use]
    pub fn with_include_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.include_paths.extend(paths);
        self
    }

    /// Directories searched for `"..."` includes only (`-iquote`).
    #[must_use]
    pub fn with_quote_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.quote_paths.extend(paths);
        self
    }

    /// Header file names that are never followed.
    #[must_use]
    pub fn with_skipped_headers(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.skipped_headers.extend(names);
        self
    }

    /// Parse `main` and everything it includes.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::UnsupportedLanguage`] for non-C/C++ paths,
    /// [`ParserError::Read`] when the main file cannot be read and
    /// [`ParserError::ParseFailed`] when it is not text. Unreadable headers
    /// are logged and skipped; syntax errors are logged and the parser's
    /// recovery is trusted.
    pub fn parse_translation_unit(&self, main: &Path) -> Result<TranslationUnit, ParserError> {
        if detect_language(main).is_none() {
            return Err(ParserError::UnsupportedLanguage(main.display().to_string()));
        }
        let main = fs::canonicalize(main).map_err(|source| ParserError::Read {
            path: main.display().to_string(),
            source,
        })?;
        let text = fs::read_to_string(&main).map_err(|source| {
            if source.kind() == std::io::ErrorKind::InvalidData {
                ParserError::ParseFailed {
                    file: main.display().to_string(),
                    message: "source is not valid UTF-8".to_string(),
                }
            } else {
                ParserError::Read {
                    path: main.display().to_string(),
                    source,
                }
            }
        })?;
        Ok(self.parse_text(main, text))
    }

    /// Parse in-memory text as if it were the file at `path`.
    ///
    /// Includes are still resolved on disk relative to `path`.
    #[must_use]
    pub fn parse_text(&self, path: impl Into<PathBuf>, text: impl Into<String>) -> TranslationUnit {
        let path = path.into();
        let mut builder = UnitBuilder {
            frontend: self,
            visited: BTreeSet::new(),
            sources: BTreeMap::new(),
        };
        let children = builder.lower_file(&path, text.into());
        let mut unit = TranslationUnit::new(
            path,
            SyntaxNode::translation_unit().with_children(children),
        );
        unit.sources = builder.sources;
        unit
    }

    fn resolve_include(&self, target: &str, quoted: bool, from: &Path) -> Option<PathBuf> {
        let local = quoted
            .then(|| from.parent().map(|dir| dir.join(target)))
            .flatten();
        let quote_dirs = self
            .quote_paths
            .iter()
            .filter(|_| quoted)
            .map(|dir| dir.join(target));
        let include_dirs = self.include_paths.iter().map(|dir| dir.join(target));

        local
            .into_iter()
            .chain(quote_dirs)
            .chain(include_dirs)
            .find(|candidate| candidate.is_file())
            .and_then(|found| fs::canonicalize(found).ok())
    }

    fn is_skipped(&self, target: &str) -> bool {
        let name = Path::new(target)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(target);
        self.skipped_headers.iter().any(|h| h == name)
    }
}

/// Per-unit state while files are lowered.
struct UnitBuilder<'f> {
    frontend: &'f CppFrontend,
    visited: BTreeSet<PathBuf>,
    sources: BTreeMap<PathBuf, String>,
}

impl UnitBuilder<'_> {
    fn lower_file(&mut self, path: &Path, text: String) -> Vec<SyntaxNode> {
        self.visited.insert(path.to_path_buf());
        let nodes = lower::lower_file(self, path, &text);
        self.sources.insert(path.to_path_buf(), text);
        nodes
    }

    /// Lower an included header, or nothing if it was seen, skipped or not found.
    fn include(&mut self, target: &str, quoted: bool, from: &Path) -> Vec<SyntaxNode> {
        if self.frontend.is_skipped(target) {
            debug!(header = target, "include skipped by configuration");
            return Vec::new();
        }
        let Some(path) = self.frontend.resolve_include(target, quoted, from) else {
            debug!(header = target, from = %from.display(), "include not found; outside the unit");
            return Vec::new();
        };
        if self.visited.contains(&path) {
            return Vec::new();
        }
        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!(header = %path.display(), "following include");
                self.lower_file(&path, text)
            }
            Err(error) => {
                warn!(header = %path.display(), %error, "cannot read included header");
                self.visited.insert(path);
                Vec::new()
            }
        }
    }
}
