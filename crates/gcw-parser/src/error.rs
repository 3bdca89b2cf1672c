//! Parser error types for gcw-parser.

/// Errors that can occur while building a translation unit.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("Parse failed for {file}: {message}")]
    ParseFailed { file: String, message: String },

    #[error("Not a C or C++ source file: {0}")]
    UnsupportedLanguage(String),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
