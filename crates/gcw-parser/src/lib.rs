//! # gcw-parser
//!
//! ast-grep-based C++ front end for gcwire.
//!
//! - [`CppFrontend`] parses a main file and the headers it includes into a
//!   [`gcw_core::TranslationUnit`], following includes textually and keeping
//!   the exact text of every file visited
//! - [`LambdaCaptureLint`] reports lambdas that capture managed pointers
//!   outside an allowed construction context
//!
//! The tree-sitter C++ grammar does not run the preprocessor: every branch
//! of an `#if` is lowered, and macros are not expanded.

pub mod error;
pub mod frontend;
pub mod lint;
pub mod parser;

pub use error::ParserError;
pub use frontend::{CppFrontend, LineIndex};
pub use lint::{LambdaCaptureLint, LintViolation};
pub use parser::{detect_language, is_cpp_source, is_header, parse_source};
