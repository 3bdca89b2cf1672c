//! ast-grep wrapper and C/C++ file classification by extension.

use std::path::Path;

use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_language::SupportLang;

/// The concrete AST tree type returned by `parse_source`.
pub type AstTree = ast_grep_core::AstGrep<StrDoc<SupportLang>>;

const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cp", "cpp", "cxx", "c++", "C", "CPP", "mm"];
const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hp", "hpp", "hxx", "h++", "H", "inl", "ipp", "tpp"];

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Whether `path` names a compilable C or C++ translation unit.
#[must_use]
pub fn is_cpp_source(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Whether `path` names a C or C++ header.
#[must_use]
pub fn is_header(path: &Path) -> bool {
    extension(path).is_some_and(|ext| HEADER_EXTENSIONS.contains(&ext))
}

/// Grammar used for a path, `None` for anything that is not C or C++.
///
/// C sources are read with the C++ grammar as well: classes never appear in
/// them, so nothing is instrumented, but the lint still runs.
#[must_use]
pub fn detect_language(path: &Path) -> Option<SupportLang> {
    (is_cpp_source(path) || is_header(path)).then_some(SupportLang::Cpp)
}

/// Parse source code into an ast-grep tree for the given language.
#[must_use]
pub fn parse_source(source: &str, lang: SupportLang) -> AstTree {
    use ast_grep_language::LanguageExt;
    lang.ast_grep(source)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("src/main.cpp", true, false)]
    #[case("lib/util.cc", true, false)]
    #[case("legacy.c", true, false)]
    #[case("include/graph.hpp", false, true)]
    #[case("include/graph.h", false, true)]
    #[case("build/main.o", false, false)]
    #[case("libfoo.a", false, false)]
    #[case("Makefile", false, false)]
    fn classifies_by_extension(#[case] path: &str, #[case] source: bool, #[case] header: bool) {
        assert_eq!(is_cpp_source(Path::new(path)), source);
        assert_eq!(is_header(Path::new(path)), header);
    }

    #[test]
    fn detect_cpp_for_sources_and_headers() {
        assert_eq!(detect_language(Path::new("a.cpp")), Some(SupportLang::Cpp));
        assert_eq!(detect_language(Path::new("a.hpp")), Some(SupportLang::Cpp));
        assert_eq!(detect_language(Path::new("a.rs")), None);
    }

    #[test]
    fn parse_cpp_class() {
        let tree = parse_source("class A { int x; };", SupportLang::Cpp);
        let root = tree.root();
        assert_eq!(root.kind().as_ref(), "translation_unit");
        assert!(
            root.children()
                .any(|c| c.kind().as_ref() == "class_specifier")
        );
    }
}
