//! Compiler command-line handling for the compile wrapper.

use std::path::{Path, PathBuf};

use gcw_parser::is_cpp_source;

/// Flags whose value is the next argument when written separately.
const VALUE_FLAGS: &[&str] = &[
    "-o", "-MF", "-MT", "-MQ", "-I", "-iquote", "-isystem", "-idirafter", "-include", "-imacros",
    "-D", "-U", "-x", "-isysroot", "--sysroot", "-target", "-arch", "-Xclang",
];

/// Output and dependency-file flags dropped from the parse arguments,
/// together with their value.
const DROPPED_WITH_VALUE: &[&str] = &["-o", "-MF", "-MT", "-MQ"];

/// Flags dropped from the parse arguments on their own.
const DROPPED_FLAGS: &[&str] = &["-c", "-M", "-MM", "-MD", "-MMD", "-MP", "-MG"];

/// Include search directories named on a command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    /// `-I` and `-isystem` directories.
    pub include: Vec<PathBuf>,
    /// `-iquote` directories.
    pub quote: Vec<PathBuf>,
}

impl SearchPaths {
    /// Resolve relative directories against `base`.
    #[must_use]
    pub fn resolved_against(self, base: &Path) -> Self {
        let resolve = |dirs: Vec<PathBuf>| dirs.into_iter().map(|d| base.join(d)).collect();
        Self {
            include: resolve(self.include),
            quote: resolve(self.quote),
        }
    }
}

/// One compiler invocation, without the program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    args: Vec<String>,
    source: Option<usize>,
}

impl CompileCommand {
    /// Locate the translation unit among `args`.
    ///
    /// The source is the first argument with a C or C++ source extension
    /// that is not the value of a flag such as `-o` or `-MF`.
    #[must_use]
    pub fn parse(args: Vec<String>) -> Self {
        let mut source = None;
        let mut skip_next = false;
        for (index, arg) in args.iter().enumerate() {
            if skip_next {
                skip_next = false;
                continue;
            }
            if VALUE_FLAGS.contains(&arg.as_str()) {
                skip_next = true;
                continue;
            }
            if !arg.starts_with('-') && is_cpp_source(Path::new(arg)) {
                source = Some(index);
                break;
            }
        }
        Self { args, source }
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The translation unit, if this invocation compiles one.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.map(|index| Path::new(&self.args[index]))
    }

    /// Arguments a parse of the unit would need: the command line without
    /// the source, `-c`, the output and dependency-file flags.
    #[must_use]
    pub fn parse_args(&self) -> Vec<String> {
        let mut kept = Vec::with_capacity(self.args.len());
        let mut iter = self.args.iter().enumerate();
        while let Some((index, arg)) = iter.next() {
            if Some(index) == self.source || DROPPED_FLAGS.contains(&arg.as_str()) {
                continue;
            }
            if DROPPED_WITH_VALUE.contains(&arg.as_str()) {
                iter.next();
                continue;
            }
            if arg.len() > 2 && DROPPED_WITH_VALUE.iter().any(|f| arg.starts_with(f)) {
                continue;
            }
            kept.push(arg.clone());
        }
        kept
    }

    /// `-I`, `-isystem` and `-iquote` directories, joined or separate form.
    #[must_use]
    pub fn search_paths(&self) -> SearchPaths {
        let mut paths = SearchPaths::default();
        let args = self.parse_args();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let (quoted, value) = match arg.as_str() {
                "-I" | "-isystem" => (false, iter.next().cloned()),
                "-iquote" => (true, iter.next().cloned()),
                other => {
                    if let Some(dir) = other.strip_prefix("-iquote") {
                        (true, Some(dir.to_string()))
                    } else if let Some(dir) = other.strip_prefix("-isystem") {
                        (false, Some(dir.to_string()))
                    } else if let Some(dir) = other.strip_prefix("-I") {
                        (false, Some(dir.to_string()))
                    } else {
                        continue;
                    }
                }
            };
            let Some(dir) = value.filter(|d| !d.is_empty()) else {
                continue;
            };
            if quoted {
                paths.quote.push(PathBuf::from(dir));
            } else {
                paths.include.push(PathBuf::from(dir));
            }
        }
        paths
    }

    /// The command line to hand to the real compiler: `prefix`, then the
    /// original arguments with the source replaced by `shadow_source`.
    #[must_use]
    pub fn with_shadow_source(&self, shadow_source: &Path, prefix: Vec<String>) -> Vec<String> {
        let mut args = prefix;
        args.extend(self.args.iter().enumerate().map(|(index, arg)| {
            if Some(index) == self.source {
                shadow_source.display().to_string()
            } else {
                arg.clone()
            }
        }));
        args
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn command(args: &[&str]) -> CompileCommand {
        CompileCommand::parse(args.iter().map(ToString::to_string).collect())
    }

    #[rstest]
    #[case(&["-c", "src/main.cpp", "-o", "main.o"], Some("src/main.cpp"))]
    #[case(&["-o", "odd.cpp", "-c", "real.cc"], Some("real.cc"))]
    #[case(&["-MF", "dep.cpp", "-MT", "t.cpp", "x.cxx"], Some("x.cxx"))]
    #[case(&["main.o", "util.o", "-o", "app"], None)]
    #[case(&["--version"], None)]
    fn finds_the_translation_unit(#[case] args: &[&str], #[case] expected: Option<&str>) {
        assert_eq!(command(args).source(), expected.map(Path::new));
    }

    #[test]
    fn parse_args_drop_output_and_dependency_flags() {
        let cmd = command(&[
            "-DNDEBUG", "-Iinclude", "-MD", "-MF", "main.d", "-c", "main.cpp", "-o", "main.o",
            "-std=c++17", "-omain2.o",
        ]);
        assert_eq!(cmd.parse_args(), vec!["-DNDEBUG", "-Iinclude", "-std=c++17"]);
    }

    #[test]
    fn search_paths_accept_joined_and_separate_forms() {
        let cmd = command(&[
            "-Iinclude", "-I", "third_party", "-isystem", "/usr/local/include", "-iquote", "src",
            "-iquotegen", "-c", "main.cpp",
        ]);
        let paths = cmd.search_paths();
        assert_eq!(
            paths.include,
            vec![
                PathBuf::from("include"),
                PathBuf::from("third_party"),
                PathBuf::from("/usr/local/include")
            ]
        );
        assert_eq!(paths.quote, vec![PathBuf::from("src"), PathBuf::from("gen")]);
    }

    #[test]
    fn shadow_source_replaces_only_the_source_argument() {
        let cmd = command(&["-c", "main.cpp", "-o", "main.o"]);
        let args = cmd.with_shadow_source(
            Path::new("/b/generated/internal_src/main.cpp"),
            vec!["-iquote".to_string(), "/p".to_string()],
        );
        assert_eq!(
            args,
            vec!["-iquote", "/p", "-c", "/b/generated/internal_src/main.cpp", "-o", "main.o"]
        );
    }

    #[test]
    fn resolved_against_joins_relative_directories() {
        let paths = SearchPaths {
            include: vec![PathBuf::from("inc"), PathBuf::from("/abs")],
            quote: vec![PathBuf::from("q")],
        }
        .resolved_against(Path::new("/build"));
        assert_eq!(paths.include, vec![PathBuf::from("/build/inc"), PathBuf::from("/abs")]);
        assert_eq!(paths.quote, vec![PathBuf::from("/build/q")]);
    }
}
