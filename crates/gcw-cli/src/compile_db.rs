//! `compile_commands.json` reading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::invocation::CompileCommand;

/// One entry of a JSON compilation database.
#[derive(Debug, Clone, Deserialize)]
pub struct CompileDbEntry {
    pub directory: PathBuf,
    pub file: PathBuf,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
}

impl CompileDbEntry {
    /// The main file, resolved against the entry's directory.
    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        self.directory.join(&self.file)
    }

    /// Compiler arguments without the program name.
    ///
    /// `command` strings are split on whitespace; quoted arguments with
    /// embedded spaces are not supported there, use `arguments` instead.
    #[must_use]
    pub fn compile_command(&self) -> CompileCommand {
        let args: Vec<String> = match (&self.arguments, &self.command) {
            (Some(arguments), _) => arguments.iter().skip(1).cloned().collect(),
            (None, Some(command)) => command.split_whitespace().skip(1).map(String::from).collect(),
            (None, None) => Vec::new(),
        };
        CompileCommand::parse(args)
    }
}

/// Read and parse a compilation database.
pub fn load(path: &Path) -> anyhow::Result<Vec<CompileDbEntry>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read compilation database {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid compilation database {}", path.display()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn command_and_arguments_forms_agree() {
        let entries: Vec<CompileDbEntry> = serde_json::from_str(
            r#"[
                {"directory": "/p/build", "file": "../src/a.cpp",
                 "command": "/usr/bin/clang++  -Iinc -c ../src/a.cpp -o a.o"},
                {"directory": "/p/build", "file": "../src/b.cpp",
                 "arguments": ["clang++", "-Iinc", "-c", "../src/b.cpp", "-o", "b.o"]}
            ]"#,
        )
        .expect("database should parse");

        assert_eq!(entries[0].source_path(), PathBuf::from("/p/build/../src/a.cpp"));
        let a = entries[0].compile_command();
        let b = entries[1].compile_command();
        assert_eq!(a.source(), Some(Path::new("../src/a.cpp")));
        assert_eq!(b.source(), Some(Path::new("../src/b.cpp")));
        assert_eq!(a.search_paths(), b.search_paths());
    }
}
