//! Where generated shadow files are written.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_generated_dir() -> String {
    "generated".to_string()
}

fn default_skip_headers() -> Vec<String> {
    vec!["gc_ptr.hpp".to_string()]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory under the build directory that receives shadow files.
    #[serde(default = "default_generated_dir")]
    pub generated_dir: String,

    /// Header file names never shadowed, even when they change.
    #[serde(default = "default_skip_headers")]
    pub skip_headers: Vec<String>,

    /// First-party tree. Defaults to the parent of the build directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            generated_dir: default_generated_dir(),
            skip_headers: default_skip_headers(),
            project_root: None,
        }
    }
}

impl OutputConfig {
    /// Whether a header with this file name is excluded from shadowing.
    #[must_use]
    pub fn skips(&self, file_name: &str) -> bool {
        self.skip_headers.iter().any(|h| h == file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_skip_the_pointer_header() {
        let config = OutputConfig::default();
        assert_eq!(config.generated_dir, "generated");
        assert!(config.skips("gc_ptr.hpp"));
        assert!(!config.skips("graph.hpp"));
    }
}
