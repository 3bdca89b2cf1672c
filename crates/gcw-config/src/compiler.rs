//! The real compiler behind the wrapper.

use serde::{Deserialize, Serialize};

fn default_program() -> String {
    "clang++".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompilerConfig {
    /// Program invoked with the rewritten command line.
    #[serde(default = "default_program")]
    pub program: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}
