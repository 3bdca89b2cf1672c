//! Lambda-capture lint settings.

use serde::{Deserialize, Serialize};

const fn default_enabled() -> bool {
    true
}

fn default_allowed_context() -> String {
    "std::thread".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LintConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Construction context in which capturing a managed pointer is allowed.
    #[serde(default = "default_allowed_context")]
    pub allowed_context: String,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            allowed_context: default_allowed_context(),
        }
    }
}
