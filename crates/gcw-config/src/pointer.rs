//! Managed-pointer template configuration.

use gcw_core::PointerTemplate;
use serde::{Deserialize, Serialize};

fn default_template() -> String {
    PointerTemplate::default().template
}

fn default_trait_helper() -> String {
    PointerTemplate::default().trait_helper
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PointerConfig {
    /// Fully qualified managed-pointer template (e.g., `memory::gc_ptr`).
    #[serde(default = "default_template")]
    pub template: String,

    /// Trait-detection helper living in the template's namespace.
    #[serde(default = "default_trait_helper")]
    pub trait_helper: String,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            trait_helper: default_trait_helper(),
        }
    }
}

impl PointerConfig {
    #[must_use]
    pub fn to_template(&self) -> PointerTemplate {
        PointerTemplate {
            template: self.template.clone(),
            trait_helper: self.trait_helper.clone(),
        }
    }
}
