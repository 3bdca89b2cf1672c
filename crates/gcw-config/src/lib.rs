//! # gcw-config
//!
//! Layered configuration loading for gcwire using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`GCWIRE_*` prefix, `__` as separator)
//! 2. Project-level `.gcwire/config.toml`
//! 3. User-level `~/.config/gcwire/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `GCWIRE_INSTRUMENT__ACCESS` -> `instrument.access`,
//! `GCWIRE_COMPILER__PROGRAM` -> `compiler.program`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use gcw_config::GcwConfig;
//!
//! let config = GcwConfig::load_with_dotenv().expect("config");
//! let options = config.instrument_options();
//! println!("instrumenting {}", options.pointer.template);
//! ```

mod compiler;
mod error;
mod instrument;
mod lint;
mod output;
mod pointer;

pub use compiler::CompilerConfig;
pub use error::ConfigError;
pub use instrument::InstrumentConfig;
pub use lint::LintConfig;
pub use output::OutputConfig;
pub use pointer::PointerConfig;

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use gcw_core::{AccessPolicy, CallStyle, InstrumentOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GcwConfig {
    #[serde(default)]
    pub pointer: PointerConfig,
    #[serde(default)]
    pub instrument: InstrumentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub lint: LintConfig,
}

impl GcwConfig {
    /// Load and validate configuration from all sources (TOML files +
    /// environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when a source cannot be read or a
    /// value has the wrong shape, and [`ConfigError::InvalidValue`] when the
    /// merged values are inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and the CLI can layer additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".gcwire/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("GCWIRE_").split("__"))
    }

    /// Reject combinations the generated code cannot compile with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pointer.template.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "pointer.template".to_string(),
                reason: "must name the managed-pointer template".to_string(),
            });
        }
        if self.instrument.access == AccessPolicy::Restricted
            && self.instrument.call_style == CallStyle::Direct
        {
            return Err(ConfigError::InvalidValue {
                field: "instrument.call_style".to_string(),
                reason: "restricted access needs the dispatch call style; direct calls \
                         into protected members of field types do not compile"
                    .to_string(),
            });
        }
        if self.output.generated_dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.generated_dir".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Options handed to the instrumentation pipeline.
    #[must_use]
    pub fn instrument_options(&self) -> InstrumentOptions {
        InstrumentOptions {
            pointer: self.pointer.to_template(),
            access: self.instrument.access,
            call_style: self.instrument.call_style,
            closure: self.instrument.closure,
            trace_annotation: self.instrument.trace_annotation.clone(),
        }
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcwire").join("config.toml"))
    }
}
