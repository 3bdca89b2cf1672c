//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed working directories and env vars.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use gcw_config::{ConfigError, GcwConfig};
use gcw_core::{AccessPolicy, CallStyle, ClosureStrategy};
use pretty_assertions::assert_eq;

#[test]
fn loads_every_section_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[pointer]
template = "gc::ref"
trait_helper = "is_traced"

[instrument]
access = "restricted"
call_style = "dispatch"
closure = "two-pass"
trace_annotation = "gc::Trace"

[output]
generated_dir = "gen"
skip_headers = ["gc_ref.hpp", "runtime.hpp"]
project_root = "/work/app"

[compiler]
program = "g++-14"

[lint]
enabled = false
allowed_context = "std::jthread"
"#,
        )?;

        let figment = Figment::from(Serialized::defaults(GcwConfig::default()))
            .merge(Toml::file("config.toml"));
        let config = GcwConfig::from_figment(&figment).expect("valid config");

        assert_eq!(config.pointer.template, "gc::ref");
        assert_eq!(config.instrument.access, AccessPolicy::Restricted);
        assert_eq!(config.instrument.call_style, CallStyle::Dispatch);
        assert_eq!(config.instrument.closure, ClosureStrategy::TwoPass);
        assert_eq!(config.output.generated_dir, "gen");
        assert!(config.output.skips("runtime.hpp"));
        assert!(!config.output.skips("gc_ptr.hpp"));
        assert_eq!(
            config.output.project_root.as_deref(),
            Some(std::path::Path::new("/work/app"))
        );
        assert_eq!(config.compiler.program, "g++-14");
        assert!(!config.lint.enabled);

        let options = config.instrument_options();
        assert_eq!(options.pointer.qualify("call_ConnectBaseToRoot"), "gc::call_ConnectBaseToRoot");
        Ok(())
    });
}

#[test]
fn partial_sections_keep_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[instrument]
call_style = "dispatch"
"#,
        )?;

        let config: GcwConfig = Figment::from(Serialized::defaults(GcwConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.instrument.call_style, CallStyle::Dispatch);
        assert_eq!(config.instrument.access, AccessPolicy::Public);
        assert_eq!(config.pointer.template, "memory::gc_ptr");
        assert_eq!(config.output.skip_headers, vec!["gc_ptr.hpp"]);
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up_by_default_chain() {
    Jail::expect_with(|jail| {
        jail.create_dir(".gcwire")?;
        jail.create_file(
            ".gcwire/config.toml",
            r#"
[compiler]
program = "clang++-18"
"#,
        )?;

        let config = GcwConfig::load().expect("config loads");
        assert_eq!(config.compiler.program, "clang++-18");
        Ok(())
    });
}

#[test]
fn restricted_direct_combination_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[instrument]
access = "restricted"
"#,
        )?;

        let figment = Figment::from(Serialized::defaults(GcwConfig::default()))
            .merge(Toml::file("config.toml"));
        let err = GcwConfig::from_figment(&figment).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "instrument.call_style"));
        Ok(())
    });
}

#[test]
fn unknown_enum_value_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[instrument]
closure = "three-pass"
"#,
        )?;

        let figment = Figment::from(Serialized::defaults(GcwConfig::default()))
            .merge(Toml::file("config.toml"));
        let err = GcwConfig::from_figment(&figment).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
        Ok(())
    });
}
