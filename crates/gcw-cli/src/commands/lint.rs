use gcw_config::GcwConfig;
use gcw_parser::{LambdaCaptureLint, LintViolation};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::LintArgs;
use crate::commands::shared;
use crate::invocation::SearchPaths;
use crate::output::output;

#[derive(Debug, Serialize)]
struct LintReport {
    violations: Vec<LintViolation>,
}

/// Runs the lint even when `lint.enabled` is off; exits 1 on violations.
pub fn handle(args: &LintArgs, config: &GcwConfig, flags: &GlobalFlags) -> anyhow::Result<i32> {
    let search = SearchPaths {
        include: args.include.clone(),
        quote: Vec::new(),
    };
    let frontend = shared::frontend(config, &search);
    let lint = LambdaCaptureLint::new(&config.pointer.to_template(), &config.lint.allowed_context);

    let mut violations = Vec::new();
    for file in &args.files {
        let unit = shared::parse_unit(&frontend, file)?;
        for violation in lint.check_unit(&unit) {
            if !violations.contains(&violation) {
                violations.push(violation);
            }
        }
    }

    let failed = !violations.is_empty();
    output(&LintReport { violations }, flags.format)?;
    Ok(i32::from(failed))
}
