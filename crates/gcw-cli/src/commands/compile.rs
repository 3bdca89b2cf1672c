//! `gcwire compile -- <compiler args>`: instrument into shadow files, then
//! compile the shadow of the main source.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use gcw_config::GcwConfig;
use tracing::{debug, info};

use crate::cli::root_commands::CompileArgs;
use crate::commands::shared;
use crate::invocation::CompileCommand;
use crate::paths::OutputLayout;
use crate::{write_lock, writer};

pub fn handle(args: &CompileArgs, config: &GcwConfig) -> anyhow::Result<i32> {
    let program = args
        .compiler
        .clone()
        .unwrap_or_else(|| config.compiler.program.clone());
    let command = CompileCommand::parse(args.args.clone());

    let Some(source) = command.source() else {
        debug!("no translation unit on the command line; passing through");
        return run_compiler(&program, command.args());
    };

    let build_dir = std::env::current_dir().context("failed to read current directory")?;
    debug!(parse_args = ?command.parse_args(), "parse arguments");
    let search = command.search_paths().resolved_against(&build_dir);
    let frontend = shared::frontend(config, &search);
    let report = shared::instrument_unit(config, &frontend, source)?;

    if report.changed().next().is_none() {
        debug!(source = %source.display(), "nothing to instrument; compiling the original");
        return run_compiler(&program, command.args());
    }

    let layout = OutputLayout::for_build_dir(&build_dir, &config.output);
    let main_file = &report.main_file;
    let shadow_main = layout.shadow_path(main_file);
    {
        let _lock = write_lock::acquire_for_generated_dir(layout.generated_dir())?;
        for rewrite in report.changed() {
            let target = layout.shadow_path(&rewrite.path);
            if writer::write_if_changed(&target, &rewrite.rewritten)? {
                info!(file = %target.display(), "shadow file written");
            }
        }
        if report.changed().all(|rewrite| rewrite.path != *main_file) {
            let original = std::fs::read_to_string(main_file)
                .with_context(|| format!("failed to read {}", main_file.display()))?;
            writer::write_if_changed(&shadow_main, &original)?;
        }
    }

    let quote_dirs: BTreeSet<PathBuf> = std::iter::once(main_file.as_path())
        .chain(report.changed().map(|rewrite| rewrite.path.as_path()))
        .filter_map(Path::parent)
        .map(Path::to_path_buf)
        .collect();
    let quote_dirs: Vec<PathBuf> = quote_dirs.into_iter().collect();
    let prefix = layout.include_prefix(&search.include, &quote_dirs);
    let compiler_args = command.with_shadow_source(&shadow_main, prefix);
    run_compiler(&program, &compiler_args)
}

fn run_compiler(program: &str, args: &[String]) -> anyhow::Result<i32> {
    debug!(program, ?args, "running compiler");
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("failed to run compiler '{program}'"))?;
    // Killed by a signal: report a generic failure.
    Ok(status.code().unwrap_or(1))
}
