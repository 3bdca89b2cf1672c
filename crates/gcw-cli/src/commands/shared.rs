//! Steps shared by every command that instruments a unit.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use gcw_config::GcwConfig;
use gcw_core::TranslationUnit;
use gcw_instrument::{Diagnostic, Pipeline, RunReport};
use gcw_parser::{CppFrontend, LambdaCaptureLint};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::invocation::SearchPaths;
use crate::writer;

/// Front end configured with a command line's search paths and the
/// configured header skip list.
#[must_use]
pub fn frontend(config: &GcwConfig, paths: &SearchPaths) -> CppFrontend {
    CppFrontend::new()
        .with_include_paths(paths.include.iter().cloned())
        .with_quote_paths(paths.quote.iter().cloned())
        .with_skipped_headers(config.output.skip_headers.iter().cloned())
}

pub fn parse_unit(frontend: &CppFrontend, main: &Path) -> anyhow::Result<TranslationUnit> {
    frontend
        .parse_translation_unit(main)
        .with_context(|| format!("failed to parse {}", main.display()))
}

/// Fail when any lambda of the unit captures a managed pointer outside the
/// allowed context. A disabled lint always passes.
pub fn check_lint(config: &GcwConfig, unit: &TranslationUnit) -> anyhow::Result<()> {
    if !config.lint.enabled {
        return Ok(());
    }
    let lint = LambdaCaptureLint::new(&config.pointer.to_template(), &config.lint.allowed_context);
    let violations = lint.check_unit(unit);
    if violations.is_empty() {
        return Ok(());
    }
    for violation in &violations {
        error!("{violation}");
    }
    let listed: Vec<String> = violations.iter().map(ToString::to_string).collect();
    anyhow::bail!(
        "{} lambda capture violation(s) in {}:\n{}",
        violations.len(),
        unit.main_file.display(),
        listed.join("\n")
    )
}

/// Parse, lint and instrument one unit in memory.
pub fn instrument_unit(
    config: &GcwConfig,
    frontend: &CppFrontend,
    main: &Path,
) -> anyhow::Result<RunReport> {
    let unit = parse_unit(frontend, main)?;
    check_lint(config, &unit)?;
    Pipeline::new(config.instrument_options())
        .run(&unit)
        .with_context(|| format!("instrumentation of {} aborted", main.display()))
}

/// Per-unit summary printed by `instrument` and `batch`.
#[derive(Debug, Clone, Serialize)]
pub struct UnitSummary {
    pub main_file: PathBuf,
    pub passes: usize,
    pub carriers: Vec<String>,
    pub changed: Vec<PathBuf>,
    pub already_instrumented: Vec<String>,
    pub written: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl From<&RunReport> for UnitSummary {
    fn from(report: &RunReport) -> Self {
        Self {
            main_file: report.main_file.clone(),
            passes: report.passes,
            carriers: report.carriers.iter().map(ToString::to_string).collect(),
            changed: report.changed().map(|r| r.path.clone()).collect(),
            already_instrumented: report
                .rewrites
                .iter()
                .flat_map(|r| r.already_instrumented.iter().map(ToString::to_string))
                .collect(),
            written: Vec::new(),
            diagnostics: report.diagnostics.clone(),
        }
    }
}

/// Write each unit's rewrites in place, in order.
///
/// Identical rewrites of a shared header are written once. When a unit's
/// rewrite of a file differs from what an earlier unit wrote, the unit is
/// instrumented again through `rerun`, which reads the files as they are now
/// on disk.
pub fn apply_in_place(
    reports: Vec<RunReport>,
    rerun: impl Fn(usize) -> anyhow::Result<RunReport>,
) -> anyhow::Result<Vec<UnitSummary>> {
    let mut written: BTreeMap<PathBuf, String> = BTreeMap::new();
    let mut summaries = Vec::with_capacity(reports.len());

    for (index, report) in reports.into_iter().enumerate() {
        let stale = report.changed().any(|rewrite| {
            written
                .get(&rewrite.path)
                .is_some_and(|text| *text != rewrite.rewritten)
        });
        let report = if stale {
            debug!(main_file = %report.main_file.display(), "shared file changed under this unit; re-running");
            rerun(index)?
        } else {
            report
        };

        let mut summary = UnitSummary::from(&report);
        for rewrite in report.changed() {
            if written.get(&rewrite.path) == Some(&rewrite.rewritten) {
                continue;
            }
            writer::write_atomic(&rewrite.path, &rewrite.rewritten)?;
            info!(file = %rewrite.path.display(), classes = rewrite.instrumented.len(), "instrumented file written");
            written.insert(rewrite.path.clone(), rewrite.rewritten.clone());
            summary.written.push(rewrite.path.clone());
        }
        summaries.push(summary);
    }
    Ok(summaries)
}
