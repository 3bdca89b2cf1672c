//! End-to-end instrumentation of one translation unit.

use std::collections::BTreeMap;
use std::path::PathBuf;

use gcw_core::{ClassKey, InstrumentOptions, Span, TranslationUnit};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::closure::ClosureResolver;
use crate::error::{Diagnostic, DiagnosticKind, InstrumentError};
use crate::grouping::{InsertionPoint, group_insertion_points};
use crate::splice::{apply_edits, check_access_policy, plan_edits, scan_existing_blocks};
use crate::synth::Synthesizer;
use crate::walker::Classification;

/// Closure and grouping results, before any text is touched.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub classification: Classification,
    pub points: BTreeMap<PathBuf, Vec<InsertionPoint>>,
}

impl Analysis {
    /// Carrying classes in identity order.
    #[must_use]
    pub fn carriers(&self) -> Vec<ClassKey> {
        self.classification.carriers.iter().cloned().collect()
    }
}

/// New text for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileRewrite {
    pub path: PathBuf,
    #[serde(skip)]
    pub original: String,
    #[serde(skip)]
    pub rewritten: String,
    pub instrumented: Vec<ClassKey>,
    pub already_instrumented: Vec<ClassKey>,
}

impl FileRewrite {
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.original != self.rewritten
    }
}

/// Outcome of a run over one translation unit.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub main_file: PathBuf,
    pub passes: usize,
    pub carriers: Vec<ClassKey>,
    /// Files with at least one insertion point, in path order.
    pub rewrites: Vec<FileRewrite>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    /// Rewrites whose text actually changed.
    pub fn changed(&self) -> impl Iterator<Item = &FileRewrite> {
        self.rewrites.iter().filter(|r| r.is_changed())
    }
}

/// Closure, grouping, synthesis and splicing for one set of options.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: InstrumentOptions,
}

impl Pipeline {
    #[must_use]
    pub const fn new(options: InstrumentOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> &InstrumentOptions {
        &self.options
    }

    /// Compute the carrying closure and the insertion points of `unit`.
    #[must_use]
    pub fn analyze(&self, unit: &TranslationUnit) -> Analysis {
        let classification = ClosureResolver::new(&self.options).resolve(&unit.root);
        let points = group_insertion_points(&classification);
        debug!(
            main_file = %unit.main_file.display(),
            classes = classification.classes.len(),
            carriers = classification.carriers.len(),
            files = points.len(),
            "analysis finished"
        );
        Analysis {
            classification,
            points,
        }
    }

    /// Instrument `unit` in memory.
    ///
    /// Nothing is written to disk; callers persist [`RunReport::changed`].
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError`] when any touched file holds generated
    /// blocks under a different access policy or with unbalanced markers. The
    /// whole unit is rejected in that case.
    pub fn run(&self, unit: &TranslationUnit) -> Result<RunReport, InstrumentError> {
        let analysis = self.analyze(unit);
        let synthesizer = Synthesizer::new(&self.options);
        let mut rewrites = Vec::new();
        let mut diagnostics = Vec::new();

        for (path, points) in &analysis.points {
            let Some(source) = unit.source(path) else {
                warn!(file = %path.display(), "no source text captured; skipping file");
                diagnostics.extend(points.iter().map(|p| Diagnostic {
                    kind: DiagnosticKind::MissingSource,
                    file: path.clone(),
                    line: p.extent.end.line,
                    column: p.extent.end.column,
                    class: p.class.clone(),
                    message: "source text was not captured by the front end".to_string(),
                }));
                continue;
            };

            let existing = scan_existing_blocks(path, source)?;
            check_access_policy(path, &existing, self.options.access)?;

            let class_spans: Vec<Span> = analysis
                .classification
                .classes
                .iter()
                .filter(|decl| decl.extent.file == *path)
                .map(|decl| decl.extent.span())
                .collect();
            let plan = plan_edits(path, source, points, &class_spans, &synthesizer);
            diagnostics.extend(plan.diagnostics);
            let rewritten = apply_edits(source, &plan.edits);
            rewrites.push(FileRewrite {
                path: path.clone(),
                original: source.to_string(),
                rewritten,
                instrumented: plan.edits.into_iter().map(|e| e.class).collect(),
                already_instrumented: plan.already_instrumented,
            });
        }

        let report = RunReport {
            main_file: unit.main_file.clone(),
            passes: analysis.classification.passes,
            carriers: analysis.carriers(),
            rewrites,
            diagnostics,
        };
        info!(
            main_file = %report.main_file.display(),
            carriers = report.carriers.len(),
            changed = report.changed().count(),
            diagnostics = report.diagnostics.len(),
            "instrumentation finished"
        );
        Ok(report)
    }
}
