use std::collections::BTreeMap;
use std::path::PathBuf;

use gcw_config::GcwConfig;
use gcw_instrument::{InsertionPoint, Pipeline};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AnalyzeArgs;
use crate::commands::shared;
use crate::invocation::SearchPaths;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InheritanceEntry {
    derived: String,
    base: String,
}

#[derive(Debug, Serialize)]
struct AnalyzeReport {
    main_file: PathBuf,
    files: Vec<PathBuf>,
    passes: usize,
    classes: usize,
    carriers: Vec<String>,
    pointer_fields: Vec<String>,
    carrier_fields: Vec<String>,
    inheritance: Vec<InheritanceEntry>,
    insertion_points: BTreeMap<PathBuf, Vec<InsertionPoint>>,
}

pub fn handle(args: &AnalyzeArgs, config: &GcwConfig, flags: &GlobalFlags) -> anyhow::Result<i32> {
    let search = SearchPaths {
        include: args.include.clone(),
        quote: Vec::new(),
    };
    let unit = shared::parse_unit(&shared::frontend(config, &search), &args.file)?;
    let analysis = Pipeline::new(config.instrument_options()).analyze(&unit);
    let classification = &analysis.classification;

    let report = AnalyzeReport {
        main_file: unit.main_file.clone(),
        files: unit.sources.keys().cloned().collect(),
        passes: classification.passes,
        classes: classification.classes.len(),
        carriers: analysis.carriers().iter().map(ToString::to_string).collect(),
        pointer_fields: classification.uses_pointer.keys().map(ToString::to_string).collect(),
        carrier_fields: classification
            .uses_class_that_uses_pointer
            .keys()
            .map(ToString::to_string)
            .collect(),
        inheritance: classification
            .inherits_from_user
            .keys()
            .map(|(derived, base)| InheritanceEntry {
                derived: derived.to_string(),
                base: base.to_string(),
            })
            .collect(),
        insertion_points: analysis.points.clone(),
    };
    output(&report, flags.format)?;
    Ok(0)
}
