use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use gcw_config::GcwConfig;
use tracing::{info, warn};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InstrumentArgs;
use crate::commands::shared::{self, UnitSummary};
use crate::invocation::SearchPaths;
use crate::output::output;
use crate::paths::OutputLayout;
use crate::writer;

pub fn handle(args: &InstrumentArgs, config: &GcwConfig, flags: &GlobalFlags) -> anyhow::Result<i32> {
    let search = SearchPaths {
        include: args.include.clone(),
        quote: Vec::new(),
    };
    let frontend = shared::frontend(config, &search);

    // Every unit is instrumented before anything is written.
    let reports = args
        .files
        .iter()
        .map(|file| shared::instrument_unit(config, &frontend, file))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let summaries = if args.dry_run {
        reports.iter().map(UnitSummary::from).collect()
    } else if let Some(out_dir) = &args.out_dir {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let layout = OutputLayout::new(out_dir.clone(), &cwd);
        let mut written: BTreeMap<PathBuf, String> = BTreeMap::new();
        let mut summaries = Vec::with_capacity(reports.len());
        for report in &reports {
            let mut summary = UnitSummary::from(report);
            for rewrite in report.changed() {
                match written.get(&rewrite.path) {
                    Some(text) if *text == rewrite.rewritten => continue,
                    Some(_) => {
                        warn!(
                            file = %rewrite.path.display(),
                            unit = %report.main_file.display(),
                            "file already written differently for an earlier unit; keeping the first"
                        );
                        continue;
                    }
                    None => {}
                }
                let target = layout.shadow_path(&rewrite.path);
                writer::write_atomic(&target, &rewrite.rewritten)?;
                info!(file = %target.display(), "instrumented copy written");
                written.insert(rewrite.path.clone(), rewrite.rewritten.clone());
                summary.written.push(target);
            }
            summaries.push(summary);
        }
        summaries
    } else {
        shared::apply_in_place(reports, |index| {
            shared::instrument_unit(config, &frontend, &args.files[index])
        })?
    };

    output(&summaries, flags.format)?;
    Ok(0)
}
