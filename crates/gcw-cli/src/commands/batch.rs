//! `gcwire batch <compile_commands.json>`: analyze every entry in parallel,
//! then write in-place rewrites one unit at a time.

use anyhow::Context;
use gcw_config::GcwConfig;
use gcw_instrument::RunReport;
use rayon::prelude::*;
use tracing::info;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::BatchArgs;
use crate::commands::shared::{self, UnitSummary};
use crate::compile_db::{self, CompileDbEntry};
use crate::output::output;
use crate::progress::Progress;

pub fn handle(args: &BatchArgs, config: &GcwConfig, flags: &GlobalFlags) -> anyhow::Result<i32> {
    let entries: Vec<CompileDbEntry> = compile_db::load(&args.database)?
        .into_iter()
        .filter(|entry| entry.compile_command().source().is_some())
        .collect();
    info!(entries = entries.len(), database = %args.database.display(), "batch started");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .context("failed to start analysis thread pool")?;

    let progress = Progress::bar(entries.len() as u64, "analyzing", flags.quiet);
    let analyzed: anyhow::Result<Vec<RunReport>> = pool.install(|| {
        entries
            .par_iter()
            .map(|entry| {
                let report = instrument_entry(config, entry);
                progress.inc(1);
                report
            })
            .collect()
    });
    let reports = match analyzed {
        Ok(reports) => {
            progress.finish_ok("analysis complete");
            reports
        }
        Err(error) => {
            progress.finish_err("analysis failed; nothing written");
            return Err(error);
        }
    };

    let summaries = if args.dry_run {
        reports.iter().map(UnitSummary::from).collect()
    } else {
        shared::apply_in_place(reports, |index| instrument_entry(config, &entries[index]))?
    };

    output(&summaries, flags.format)?;
    Ok(0)
}

fn instrument_entry(config: &GcwConfig, entry: &CompileDbEntry) -> anyhow::Result<RunReport> {
    let search = entry
        .compile_command()
        .search_paths()
        .resolved_against(&entry.directory);
    let frontend = shared::frontend(config, &search);
    shared::instrument_unit(config, &frontend, &entry.source_path())
}
