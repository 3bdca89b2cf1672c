use gcw_config::GcwConfig;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;

/// Dispatch a parsed command to its handler; the result is the exit status.
pub fn dispatch(command: Commands, config: &GcwConfig, flags: &GlobalFlags) -> anyhow::Result<i32> {
    match command {
        Commands::Compile(args) => commands::compile::handle(&args, config),
        Commands::Instrument(args) => commands::instrument::handle(&args, config, flags),
        Commands::Analyze(args) => commands::analyze::handle(&args, config, flags),
        Commands::Lint(args) => commands::lint::handle(&args, config, flags),
        Commands::Batch(args) => commands::batch::handle(&args, config, flags),
    }
}
