use anyhow::Context;
use clap::Parser;

mod cli;
mod commands;
mod compile_db;
mod invocation;
mod output;
mod paths;
mod progress;
mod write_lock;
mod writer;

fn main() {
    match run() {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("gcwire error: {error:#}");
            std::process::exit(1);
        }
    }
}

/// Run the parsed command and return the process exit status.
fn run() -> anyhow::Result<i32> {
    let cli = cli::Cli::parse();
    let flags = cli.global_flags();
    init_tracing(&flags)?;

    let config =
        gcw_config::GcwConfig::load_with_dotenv().context("failed to load gcwire configuration")?;

    commands::dispatch::dispatch(cli.command, &config, &flags)
}

/// Default log level when `GCWIRE_LOG` is unset. `--quiet` wins over `--verbose`.
const fn default_level(flags: &cli::GlobalFlags) -> &'static str {
    if flags.quiet {
        "error"
    } else if flags.verbose {
        "debug"
    } else {
        "warn"
    }
}

fn init_tracing(flags: &cli::GlobalFlags) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("GCWIRE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level(flags)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&["gcwire", "lint", "a.cpp"], "warn")]
    #[case(&["gcwire", "--verbose", "lint", "a.cpp"], "debug")]
    #[case(&["gcwire", "lint", "a.cpp", "-q", "-v"], "error")]
    fn log_level_follows_global_flags(#[case] argv: &[&str], #[case] expected: &str) {
        let cli = cli::Cli::try_parse_from(argv).expect("cli should parse");
        assert_eq!(default_level(&cli.global_flags()), expected);
    }
}
