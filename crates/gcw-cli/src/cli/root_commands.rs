use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Instrument a compilation into shadow files, then run the real compiler.
    Compile(CompileArgs),
    /// Instrument source files directly.
    Instrument(InstrumentArgs),
    /// Print carrying classes and insertion points without writing anything.
    Analyze(AnalyzeArgs),
    /// Check lambda captures of managed pointers.
    Lint(LintArgs),
    /// Instrument every entry of a compile_commands.json in place.
    Batch(BatchArgs),
}

/// Arguments for `gcwire compile`.
#[derive(Clone, Debug, Args)]
pub struct CompileArgs {
    /// Compiler to run (defaults to `compiler.program` from configuration)
    #[arg(long)]
    pub compiler: Option<String>,

    /// Compiler arguments, after `--`
    #[arg(last = true, required = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for `gcwire instrument`.
#[derive(Clone, Debug, Args)]
pub struct InstrumentArgs {
    /// Main source files; each is one translation unit
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Include search directory (repeatable)
    #[arg(short = 'I', long = "include")]
    pub include: Vec<PathBuf>,

    /// Rewrite files where they are
    #[arg(long, conflicts_with = "out_dir", required_unless_present_any = ["out_dir", "dry_run"])]
    pub in_place: bool,

    /// Write rewritten copies under this directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for `gcwire analyze`.
#[derive(Clone, Debug, Args)]
pub struct AnalyzeArgs {
    /// Main source file
    pub file: PathBuf,

    /// Include search directory (repeatable)
    #[arg(short = 'I', long = "include")]
    pub include: Vec<PathBuf>,
}

/// Arguments for `gcwire lint`.
#[derive(Clone, Debug, Args)]
pub struct LintArgs {
    /// Main source files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Include search directory (repeatable)
    #[arg(short = 'I', long = "include")]
    pub include: Vec<PathBuf>,
}

/// Arguments for `gcwire batch`.
#[derive(Clone, Debug, Args)]
pub struct BatchArgs {
    /// Path to compile_commands.json
    pub database: PathBuf,

    /// Worker threads for analysis (defaults to the number of CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}
