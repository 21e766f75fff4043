use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::cache::MalformedPolicy;
use crate::core::record::View;

/// Shared application context for global flags
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    pub quiet: bool,             // global --quiet
    pub no_color: bool,          // global --no-color
    pub dry_run: bool,           // global --dry-run
    pub verbose: bool,           // global --verbose
    pub cache: Option<PathBuf>,  // global --cache
}

#[derive(Parser)]
#[command(name = "reel")]
#[command(
    about = "Reconcile movie ratings scraped from two sources into one deduplicated, cached record set"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Reconcile in memory without writing the cache
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log every reconciliation decision
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Cache file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub cache: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile scraped records from one or more feed files
    Ingest(IngestArgs),

    /// Fill missing metrics from search hits for known records
    Resolve(ResolveArgs),

    /// Summarize the record set by source coverage
    Report(ReportArgs),

    /// Write per-source partial caches for follow-up lookups
    Export(ExportArgs),

    /// Print the normalized form of titles
    Normalize(NormalizeArgs),

    /// Initialize a reelmerge.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Feed files (JSONL, one scraped record per line)
    #[arg(required = true)]
    pub feeds: Vec<PathBuf>,

    /// Ignore records released before this year (overrides config)
    #[arg(long)]
    pub min_year: Option<i32>,

    /// Cache line handling on load (overrides config)
    #[arg(long, value_enum)]
    pub on_malformed: Option<MalformedPolicy>,
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Search-hit file (JSONL: a target key plus its candidates per line)
    pub hits: PathBuf,

    /// Emit the summary as JSON (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// List the records of one view
    #[arg(long, value_enum)]
    pub list: Option<ListView>,

    /// Machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListView {
    All,
    PrimaryOnly,
    SecondaryOnly,
    Both,
}

impl From<ListView> for View {
    fn from(list: ListView) -> Self {
        match list {
            ListView::All => View::All,
            ListView::PrimaryOnly => View::PrimaryOnly,
            ListView::SecondaryOnly => View::SecondaryOnly,
            ListView::Both => View::Both,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Output directory (defaults to the configured export_dir)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct NormalizeArgs {
    /// Raw titles as scraped
    #[arg(required = true)]
    pub titles: Vec<String>,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
