use anyhow::Result;
use clap::Parser;
use reelmerge::cli::{AppContext, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        cache: cli.cache,
    };

    init_logging(&ctx);

    match cli.command {
        Commands::Ingest(args) => reelmerge::ingest_run(args, &ctx),
        Commands::Resolve(args) => reelmerge::resolve_run(args, &ctx),
        Commands::Report(args) => reelmerge::report_run(args, &ctx),
        Commands::Export(args) => reelmerge::export_run(args, &ctx),
        Commands::Normalize(args) => reelmerge::normalize_run(args, &ctx),
        Commands::Init(args) => reelmerge::infra::config::init(args, &ctx),
        Commands::Completions(args) => reelmerge::completion::run(args, &ctx),
    }
}

/// RUST_LOG wins; otherwise the level follows --quiet / --verbose.
fn init_logging(ctx: &AppContext) {
    let default = if ctx.verbose {
        "reelmerge=debug"
    } else if ctx.quiet {
        "warn"
    } else {
        "reelmerge=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!ctx.no_color)
        .with_target(false)
        .init();
}
