use anyhow::Result;
use clap::Parser;
use corpuslens::cli::{Cli, Commands};
use corpuslens::commands::{self, AnalyzeConfig};
use corpuslens::observability::install_panic_hook;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    install_panic_hook();
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            corpus,
            profile,
            format,
            output,
            manifests,
            allow_override,
        } => commands::handle_analyze(AnalyzeConfig {
            corpus,
            profile,
            format,
            output,
            manifests,
            allow_override,
        }),
        Commands::Modules { profile, manifests } => commands::handle_modules(profile, manifests),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("corpuslens=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
