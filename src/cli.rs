use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "corpuslens")]
#[command(about = "Quality analysis for text corpora", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every enabled module over a corpus
    Analyze {
        /// Corpus file (.jsonl records or plain text, one record per line)
        #[arg(short, long)]
        corpus: PathBuf,

        /// Language profile; searched for as corpuslens.toml when omitted
        #[arg(short, long, env = "CORPUSLENS_PROFILE")]
        profile: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Additional module manifests (files or directories)
        #[arg(short, long = "manifest")]
        manifests: Vec<PathBuf>,

        /// Let manifest modules replace modules with the same name
        #[arg(long)]
        allow_override: bool,
    },

    /// List registered modules and whether the profile can run them
    Modules {
        /// Language profile; searched for as corpuslens.toml when omitted
        #[arg(short, long, env = "CORPUSLENS_PROFILE")]
        profile: Option<PathBuf>,

        /// Additional module manifests (files or directories)
        #[arg(short, long = "manifest")]
        manifests: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Summary,
}
