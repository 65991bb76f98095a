use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "jsonkv",
    about = "jsonkv: path-addressed JSON document client",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Client configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the canonical form of dotted paths
    Path(PathArgs),
    /// List the supported operations
    Ops(OpsArgs),
    /// Execute a script of operations against an in-memory store
    Run(RunArgs),
}

#[derive(Args)]
pub struct PathArgs {
    #[arg(required = true)]
    pub inputs: Vec<String>,
}

#[derive(Args)]
pub struct OpsArgs {
    /// Only list operations that modify documents
    #[arg(long)]
    pub writes: bool,
}

#[derive(Args)]
pub struct RunArgs {
    pub script: PathBuf,
    /// Create missing ancestors on JSON.SET
    #[arg(long)]
    pub auto_create: bool,
    /// JSON object of initial documents, keyed by key
    #[arg(long)]
    pub seed: Option<PathBuf>,
    /// Print every document after the script ran
    #[arg(long)]
    pub dump: bool,
}
