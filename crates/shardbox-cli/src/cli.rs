use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "shardbox",
    about = "shardbox: local-disk content-addressable blob store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store root (default partition). Ignored when --config is given.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// TOML store configuration.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Algorithm {
    Sha256,
    Blake3,
}

#[derive(Subcommand)]
pub enum Command {
    /// Publish files as blobs
    Put(PutArgs),
    /// Enumerate blobs in address order
    #[command(alias = "enumerate")]
    Ls(LsArgs),
    /// List configured partitions
    Partitions,
}

#[derive(Args)]
pub struct PutArgs {
    pub files: Vec<PathBuf>,
    #[arg(short, long, value_enum, default_value = "sha256")]
    pub algorithm: Algorithm,
    #[arg(short, long)]
    pub partition: Option<String>,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(short, long)]
    pub partition: Option<String>,
    /// Resume strictly after this address
    #[arg(long, default_value = "")]
    pub after: String,
    /// Maximum blobs per page (defaults to the configured limit)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    /// Long-poll up to this many seconds when nothing is found
    #[arg(short, long, default_value = "0")]
    pub wait: u64,
    /// Keep paging until the partition is exhausted
    #[arg(long)]
    pub all: bool,
}
