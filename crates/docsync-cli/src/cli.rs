use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docsync",
    about = "Turn JSON document changes into path-addressed operation logs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with differ settings
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
    /// Diff two JSON files and print the operation log
    Diff(DiffArgs),
    /// Diff two JSON files and print the structural delta
    Delta(DeltaArgs),
    /// Translate a jsondiffpatch delta against its left document
    Translate(TranslateArgs),
    /// Apply an operation log to a JSON document
    Apply(ApplyArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    #[arg(long, default_value = "doc")]
    pub base: String,
    /// Strings shorter than this are replaced whole
    #[arg(long)]
    pub min_text_length: Option<usize>,
}

#[derive(Args)]
pub struct DeltaArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    #[arg(long)]
    pub min_text_length: Option<usize>,
}

#[derive(Args)]
pub struct TranslateArgs {
    pub left: PathBuf,
    pub delta: PathBuf,
    #[arg(long, default_value = "doc")]
    pub base: String,
}

#[derive(Args)]
pub struct ApplyArgs {
    pub document: PathBuf,
    pub operations: PathBuf,
    #[arg(long, default_value = "doc")]
    pub base: String,
}
