use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use plandiff_model::Field;

#[derive(Parser)]
#[command(
    name = "plandiff",
    about = "plandiff: compare project schedules across formats",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Disable colored markers
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum DiffMode {
    /// Task-aligned tree diff
    Tree,
    /// Positional path diff over the dict form
    Flat,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show changes between two schedules (exit 0: none, 1: found, 2: error)
    Diff(DiffArgs),
    /// Print a schedule's task outline
    Show(ShowArgs),
    /// List registered document formats
    Formats,
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    #[arg(long, default_value = "tree")]
    pub mode: DiffMode,
    /// TOML file with diff settings
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Fields folded into subtree fingerprints (tree mode)
    #[arg(long, value_delimiter = ',')]
    pub hash_fields: Vec<Field>,
    /// Treat timestamps on the same day as equal (flat mode)
    #[arg(long)]
    pub whole_days: bool,
    /// Attributes to report (flat mode)
    #[arg(long, value_delimiter = ',')]
    pub attributes: Vec<Field>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub file: PathBuf,
    /// Keep only tasks carrying one of these flags
    #[arg(long, value_delimiter = ',')]
    pub flags: Vec<String>,
    /// Drop tasks carrying one of these flags
    #[arg(long, value_delimiter = ',')]
    pub exclude_flags: Vec<String>,
    /// Keep only milestones
    #[arg(long)]
    pub milestones: bool,
}
