//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// InstallTheCli - install and keep updated AI assistant CLIs
#[derive(Parser, Debug)]
#[command(name = "installthecli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to installthecli.yaml
    #[arg(short, long, global = true, env = "INSTALLTHECLI_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Log every mutating command instead of running it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output format for reports
    #[arg(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tables and a summary
    Human,
    /// Pretty-printed JSON on stdout
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List catalog targets
    List,

    /// Install one target by key
    Install(InstallArgs),

    /// Install every catalog target
    InstallAll(InstallAllArgs),

    /// Update every installed target; never fails on a single target
    UpdateAll,

    /// Background auto-update job
    #[command(subcommand)]
    Updater(UpdaterCommands),

    /// Show platform, package managers and prerequisites without changing anything
    Doctor,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Catalog key (see `installthecli list`)
    pub key: String,
}

#[derive(Args, Debug)]
pub struct InstallAllArgs {
    /// Register the auto-update job after the batch
    #[arg(long)]
    pub with_updater: bool,

    /// Skip optional targets
    #[arg(long)]
    pub required_only: bool,
}

#[derive(Subcommand, Debug)]
pub enum UpdaterCommands {
    /// Write the update procedure and register the recurring job
    Register,

    /// Print the rendered procedure and its schedule
    Show,
}
