//! InstallTheCli - install and keep updated AI assistant CLIs
//!
//! This is the main entry point for the installthecli command-line interface.

mod cli;
mod commands;
mod exit;
mod output;
mod report;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use commands::Context;
use exit::Exit;

/// Log file rewritten on every run
const LAST_RUN_LOG: &str = "last_run.log";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = init_tracing(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            output::error(&format!("{:#}", e));
            Exit::for_error(&e).into()
        }
    }
}

async fn run(cli: Cli) -> Result<Exit> {
    let ctx = Context::load(&cli)?;

    match &cli.command {
        Commands::List => commands::list::run(&ctx).map(|_| Exit::Success),
        Commands::Install(args) => commands::install::run(&ctx, &args.key)
            .await
            .map(|_| Exit::Success),
        Commands::InstallAll(args) => commands::install_all::run(&ctx, args).await,
        Commands::UpdateAll => commands::update_all::run(&ctx).await.map(|_| Exit::Success),
        Commands::Updater(command) => commands::updater::run(&ctx, command).await,
        Commands::Doctor => commands::doctor::run(&ctx).await.map(|_| Exit::Success),
    }
}

/// Initialize tracing with appropriate verbosity
///
/// Console output goes to stderr so JSON reports on stdout stay parseable.
/// A second layer mirrors the run into `last_run.log` in the state directory.
fn init_tracing(verbose: u8, quiet: bool) -> Option<WorkerGuard> {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard, file_error) = match open_last_run_log() {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!("Logging to the console only: {:#}", e);
    }
    guard
}

fn open_last_run_log() -> Result<std::fs::File> {
    let dir = commands::app_state_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(std::fs::File::create(dir.join(LAST_RUN_LOG))?)
}
