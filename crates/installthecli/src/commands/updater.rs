//! Auto-update job commands

use anyhow::{Context as _, Result};
use camino::Utf8PathBuf;
use installthecli_updater::{Registration, UpdaterJob};
use serde::Serialize;

use super::Context;
use crate::cli::UpdaterCommands;
use crate::exit::Exit;
use crate::output;

#[derive(Serialize)]
struct ShowOutput<'a> {
    #[serde(flatten)]
    job: &'a UpdaterJob,
    script_path: Utf8PathBuf,
}

/// Run an updater subcommand
pub async fn run(ctx: &Context, command: &UpdaterCommands) -> Result<Exit> {
    match command {
        UpdaterCommands::Register => {
            let registration = register_job(ctx).await?;
            if ctx.json() {
                output::json(&registration)?;
            } else {
                print_registration(&registration);
            }
            Ok(if registration.succeeded() {
                Exit::Success
            } else {
                Exit::Failure
            })
        }
        UpdaterCommands::Show => {
            show(ctx)?;
            Ok(Exit::Success)
        }
    }
}

fn generate(ctx: &Context) -> Result<UpdaterJob> {
    UpdaterJob::generate(&ctx.catalog, &ctx.platform, &ctx.config.update)
        .context("Failed to generate the update procedure")
}

/// Write the procedure and register it with the platform scheduler
pub async fn register_job(ctx: &Context) -> Result<Registration> {
    ctx.require_supported()?;
    let job = generate(ctx)?;
    let scheduler = job.scheduler_for(&ctx.platform, &ctx.state_dir)?;
    job.register(&ctx.runner, scheduler.as_ref(), &ctx.state_dir)
        .await
        .context("Failed to register the auto-update job")
}

/// Print the outcome of a registration
pub fn print_registration(registration: &Registration) {
    output::header("Auto-update");
    if registration.script_written {
        output::kv("procedure", registration.script_path.as_str());
    } else {
        output::kv("procedure (not written)", registration.script_path.as_str());
    }
    if registration.succeeded() {
        output::success("Auto-update job registered");
    } else {
        output::warning(&format!(
            "Auto-update job not registered: {}",
            registration.attempt.failure_summary()
        ));
        let tail = registration.attempt.output_tail();
        if !tail.is_empty() {
            println!("{}", tail);
        }
    }
}

fn show(ctx: &Context) -> Result<()> {
    let job = generate(ctx)?;
    let script_path = job.script_path(&ctx.state_dir);

    if ctx.json() {
        return output::json(&ShowOutput {
            job: &job,
            script_path,
        });
    }

    output::header("Auto-update job");
    output::kv("task", &ctx.config.update.task_name);
    output::kv("schedule", &job.schedule().describe());
    output::kv("procedure", script_path.as_str());
    println!();
    print!("{}", job.procedure().content);
    Ok(())
}
