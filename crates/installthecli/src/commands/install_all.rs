//! Install every catalog target, optionally registering the updater

use anyhow::Result;
use installthecli_core::types::{BatchReport, OverallStatus};
use installthecli_engine::BatchOrchestrator;
use installthecli_updater::Registration;
use serde::Serialize;
use tracing::warn;

use super::{updater, Context};
use crate::cli::InstallAllArgs;
use crate::exit::Exit;
use crate::{output, report};

#[derive(Serialize)]
struct InstallAllOutput<'a> {
    report: &'a BatchReport,
    overall: OverallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    updater: Option<&'a Registration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updater_error: Option<String>,
}

/// Run the install batch; exit 1 when any target failed
pub async fn run(ctx: &Context, args: &InstallAllArgs) -> Result<Exit> {
    ctx.require_supported()?;

    let targets = if args.required_only {
        ctx.catalog.required_targets()
    } else {
        ctx.catalog.targets().to_vec()
    };
    if ctx.runner.is_dry_run() && !ctx.json() {
        output::info("Dry run: commands are logged, not executed");
    }

    let mut batch = BatchOrchestrator::new(ctx.installer());
    let report = batch.install_all(&targets).await;

    let (registration, updater_error) = if args.with_updater {
        match updater::register_job(ctx).await {
            Ok(registration) => (Some(registration), None),
            Err(e) => {
                warn!("Auto-update registration failed: {:#}", e);
                (None, Some(format!("{:#}", e)))
            }
        }
    } else {
        (None, None)
    };

    if ctx.json() {
        output::json(&InstallAllOutput {
            report: &report,
            overall: report.overall(),
            updater: registration.as_ref(),
            updater_error,
        })?;
    } else {
        report::print_batch(&report);
        if let Some(registration) = &registration {
            updater::print_registration(registration);
        }
        if let Some(e) = &updater_error {
            output::warning(&format!("Auto-update was not registered: {}", e));
        }
    }

    Ok(Exit::for_report(&report))
}
