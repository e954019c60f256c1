//! Install a single target

use anyhow::Result;
use installthecli_core::types::TargetStatus;
use installthecli_core::Error;

use super::Context;
use crate::{output, report};

/// Install `key`; a failed target is a hard error
pub async fn run(ctx: &Context, key: &str) -> Result<()> {
    let target = ctx.catalog.get(key)?.clone();
    ctx.require_supported()?;

    if ctx.runner.is_dry_run() && !ctx.json() {
        output::info("Dry run: commands are logged, not executed");
    }

    let mut installer = ctx.installer();
    let outcome = installer.install(&target).await?;

    if ctx.json() {
        output::json(&outcome)?;
    } else {
        report::print_outcome(&outcome);
    }

    match outcome.status {
        TargetStatus::Failed { last_error } => {
            Err(Error::target_install_failed(&target.key, last_error).into())
        }
        _ => Ok(()),
    }
}
