//! Update every installed target

use anyhow::Result;
use installthecli_engine::BatchOrchestrator;

use super::Context;
use crate::{output, report};

/// Best-effort update; individual targets never fail the command
pub async fn run(ctx: &Context) -> Result<()> {
    ctx.require_supported()?;

    let mut batch = BatchOrchestrator::new(ctx.installer());
    let report = batch.update_all(ctx.catalog.targets()).await;

    if ctx.json() {
        output::json(&report)
    } else {
        report::print_batch(&report);
        Ok(())
    }
}
