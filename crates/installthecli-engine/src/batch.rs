//! Batch install and update over the catalog
//!
//! Targets are processed strictly in order, one at a time. A failing target
//! never stops the batch; its outcome is recorded and the next target runs.

use installthecli_core::types::{
    BatchKind, BatchReport, OverallStatus, SkipReason, TargetOutcome, TargetSpec, TargetStatus,
};
use tracing::{error, info, warn};

use crate::installer::TargetInstaller;

/// Runs install-all and update-all
pub struct BatchOrchestrator {
    installer: TargetInstaller,
}

impl BatchOrchestrator {
    /// Wrap an installer; its prerequisite cache is shared across the batch
    pub fn new(installer: TargetInstaller) -> Self {
        Self { installer }
    }

    /// The underlying installer
    pub fn installer(&self) -> &TargetInstaller {
        &self.installer
    }

    /// Install every target in order
    ///
    /// An unsatisfied prerequisite fails only the target that needs it.
    /// Failed optional targets are reported as skipped.
    pub async fn install_all(&mut self, targets: &[TargetSpec]) -> BatchReport {
        let mut report = BatchReport::new(BatchKind::Install);
        let total = targets.len();

        for (i, target) in targets.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, total, target.label);
            let outcome = match self.installer.install(target).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{}: {}", target.label, e);
                    TargetOutcome::new(
                        &target.key,
                        &target.label,
                        TargetStatus::Failed {
                            last_error: e.to_string(),
                        },
                    )
                }
            };
            report.outcomes.push(soften_optional(target, outcome));
        }

        log_summary(&report);
        report
    }

    /// Update every installed target in order; never fails
    pub async fn update_all(&mut self, targets: &[TargetSpec]) -> BatchReport {
        let mut report = BatchReport::new(BatchKind::Update);
        let total = targets.len();

        for (i, target) in targets.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, total, target.label);
            report.outcomes.push(self.installer.update(target).await);
        }

        log_summary(&report);
        report
    }
}

fn soften_optional(target: &TargetSpec, mut outcome: TargetOutcome) -> TargetOutcome {
    if !target.optional {
        return outcome;
    }
    if let TargetStatus::Failed { last_error } = &outcome.status {
        warn!("Skipping optional {}: {}", target.label, last_error);
        outcome.status = TargetStatus::Skipped {
            reason: SkipReason::OptionalUnavailable {
                last_error: last_error.clone(),
            },
        };
    }
    outcome
}

fn log_summary(report: &BatchReport) {
    let installed = report.count(|s| matches!(s, TargetStatus::Installed { .. }));
    let updated = report.count(|s| matches!(s, TargetStatus::Updated { .. }));
    let skipped = report.count(|s| matches!(s, TargetStatus::Skipped { .. }));
    let failed = report.count(|s| matches!(s, TargetStatus::Failed { .. }));

    info!(
        "Summary: {} installed, {} updated, {} skipped, {} failed",
        installed, updated, skipped, failed
    );
    match report.overall() {
        OverallStatus::AllSucceeded => info!("All targets completed"),
        OverallStatus::PartialFailure { failed } => {
            warn!("Failed targets: {}", failed.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use installthecli_core::types::Backend;

    fn target(optional: bool) -> TargetSpec {
        let spec = TargetSpec::new(
            "grok",
            "Grok CLI",
            Backend::VendorScript {
                url: "https://example.invalid/install.sh".into(),
            },
        );
        if optional {
            spec.optional()
        } else {
            spec
        }
    }

    fn failed_outcome() -> TargetOutcome {
        TargetOutcome::new(
            "grok",
            "Grok CLI",
            TargetStatus::Failed {
                last_error: "grok failed with exit code 1".into(),
            },
        )
    }

    #[test]
    fn test_optional_failure_becomes_skip() {
        let outcome = soften_optional(&target(true), failed_outcome());
        assert_eq!(
            outcome.status,
            TargetStatus::Skipped {
                reason: SkipReason::OptionalUnavailable {
                    last_error: "grok failed with exit code 1".into()
                }
            }
        );
    }

    #[test]
    fn test_required_failure_is_kept() {
        let outcome = soften_optional(&target(false), failed_outcome());
        assert!(outcome.is_failed());
    }
}
