//! Human rendering of target outcomes and batch reports

use installthecli_core::types::{
    BatchKind, BatchReport, OverallStatus, SkipReason, TargetOutcome, TargetStatus,
};
use tabled::{settings::Style, Table, Tabled};

use crate::output;

#[derive(Tabled)]
struct OutcomeRow {
    target: String,
    status: String,
    candidate: String,
    details: String,
}

impl From<&TargetOutcome> for OutcomeRow {
    fn from(outcome: &TargetOutcome) -> Self {
        let (status, candidate, details) = match &outcome.status {
            TargetStatus::Installed { candidate, note } => (
                "installed",
                candidate.clone(),
                note.clone().unwrap_or_default(),
            ),
            TargetStatus::Updated { candidate } => ("updated", candidate.clone(), String::new()),
            TargetStatus::Skipped { reason } => {
                let candidate = match reason {
                    SkipReason::UpdateFailed { candidate, .. } => candidate.clone(),
                    _ => "-".to_string(),
                };
                ("skipped", candidate, reason.to_string())
            }
            TargetStatus::Failed { last_error } => ("failed", "-".to_string(), last_error.clone()),
        };

        let details = match (&outcome.command_path, details.is_empty()) {
            (Some(path), true) => path.display().to_string(),
            (Some(path), false) => format!("{} ({})", details, path.display()),
            (None, _) => details,
        };

        Self {
            target: outcome.label.clone(),
            status: status.to_string(),
            candidate,
            details,
        }
    }
}

/// Table of outcomes, one row per target
pub fn outcome_table(outcomes: &[TargetOutcome]) -> String {
    let rows: Vec<OutcomeRow> = outcomes.iter().map(OutcomeRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

/// One-line summary of a batch
pub fn summary_line(report: &BatchReport) -> String {
    let installed = report.count(|s| matches!(s, TargetStatus::Installed { .. }));
    let updated = report.count(|s| matches!(s, TargetStatus::Updated { .. }));
    let skipped = report.count(|s| matches!(s, TargetStatus::Skipped { .. }));
    let failed = report.count(|s| matches!(s, TargetStatus::Failed { .. }));

    match report.kind {
        BatchKind::Install => format!(
            "{} of {} installed, {} skipped, {} failed",
            installed,
            report.outcomes.len(),
            skipped,
            failed
        ),
        BatchKind::Update => format!(
            "{} of {} updated, {} skipped, {} failed",
            updated,
            report.outcomes.len(),
            skipped,
            failed
        ),
    }
}

/// Print a batch report; always lists every target
pub fn print_batch(report: &BatchReport) {
    let title = match report.kind {
        BatchKind::Install => "Install summary",
        BatchKind::Update => "Update summary",
    };
    output::header(title);
    println!("{}", outcome_table(&report.outcomes));

    match report.overall() {
        OverallStatus::AllSucceeded => output::success(&summary_line(report)),
        OverallStatus::PartialFailure { failed } => {
            output::warning(&summary_line(report));
            output::error(&format!("Failed: {}", failed.join(", ")));
        }
    }
}

/// Print a single target outcome
pub fn print_outcome(outcome: &TargetOutcome) {
    match &outcome.status {
        TargetStatus::Failed { last_error } => {
            output::error(&format!("{}: {}", outcome.label, last_error));
            for attempt in outcome.attempts.iter().filter(|a| !a.succeeded) {
                output::kv(&attempt.candidate, &attempt.failure_summary());
                let tail = attempt.output_tail();
                if !tail.is_empty() {
                    println!("{}", tail);
                }
            }
        }
        TargetStatus::Skipped { reason } => {
            output::warning(&format!("{}: skipped, {}", outcome.label, reason))
        }
        status => output::success(&format!("{}: {}", outcome.label, status)),
    }
    if let Some(path) = &outcome.command_path {
        output::kv("command", &path.display().to_string());
    }
}
