//! Per-run result types: attempts, target outcomes and batch reports

use std::path::PathBuf;

use serde::Serialize;

/// Lines of child output kept on an attempt for diagnostics
pub const OUTPUT_TAIL_LINES: usize = 20;

/// Outcome of trying one candidate for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptResult {
    /// Package identifier that was tried
    pub candidate: String,

    /// Process exit code; `None` when the process could not be spawned or was signalled
    pub exit_code: Option<i32>,

    /// Whether the attempt succeeded
    pub succeeded: bool,

    /// Last lines of stdout
    pub stdout_tail: String,

    /// Last lines of stderr (or the spawn error)
    pub stderr_tail: String,
}

impl AttemptResult {
    /// Successful attempt with no output
    pub fn synthesized_success(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            exit_code: Some(0),
            succeeded: true,
            stdout_tail: String::new(),
            stderr_tail: String::new(),
        }
    }

    /// Attempt whose process never started
    pub fn spawn_failure(candidate: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            candidate: candidate.into(),
            exit_code: None,
            succeeded: false,
            stdout_tail: String::new(),
            stderr_tail: error.to_string(),
        }
    }

    /// One-line description of a failed attempt
    pub fn failure_summary(&self) -> String {
        match self.exit_code {
            Some(code) => format!(
                "{} failed with exit code {}",
                self.candidate,
                format_exit_code(code)
            ),
            None if self.stderr_tail.is_empty() => {
                format!("{} failed without an exit code", self.candidate)
            }
            None => format!("{} failed: {}", self.candidate, self.stderr_tail),
        }
    }

    /// Combined output tails
    pub fn output_tail(&self) -> String {
        match (self.stdout_tail.is_empty(), self.stderr_tail.is_empty()) {
            (true, _) => self.stderr_tail.clone(),
            (false, true) => self.stdout_tail.clone(),
            (false, false) => format!("{}\n{}", self.stdout_tail, self.stderr_tail),
        }
    }
}

/// Keep only the last `max_lines` non-empty lines of `text`
pub fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

/// Whether an exit code is a negative Windows errno reported as unsigned
///
/// Such codes are at or above `0xFFFF0000` when read as `u32`; Rust reports
/// them as negative `i32` values.
pub fn is_windows_errno_exit_code(code: i32) -> bool {
    (code as u32) >= 0xFFFF_0000
}

/// Render an exit code, annotating Windows errno values
pub fn format_exit_code(code: i32) -> String {
    if is_windows_errno_exit_code(code) {
        format!("{} (Windows errno {})", code as u32, code)
    } else {
        code.to_string()
    }
}

/// Why an update left a target untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No candidate is currently installed
    NotInstalled,
    /// The package tool needed for this target is not present
    BackendUnavailable { tool: String },
    /// A candidate is installed but its update failed
    UpdateFailed { candidate: String, error: String },
    /// An optional target could not be installed during a batch
    OptionalUnavailable { last_error: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInstalled => write!(f, "not installed"),
            Self::BackendUnavailable { tool } => write!(f, "{} not available", tool),
            Self::UpdateFailed { candidate, error } => {
                write!(f, "update of {} failed: {}", candidate, error)
            }
            Self::OptionalUnavailable { last_error } => {
                write!(f, "optional, not installed: {}", last_error)
            }
        }
    }
}

/// Final status of one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
    /// Installed (or already present) via `candidate`
    Installed {
        candidate: String,
        note: Option<String>,
    },
    /// Updated in place via `candidate`
    Updated { candidate: String },
    /// Left untouched; never an error
    Skipped { reason: SkipReason },
    /// Every candidate failed
    Failed { last_error: String },
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Installed {
                candidate,
                note: None,
            } => write!(f, "installed ({})", candidate),
            Self::Installed {
                candidate,
                note: Some(note),
            } => write!(f, "installed ({}; {})", candidate, note),
            Self::Updated { candidate } => write!(f, "updated ({})", candidate),
            Self::Skipped { reason } => write!(f, "skipped: {}", reason),
            Self::Failed { last_error } => write!(f, "failed: {}", last_error),
        }
    }
}

/// Outcome of a whole target installation or update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    /// Catalog key
    pub target_key: String,

    /// Display name
    pub label: String,

    /// Final status
    pub status: TargetStatus,

    /// Every candidate attempt, in order
    pub attempts: Vec<AttemptResult>,

    /// Resolved executable of the installed tool, when found
    pub command_path: Option<PathBuf>,
}

impl TargetOutcome {
    /// Create an outcome with no attempts
    pub fn new(
        target_key: impl Into<String>,
        label: impl Into<String>,
        status: TargetStatus,
    ) -> Self {
        Self {
            target_key: target_key.into(),
            label: label.into(),
            status,
            attempts: Vec::new(),
            command_path: None,
        }
    }

    /// True when the target ended in `Failed`
    pub fn is_failed(&self) -> bool {
        matches!(self.status, TargetStatus::Failed { .. })
    }

    /// Candidates attempted, in order
    pub fn attempted_candidates(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.candidate.as_str()).collect()
    }
}

/// Which batch operation produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchKind {
    /// install-all
    Install,
    /// update-all
    Update,
}

/// Aggregate status of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "overall", rename_all = "snake_case")]
pub enum OverallStatus {
    /// No target failed
    AllSucceeded,
    /// The listed target keys failed
    PartialFailure { failed: Vec<String> },
}

/// Outcome of install-all or update-all
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Operation
    pub kind: BatchKind,

    /// One outcome per processed target, in catalog order
    pub outcomes: Vec<TargetOutcome>,
}

impl BatchReport {
    /// Create an empty report
    pub fn new(kind: BatchKind) -> Self {
        Self {
            kind,
            outcomes: Vec::new(),
        }
    }

    /// Compute the aggregate status
    pub fn overall(&self) -> OverallStatus {
        let failed: Vec<String> = self
            .outcomes
            .iter()
            .filter(|o| o.is_failed())
            .map(|o| o.target_key.clone())
            .collect();

        if failed.is_empty() {
            OverallStatus::AllSucceeded
        } else {
            OverallStatus::PartialFailure { failed }
        }
    }

    /// Number of outcomes matching `pred`
    pub fn count(&self, pred: impl Fn(&TargetStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(key: &str, status: TargetStatus) -> TargetOutcome {
        TargetOutcome::new(key, key.to_uppercase(), status)
    }

    #[test]
    fn test_format_exit_code() {
        assert_eq!(format_exit_code(1), "1");
        assert_eq!(format_exit_code(0), "0");
        // 0xFFFFF00E reported by npm for EBUSY
        assert_eq!(format_exit_code(-4082), "4294963214 (Windows errno -4082)");
        assert!(is_windows_errno_exit_code(-1));
        assert!(!is_windows_errno_exit_code(255));
    }

    #[test]
    fn test_tail_lines_keeps_last_non_empty() {
        let text = "a\n\nb\nc\n   \nd\n";
        assert_eq!(tail_lines(text, 2), "c\nd");
        assert_eq!(tail_lines(text, 10), "a\nb\nc\nd");
        assert_eq!(tail_lines("", 3), "");
    }

    #[test]
    fn test_failure_summary() {
        let attempt = AttemptResult {
            candidate: "@openai/codex".into(),
            exit_code: Some(1),
            succeeded: false,
            stdout_tail: String::new(),
            stderr_tail: "boom".into(),
        };
        assert_eq!(
            attempt.failure_summary(),
            "@openai/codex failed with exit code 1"
        );

        let spawn = AttemptResult::spawn_failure("x", "not found");
        assert_eq!(spawn.failure_summary(), "x failed: not found");
    }

    #[test]
    fn test_overall_status() {
        let mut report = BatchReport::new(BatchKind::Install);
        report.outcomes.push(outcome(
            "a",
            TargetStatus::Failed {
                last_error: "x".into(),
            },
        ));
        report.outcomes.push(outcome(
            "b",
            TargetStatus::Installed {
                candidate: "b".into(),
                note: None,
            },
        ));
        assert_eq!(
            report.overall(),
            OverallStatus::PartialFailure {
                failed: vec!["a".into()]
            }
        );

        report.outcomes.remove(0);
        assert_eq!(report.overall(), OverallStatus::AllSucceeded);
    }

    #[test]
    fn test_skips_do_not_fail_a_batch() {
        let mut report = BatchReport::new(BatchKind::Update);
        report.outcomes.push(outcome(
            "a",
            TargetStatus::Skipped {
                reason: SkipReason::UpdateFailed {
                    candidate: "a".into(),
                    error: "exit 1".into(),
                },
            },
        ));
        report.outcomes.push(outcome(
            "b",
            TargetStatus::Skipped {
                reason: SkipReason::NotInstalled,
            },
        ));
        assert_eq!(report.overall(), OverallStatus::AllSucceeded);
        assert_eq!(
            report.count(|s| matches!(s, TargetStatus::Skipped { .. })),
            2
        );
    }

    #[test]
    fn test_status_serializes_with_tag() {
        let status = TargetStatus::Skipped {
            reason: SkipReason::NotInstalled,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"]["reason"], "not_installed");
    }
}
