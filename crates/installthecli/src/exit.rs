//! Process exit codes

use std::process::ExitCode;

use installthecli_core::types::{BatchReport, OverallStatus};

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Nothing failed
    Success,
    /// At least one target failed, or the command itself failed
    Failure,
    /// Platform or distribution not supported
    Unsupported,
}

impl Exit {
    /// Numeric process exit code
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Unsupported => 2,
        }
    }

    /// Exit for an install batch
    pub fn for_report(report: &BatchReport) -> Self {
        match report.overall() {
            OverallStatus::AllSucceeded => Self::Success,
            OverallStatus::PartialFailure { .. } => Self::Failure,
        }
    }

    /// Exit for a command that returned an error
    pub fn for_error(err: &anyhow::Error) -> Self {
        let unsupported = err
            .chain()
            .filter_map(|e| e.downcast_ref::<installthecli_core::Error>())
            .any(|e| e.is_unsupported_environment());
        if unsupported {
            Self::Unsupported
        } else {
            Self::Failure
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use installthecli_core::types::{BatchKind, TargetOutcome, TargetStatus};
    use installthecli_core::Error;

    #[test]
    fn test_report_exit_codes() {
        let mut report = BatchReport::new(BatchKind::Install);
        assert_eq!(Exit::for_report(&report), Exit::Success);

        report.outcomes.push(TargetOutcome::new(
            "codex",
            "Codex CLI",
            TargetStatus::Failed {
                last_error: "@openai/codex failed with exit code 1".into(),
            },
        ));
        assert_eq!(Exit::for_report(&report).code(), 1);
    }

    #[test]
    fn test_unsupported_environment_is_two() {
        let err: anyhow::Error = Error::unsupported_environment("macOS is not supported").into();
        assert_eq!(Exit::for_error(&err).code(), 2);

        let wrapped = Err::<(), _>(Error::unsupported_environment("no cron"))
            .context("Failed to register updater")
            .unwrap_err();
        assert_eq!(Exit::for_error(&wrapped), Exit::Unsupported);
    }

    #[test]
    fn test_other_errors_are_one() {
        let err: anyhow::Error = Error::unknown_target("nope").into();
        assert_eq!(Exit::for_error(&err), Exit::Failure);
    }
}
