//! Target installer integration tests
//!
//! Tests single-target behaviour including:
//! - Candidate fallback order and exhaustion
//! - npm transient-failure retry and locked-file tolerance
//! - winget install → upgrade fallback
//! - Vendor install scripts
//! - uv → pip toolchain fallback
//! - Update skip rules

mod common;

use common::*;
use installthecli_core::catalog::OLLAMA_INSTALL_SCRIPT_URL;
use installthecli_core::types::{SkipReason, TargetSpec, TargetStatus};
use installthecli_core::{Catalog, Error};
use std::path::PathBuf;

fn codex() -> TargetSpec {
    TargetSpec::npm("codex", "Codex CLI", &["pkgA", "pkgB"]).with_commands(&["codex"])
}

fn script_key() -> String {
    format!("sh -c curl -fsSL {} | sh", OLLAMA_INSTALL_SCRIPT_URL)
}

#[cfg(test)]
mod candidate_fallback {
    use super::*;

    #[tokio::test]
    async fn test_stops_at_first_successful_candidate() {
        let harness = Harness::debian();
        harness
            .runner
            .mock_failure(&npm_install("pkgA"), "npm error 404", 1);

        let outcome = harness.installer().install(&codex()).await.unwrap();

        assert_eq!(
            outcome.status,
            TargetStatus::Installed {
                candidate: "pkgB".into(),
                note: None
            }
        );
        assert_eq!(outcome.attempted_candidates(), vec!["pkgA", "pkgB"]);
    }

    #[tokio::test]
    async fn test_later_candidates_not_attempted_after_success() {
        let harness = Harness::debian();
        let target = TargetSpec::npm("multi", "Multi", &["c1", "c2", "c3"]);
        harness.runner.mock_failure(&npm_install("c1"), "", 1);

        let outcome = harness.installer().install(&target).await.unwrap();

        assert_eq!(outcome.attempted_candidates(), vec!["c1", "c2"]);
        assert!(!harness.runner.was_invoked(&npm_install("c3")));
    }

    #[tokio::test]
    async fn test_exhaustion_attempts_every_candidate() {
        let harness = Harness::debian();
        let target = TargetSpec::npm("multi", "Multi", &["c1", "c2", "c3"]);
        for c in ["c1", "c2", "c3"] {
            harness.runner.mock_failure(&npm_install(c), "npm error", 1);
        }

        let outcome = harness.installer().install(&target).await.unwrap();

        assert_eq!(outcome.attempted_candidates(), vec!["c1", "c2", "c3"]);
        assert_eq!(
            outcome.status,
            TargetStatus::Failed {
                last_error: "c3 failed with exit code 1".into()
            }
        );
    }

    #[tokio::test]
    async fn test_resolves_installed_command() {
        let harness = Harness::debian();
        harness
            .locator
            .appear_after("codex", &npm_install("pkgA"));

        let outcome = harness.installer().install(&codex()).await.unwrap();

        assert_eq!(outcome.command_path, Some(PathBuf::from("codex")));
        assert!(harness.runner.was_invoked("npm prefix -g"));
    }
}

#[cfg(test)]
mod prerequisites {
    use super::*;

    #[tokio::test]
    async fn test_missing_node_runtime_is_installed_first() {
        let harness = Harness::bare(debian());
        let install_node = "sudo apt-get install -y nodejs npm";
        harness.locator.appear_after("node", install_node);
        harness.locator.appear_after("npm", install_node);

        let outcome = harness.installer().install(&codex()).await.unwrap();

        assert!(matches!(outcome.status, TargetStatus::Installed { .. }));
        let keys = harness.runner.invoked_keys();
        let apt = keys.iter().position(|k| k == install_node).unwrap();
        let npm = keys.iter().position(|k| k == &npm_install("pkgA")).unwrap();
        assert!(apt < npm);
        assert!(harness.runner.was_invoked("sudo apt-get update"));
    }

    #[tokio::test]
    async fn test_unsatisfied_prerequisite_is_an_error() {
        let harness = Harness::bare(debian());
        harness.runner.mock_success("whoami", "root");

        let err = harness.installer().install(&codex()).await.unwrap_err();

        assert!(matches!(err, Error::PrerequisiteUnsatisfied { ref key, .. } if key == "node-runtime"));
        assert!(!harness.runner.was_invoked(&npm_install("pkgA")));
    }
}

#[cfg(test)]
mod npm_retry {
    use super::*;
    use installthecli_engine::backends::RetryPolicy;

    #[tokio::test]
    async fn test_windows_errno_is_retried() {
        let harness = Harness::debian();
        harness.runner.queue(
            &npm_install("pkgA"),
            MockCommandResult::failure("npm error code EBUSY", -4082),
        );

        let outcome = harness.installer().install(&codex()).await.unwrap();

        assert_eq!(
            outcome.status,
            TargetStatus::Installed {
                candidate: "pkgA".into(),
                note: None
            }
        );
        assert_eq!(harness.runner.invocation_count(&npm_install("pkgA")), 2);
    }

    #[tokio::test]
    async fn test_ordinary_failure_is_not_retried() {
        let harness = Harness::debian();
        harness.runner.mock_failure(&npm_install("pkgA"), "404", 1);

        harness.installer().install(&codex()).await.unwrap();

        assert_eq!(harness.runner.invocation_count(&npm_install("pkgA")), 1);
    }

    #[tokio::test]
    async fn test_retry_budget_is_respected() {
        let harness = Harness::debian();
        harness
            .runner
            .mock_failure(&npm_install("pkgA"), "EBUSY", -4082);
        harness
            .runner
            .mock_failure(&npm_install("pkgB"), "EBUSY", -4082);

        let mut installer = harness.installer().with_retry(RetryPolicy {
            max_attempts: 2,
            delay: std::time::Duration::ZERO,
        });
        let outcome = installer.install(&codex()).await.unwrap();

        assert!(outcome.is_failed());
        assert_eq!(harness.runner.invocation_count(&npm_install("pkgA")), 2);
        assert_eq!(harness.runner.invocation_count(&npm_install("pkgB")), 2);
    }

    #[tokio::test]
    async fn test_locked_file_with_existing_command_counts_as_installed() {
        let harness = Harness::debian();
        harness.locator.add_tool_at("codex", "/usr/local/bin/codex");
        for pkg in ["pkgA", "pkgB"] {
            harness
                .runner
                .mock_failure(&npm_install(pkg), "npm error code EBUSY", -4082);
        }

        let outcome = harness.installer().install(&codex()).await.unwrap();

        match &outcome.status {
            TargetStatus::Installed { candidate, note } => {
                assert_eq!(candidate, "pkgA");
                assert!(note.as_deref().unwrap().contains("locked file"));
            }
            other => panic!("expected installed, got {other:?}"),
        }
        assert_eq!(
            outcome.command_path,
            Some(PathBuf::from("/usr/local/bin/codex"))
        );
    }

    #[tokio::test]
    async fn test_locked_file_without_command_still_fails() {
        let harness = Harness::debian();
        for pkg in ["pkgA", "pkgB"] {
            harness
                .runner
                .mock_failure(&npm_install(pkg), "npm error code EBUSY", -4082);
        }

        let outcome = harness.installer().install(&codex()).await.unwrap();

        assert!(outcome.is_failed());
    }
}

#[cfg(test)]
mod winget {
    use super::*;

    const WINGET_TAIL: &str =
        "-e --accept-package-agreements --accept-source-agreements --silent --disable-interactivity";

    #[tokio::test]
    async fn test_install_falls_back_to_upgrade() {
        let harness = Harness::bare(windows());
        harness.locator.add_tool("winget");
        harness.runner.mock_failure(
            &format!("winget install --id Ollama.Ollama {}", WINGET_TAIL),
            "already installed",
            -1978335189,
        );
        let catalog = Catalog::builtin(windows().os);
        let ollama = catalog.get("ollama").unwrap();

        let outcome = harness.installer().install(ollama).await.unwrap();

        assert_eq!(
            outcome.status,
            TargetStatus::Installed {
                candidate: "Ollama.Ollama".into(),
                note: None
            }
        );
        assert!(harness
            .runner
            .was_invoked(&format!("winget upgrade --id Ollama.Ollama {}", WINGET_TAIL)));
    }

    #[tokio::test]
    async fn test_missing_winget_fails_target() {
        let harness = Harness::bare(windows());
        let catalog = Catalog::builtin(windows().os);

        let outcome = harness
            .installer()
            .install(catalog.get("ollama").unwrap())
            .await
            .unwrap();

        assert_eq!(
            outcome.status,
            TargetStatus::Failed {
                last_error: "winget was not found".into()
            }
        );
    }
}

#[cfg(test)]
mod vendor_script {
    use super::*;

    fn ollama() -> TargetSpec {
        Catalog::builtin(debian().os)
            .get("ollama")
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_present_tool_skips_script() {
        let harness = Harness::debian();
        harness.locator.add_tool_at("ollama", "/usr/local/bin/ollama");

        let outcome = harness.installer().install(&ollama()).await.unwrap();

        assert!(matches!(outcome.status, TargetStatus::Installed { .. }));
        assert!(outcome.attempts.is_empty());
        assert!(!harness.runner.was_program_invoked("sh"));
    }

    #[tokio::test]
    async fn test_absent_tool_runs_script() {
        let harness = Harness::debian();
        harness.locator.appear_after("ollama", &script_key());

        let outcome = harness.installer().install(&ollama()).await.unwrap();

        assert_eq!(
            outcome.status,
            TargetStatus::Installed {
                candidate: "ollama".into(),
                note: None
            }
        );
        assert_eq!(harness.runner.invocation_count(&script_key()), 1);
        assert_eq!(outcome.command_path, Some(PathBuf::from("ollama")));
    }

    #[tokio::test]
    async fn test_failed_script_with_tool_present_is_tolerated() {
        let harness = Harness::debian();
        harness
            .runner
            .mock_failure(&script_key(), "systemd not running", 1);
        harness.locator.appear_after("ollama", &script_key());

        let outcome = harness.installer().install(&ollama()).await.unwrap();

        match outcome.status {
            TargetStatus::Installed { note, .. } => {
                assert!(note.unwrap().contains("install script failed"))
            }
            other => panic!("expected installed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_script_without_tool_fails() {
        let harness = Harness::debian();
        harness.runner.mock_failure(&script_key(), "404", 22);

        let outcome = harness.installer().install(&ollama()).await.unwrap();

        assert_eq!(
            outcome.status,
            TargetStatus::Failed {
                last_error: "ollama failed with exit code 22".into()
            }
        );
    }
}

#[cfg(test)]
mod toolchain {
    use super::*;

    const PIP_FLAGS: &str =
        "--disable-pip-version-check --no-input --quiet --break-system-packages";

    fn pip_install(pkg: &str) -> String {
        format!(
            "python3 -m pip install --user --upgrade {} {}",
            PIP_FLAGS, pkg
        )
    }

    fn mistral() -> TargetSpec {
        Catalog::builtin(debian().os)
            .get("mistral")
            .unwrap()
            .clone()
    }

    fn python_harness() -> Harness {
        let harness = Harness::debian();
        harness.locator.add_tool("python3");
        harness
            .runner
            .mock_success("python3 --version", "Python 3.12.3\n");
        harness
            .runner
            .mock_success("python3 -m pip --version", "pip 24.0 from /usr/lib\n");
        harness
    }

    #[tokio::test]
    async fn test_uv_failure_falls_back_to_pip() {
        let harness = python_harness();
        harness.locator.appear_after("uv", &pip_install("uv"));
        harness
            .runner
            .mock_failure("uv tool install --upgrade mistral-vibe", "resolver error", 2);

        let outcome = harness.installer().install(&mistral()).await.unwrap();

        assert_eq!(
            outcome.status,
            TargetStatus::Installed {
                candidate: "mistral-vibe".into(),
                note: Some("installed with pip".into())
            }
        );
        assert_eq!(outcome.attempts.len(), 2);
        assert!(harness.runner.was_invoked(&pip_install("mistral-vibe")));
    }

    #[tokio::test]
    async fn test_uv_success_skips_pip() {
        let harness = python_harness();
        harness.locator.add_tool("uv");

        let outcome = harness.installer().install(&mistral()).await.unwrap();

        assert_eq!(
            outcome.status,
            TargetStatus::Installed {
                candidate: "mistral-vibe".into(),
                note: None
            }
        );
        assert!(!harness.runner.was_invoked(&pip_install("mistral-vibe")));
        assert!(!harness.runner.was_invoked(&pip_install("uv")));
    }

    #[tokio::test]
    async fn test_python_below_floor_is_rejected() {
        let harness = Harness::debian();
        harness.locator.add_tool("python3");
        harness
            .runner
            .mock_success("python3 --version", "Python 3.11.9\n");

        let err = harness.installer().install(&mistral()).await.unwrap_err();

        assert!(matches!(err, Error::PrerequisiteUnsatisfied { ref key, .. } if key == "python"));
    }
}

#[cfg(test)]
mod update {
    use super::*;

    #[tokio::test]
    async fn test_only_installed_candidates_are_updated() {
        let harness = Harness::debian();
        harness
            .runner
            .mock_success(&npm_ls("pkgB"), "/usr/lib\n└── pkgB@1.2.0\n");

        let outcome = harness.installer().update(&codex()).await;

        assert_eq!(
            outcome.status,
            TargetStatus::Updated {
                candidate: "pkgB".into()
            }
        );
        assert!(!harness.runner.was_invoked(&npm_update("pkgA")));
        assert!(harness.runner.was_invoked(&npm_update("pkgB")));
    }

    #[tokio::test]
    async fn test_nothing_installed_is_skipped() {
        let harness = Harness::debian();

        let outcome = harness.installer().update(&codex()).await;

        assert_eq!(
            outcome.status,
            TargetStatus::Skipped {
                reason: SkipReason::NotInstalled
            }
        );
        assert!(outcome.attempts.is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_is_skipped_not_failed() {
        let harness = Harness::debian();
        harness
            .runner
            .mock_success(&npm_ls("pkgA"), "└── pkgA@0.9.0\n");
        harness
            .runner
            .mock_failure(&npm_update("pkgA"), "network", 1);

        let outcome = harness.installer().update(&codex()).await;

        assert_eq!(
            outcome.status,
            TargetStatus::Skipped {
                reason: SkipReason::UpdateFailed {
                    candidate: "pkgA".into(),
                    error: "pkgA failed with exit code 1".into()
                }
            }
        );
        assert!(!outcome.is_failed());
    }

    #[tokio::test]
    async fn test_missing_npm_is_skipped() {
        let harness = Harness::bare(debian());

        let outcome = harness.installer().update(&codex()).await;

        assert_eq!(
            outcome.status,
            TargetStatus::Skipped {
                reason: SkipReason::BackendUnavailable { tool: "npm".into() }
            }
        );
        assert!(!harness.runner.was_invoked("sudo apt-get install -y nodejs npm"));
    }

    #[tokio::test]
    async fn test_absent_vendor_tool_is_not_installed_by_update() {
        let harness = Harness::debian();
        let ollama = Catalog::builtin(debian().os)
            .get("ollama")
            .unwrap()
            .clone();

        let outcome = harness.installer().update(&ollama).await;

        assert_eq!(
            outcome.status,
            TargetStatus::Skipped {
                reason: SkipReason::NotInstalled
            }
        );
        assert!(!harness.runner.was_program_invoked("sh"));
    }
}
