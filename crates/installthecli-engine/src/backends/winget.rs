use std::path::PathBuf;

use async_trait::async_trait;
use installthecli_core::types::{format_exit_code, AttemptResult};
use tracing::warn;

use super::{path_string, PackageBackend};
use crate::runner::{CommandSpec, Runner};

/// Flags shared by every non-interactive winget install or upgrade
pub const WINGET_FLAGS: &[&str] = &[
    "-e",
    "--accept-package-agreements",
    "--accept-source-agreements",
    "--silent",
    "--disable-interactivity",
];

/// Windows Package Manager
#[derive(Debug, Clone)]
pub struct WingetBackend {
    winget: PathBuf,
}

impl WingetBackend {
    /// Backend driving the winget executable at `winget`
    pub fn new(winget: impl Into<PathBuf>) -> Self {
        Self {
            winget: winget.into(),
        }
    }

    fn verb(&self, verb: &str, id: &str) -> CommandSpec {
        CommandSpec::new(path_string(&self.winget))
            .args([verb, "--id", id])
            .args(WINGET_FLAGS.iter().copied())
    }
}

#[async_trait]
impl PackageBackend for WingetBackend {
    fn name(&self) -> &'static str {
        "winget"
    }

    /// `winget install`, falling back to `winget upgrade` for an existing package
    async fn install(&self, runner: &Runner, id: &str) -> AttemptResult {
        let result = runner.run(id, &self.verb("install", id)).await;
        if result.succeeded {
            return result;
        }
        warn!(
            "winget install for {} failed with exit code {}; trying winget upgrade...",
            id,
            result
                .exit_code
                .map(format_exit_code)
                .unwrap_or_else(|| "none".to_string())
        );
        runner.run(id, &self.verb("upgrade", id)).await
    }

    async fn update(&self, runner: &Runner, id: &str) -> AttemptResult {
        runner.run(id, &self.verb("upgrade", id)).await
    }

    async fn is_installed(&self, runner: &Runner, id: &str) -> bool {
        let spec = CommandSpec::new(path_string(&self.winget)).args([
            "list",
            "--id",
            id,
            "-e",
            "--accept-source-agreements",
            "--disable-interactivity",
        ]);
        match runner.query(&spec).await {
            Some(output) => output.success() && output.stdout.contains(id),
            None => false,
        }
    }
}
