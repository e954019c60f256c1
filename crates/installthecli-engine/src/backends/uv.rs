use std::path::PathBuf;

use async_trait::async_trait;
use installthecli_core::types::AttemptResult;

use super::{path_string, PackageBackend};
use crate::runner::{CommandSpec, Runner};

/// `uv tool` managed Python applications
#[derive(Debug, Clone)]
pub struct UvBackend {
    uv: PathBuf,
}

impl UvBackend {
    /// Backend driving the uv executable at `uv`
    pub fn new(uv: impl Into<PathBuf>) -> Self {
        Self { uv: uv.into() }
    }

    fn tool(&self) -> CommandSpec {
        CommandSpec::new(path_string(&self.uv)).arg("tool")
    }
}

#[async_trait]
impl PackageBackend for UvBackend {
    fn name(&self) -> &'static str {
        "uv"
    }

    async fn install(&self, runner: &Runner, package: &str) -> AttemptResult {
        runner
            .run(package, &self.tool().args(["install", "--upgrade", package]))
            .await
    }

    async fn update(&self, runner: &Runner, package: &str) -> AttemptResult {
        runner
            .run(package, &self.tool().args(["upgrade", package]))
            .await
    }

    async fn is_installed(&self, runner: &Runner, package: &str) -> bool {
        match runner.query(&self.tool().arg("list")).await {
            Some(output) if output.success() => output
                .stdout
                .lines()
                .filter_map(|line| line.split_whitespace().next())
                .any(|name| name == package),
            _ => false,
        }
    }
}
