use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use installthecli_core::types::{
    format_exit_code, is_windows_errno_exit_code, AttemptResult, NpmConfig,
};
use tracing::warn;

use super::{path_string, PackageBackend};
use crate::runner::{CommandSpec, Runner};

/// Flags that keep npm output to errors only
pub const NPM_QUIET_FLAGS: &[&str] = &[
    "--no-fund",
    "--no-audit",
    "--no-update-notifier",
    "--loglevel",
    "error",
];

/// Retry policy for transient npm failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per candidate, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&NpmConfig::default())
    }
}

impl From<&NpmConfig> for RetryPolicy {
    fn from(config: &NpmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

/// Global npm packages
#[derive(Debug, Clone)]
pub struct NpmBackend {
    npm: PathBuf,
    retry: RetryPolicy,
}

impl NpmBackend {
    /// Backend driving the npm executable at `npm`
    pub fn new(npm: impl Into<PathBuf>, retry: RetryPolicy) -> Self {
        Self {
            npm: npm.into(),
            retry,
        }
    }

    /// npm with its own directory first on PATH so `node` resolves next to it
    fn base(&self) -> CommandSpec {
        let mut spec = CommandSpec::new(path_string(&self.npm))
            .args(NPM_QUIET_FLAGS.iter().copied())
            .env("npm_config_update_notifier", "false");
        if let Some(dir) = self.npm.parent().filter(|d| !d.as_os_str().is_empty()) {
            spec = spec.prepend_path(dir);
        }
        spec
    }
}

#[async_trait]
impl PackageBackend for NpmBackend {
    fn name(&self) -> &'static str {
        "npm"
    }

    async fn install(&self, runner: &Runner, package: &str) -> AttemptResult {
        let spec = self.base().args(["install", "-g", package]);
        let mut attempt = 1;
        loop {
            let result = runner.run(package, &spec).await;
            if result.succeeded {
                return result;
            }

            let transient = result.exit_code.is_some_and(is_windows_errno_exit_code);
            if !transient || attempt >= self.retry.max_attempts {
                return result;
            }

            attempt += 1;
            warn!(
                "Transient npm failure for {} (exit code {}, possible Windows file lock). Retrying in {}s (attempt {}/{})",
                package,
                result.exit_code.map(format_exit_code).unwrap_or_default(),
                self.retry.delay.as_secs(),
                attempt,
                self.retry.max_attempts
            );
            tokio::time::sleep(self.retry.delay).await;
        }
    }

    async fn update(&self, runner: &Runner, package: &str) -> AttemptResult {
        runner
            .run(package, &self.base().args(["update", "-g", package]))
            .await
    }

    async fn is_installed(&self, runner: &Runner, package: &str) -> bool {
        let spec = self.base().args(["ls", "-g", "--depth=0", package]);
        match runner.query(&spec).await {
            Some(output) => output.success() && output.stdout.contains(package),
            None => false,
        }
    }
}
