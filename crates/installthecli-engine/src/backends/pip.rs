use async_trait::async_trait;
use installthecli_core::types::{AttemptResult, ProbeCommand};

use super::PackageBackend;
use crate::probe::command_with;
use crate::runner::{CommandSpec, Runner};

/// Flags that keep pip quiet and non-interactive
pub const PIP_QUIET_FLAGS: &[&str] = &["--disable-pip-version-check", "--no-input", "--quiet"];

/// User-level pip installs through a specific interpreter
#[derive(Debug, Clone)]
pub struct PipBackend {
    python: ProbeCommand,
    break_system_packages: bool,
}

impl PipBackend {
    /// Backend for `python`; `break_system_packages` is required on
    /// externally managed Linux Pythons
    pub fn new(python: ProbeCommand, break_system_packages: bool) -> Self {
        Self {
            python,
            break_system_packages,
        }
    }

    /// `<python> -m pip install --user --upgrade <flags> <package>`
    pub fn install_spec(&self, package: &str) -> CommandSpec {
        let mut spec = command_with(&self.python, &["-m", "pip", "install", "--user", "--upgrade"])
            .args(PIP_QUIET_FLAGS.iter().copied());
        if self.break_system_packages {
            spec = spec.arg("--break-system-packages");
        }
        spec.arg(package)
    }
}

#[async_trait]
impl PackageBackend for PipBackend {
    fn name(&self) -> &'static str {
        "pip"
    }

    async fn install(&self, runner: &Runner, package: &str) -> AttemptResult {
        runner.run(package, &self.install_spec(package)).await
    }

    async fn update(&self, runner: &Runner, package: &str) -> AttemptResult {
        runner.run(package, &self.install_spec(package)).await
    }

    async fn is_installed(&self, runner: &Runner, package: &str) -> bool {
        let spec = command_with(&self.python, &["-m", "pip", "show", "--quiet", package]);
        runner.query(&spec).await.is_some_and(|o| o.success())
    }
}
