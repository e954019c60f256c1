//! Fixtures for engine tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use installthecli_core::platform::{LinuxDistro, Platform, PlatformInfo};
use installthecli_core::Catalog;
use installthecli_engine::backends::RetryPolicy;
use installthecli_engine::{PrerequisiteResolver, RunMode, Runner, TargetInstaller};

use super::mocks::{MockLocator, MockRunner};

/// Flags every npm command carries
pub const NPM: &str = "npm --no-fund --no-audit --no-update-notifier --loglevel error";

/// `npm install -g <package>` as recorded by the mock
pub fn npm_install(package: &str) -> String {
    format!("{} install -g {}", NPM, package)
}

/// `npm update -g <package>` as recorded by the mock
pub fn npm_update(package: &str) -> String {
    format!("{} update -g {}", NPM, package)
}

/// `npm ls -g --depth=0 <package>` as recorded by the mock
pub fn npm_ls(package: &str) -> String {
    format!("{} ls -g --depth=0 {}", NPM, package)
}

pub fn debian() -> PlatformInfo {
    PlatformInfo::for_os(Platform::Linux(LinuxDistro::Debian))
}

pub fn windows() -> PlatformInfo {
    PlatformInfo::for_os(Platform::Windows)
}

/// Retry policy without delays
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        delay: Duration::ZERO,
    }
}

/// Everything a test needs to drive an installer against mocks
pub struct Harness {
    pub runner: Arc<MockRunner>,
    pub locator: Arc<MockLocator>,
    pub platform: PlatformInfo,
    pub mode: RunMode,
}

impl Harness {
    /// Debian harness where node, npm and curl are already present
    pub fn debian() -> Self {
        let harness = Self::bare(debian());
        for tool in ["node", "npm", "curl"] {
            harness.locator.add_tool(tool);
        }
        harness.runner.mock_success("whoami", "root\n");
        harness
    }

    /// Harness with an empty locator
    pub fn bare(platform: PlatformInfo) -> Self {
        let runner = MockRunner::shared();
        Self {
            locator: Arc::new(MockLocator::linked(runner.clone())),
            runner,
            platform,
            mode: RunMode::Execute,
        }
    }

    pub fn dry_run(mut self) -> Self {
        self.mode = RunMode::DryRun;
        self
    }

    pub fn runner(&self) -> Runner {
        Runner::new(self.runner.clone(), self.mode)
    }

    /// Installer using the built-in prerequisites for this platform
    pub fn installer(&self) -> TargetInstaller {
        TargetInstaller::new(
            self.runner(),
            self.locator.clone(),
            self.platform.clone(),
            Catalog::builtin(self.platform.os).prerequisites().to_vec(),
        )
        .with_retry(fast_retry(3))
    }

    /// Resolver using the built-in prerequisites for this platform
    pub fn resolver(&self) -> PrerequisiteResolver {
        PrerequisiteResolver::new(
            self.runner(),
            self.locator.clone(),
            self.platform.clone(),
            Catalog::builtin(self.platform.os).prerequisites().to_vec(),
        )
    }
}
