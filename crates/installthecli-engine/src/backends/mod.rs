//! Package backends
//!
//! Each backend knows the install, update and presence-query verbs of one
//! package tool. Backends never decide fallback order; the installer does.

mod npm;
mod pip;
mod uv;
mod winget;

pub use npm::{NpmBackend, RetryPolicy, NPM_QUIET_FLAGS};
pub use pip::{PipBackend, PIP_QUIET_FLAGS};
pub use uv::UvBackend;
pub use winget::{WingetBackend, WINGET_FLAGS};

use async_trait::async_trait;
use installthecli_core::types::AttemptResult;

use crate::runner::Runner;

/// Install/update verbs of one package tool
#[async_trait]
pub trait PackageBackend: Send + Sync {
    /// Short tool name for logs
    fn name(&self) -> &'static str;

    /// Install `package`
    async fn install(&self, runner: &Runner, package: &str) -> AttemptResult;

    /// Update an installed `package`
    async fn update(&self, runner: &Runner, package: &str) -> AttemptResult;

    /// Whether `package` is currently installed (read-only)
    async fn is_installed(&self, runner: &Runner, package: &str) -> bool;
}

pub(crate) fn path_string(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}
