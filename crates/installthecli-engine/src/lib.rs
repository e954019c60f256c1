//! Install orchestration for InstallTheCli
//!
//! This crate handles:
//! - Running external commands with dry-run support
//! - Locating installed tools on PATH and in known install directories
//! - Resolving shared prerequisites (Node.js, Python, pip, curl)
//! - Installing and updating single targets with candidate fallback
//! - Batch runs over the catalog with per-target failure isolation

pub mod backends;
pub mod batch;
pub mod installer;
pub mod locator;
pub mod prerequisites;
pub mod probe;
pub mod runner;

pub use batch::BatchOrchestrator;
pub use installer::TargetInstaller;
pub use locator::{PathLocator, ToolLocator};
pub use prerequisites::{PrerequisiteResolver, ResolvedPrerequisite};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, RunMode, Runner, SystemRunner};
