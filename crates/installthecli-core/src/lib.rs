//! # installthecli-core
//!
//! Core library for InstallTheCli providing:
//! - Configuration file parsing (installthecli.yaml)
//! - Platform and Linux distribution detection
//! - The built-in catalog of AI CLI targets and shared prerequisites
//! - Outcome types shared by the engine, the updater and the CLI

pub mod catalog;
pub mod config;
pub mod error;
pub mod platform;
pub mod types;
pub mod utils;

pub use catalog::Catalog;
pub use config::LoadedConfig;
pub use error::{Error, Result};
pub use platform::{detect_platform, PlatformInfo};
pub use utils::{get_home_dir, state_dir};
