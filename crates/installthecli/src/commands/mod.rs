//! CLI command implementations

pub mod doctor;
pub mod install;
pub mod install_all;
pub mod list;
pub mod update_all;
pub mod updater;

use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use camino::Utf8PathBuf;
use installthecli_core::types::InstallerConfig;
use installthecli_core::{detect_platform, state_dir, Catalog, LoadedConfig, PlatformInfo};
use installthecli_engine::backends::RetryPolicy;
use installthecli_engine::{PathLocator, RunMode, Runner, TargetInstaller, ToolLocator};
use tracing::debug;

use crate::cli::{Cli, OutputFormat};

/// Everything a command needs: platform, configuration, catalog and runner
pub struct Context {
    pub platform: PlatformInfo,
    pub config: InstallerConfig,
    pub catalog: Catalog,
    pub runner: Runner,
    pub locator: Arc<dyn ToolLocator>,
    pub state_dir: Utf8PathBuf,
    pub format: OutputFormat,
}

impl Context {
    /// Detect the platform, load configuration and build the catalog
    pub fn load(cli: &Cli) -> Result<Self> {
        let loaded = LoadedConfig::load(cli.config.as_deref())
            .context("Failed to load configuration")?;
        match &loaded.config_path {
            Some(path) => debug!("Using configuration {}", path),
            None => debug!("Using default configuration"),
        }
        let config = loaded.config;

        let platform = detect_platform();
        let catalog = Catalog::builtin(platform.os)
            .without(&config.targets.disabled)
            .context("Invalid targets.disabled")?;

        let mode = if cli.dry_run {
            RunMode::DryRun
        } else {
            RunMode::Execute
        };
        let runner = Runner::system(mode).with_base_env(config.env.clone());

        Ok(Self {
            platform,
            config,
            catalog,
            runner,
            locator: Arc::new(PathLocator::new()),
            state_dir: app_state_dir()?,
            format: cli.format,
        })
    }

    /// Fail unless the platform can be installed to
    pub fn require_supported(&self) -> Result<()> {
        self.platform.require_supported()?;
        Ok(())
    }

    /// Installer sharing one prerequisite cache for this run
    pub fn installer(&self) -> TargetInstaller {
        TargetInstaller::new(
            self.runner.clone(),
            Arc::clone(&self.locator),
            self.platform.clone(),
            self.catalog.prerequisites().to_vec(),
        )
        .with_retry(RetryPolicy::from(&self.config.npm))
    }

    /// True when reports go out as JSON
    pub fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Application state directory as a UTF-8 path
pub fn app_state_dir() -> Result<Utf8PathBuf> {
    let dir = state_dir().ok_or_else(|| anyhow!("Could not determine a state directory"))?;
    Utf8PathBuf::from_path_buf(dir)
        .map_err(|p| anyhow!("State directory is not valid UTF-8: {}", p.display()))
}
