//! Configuration file loading and parsing

use crate::error::{Error, Result};
use crate::types::InstallerConfig;
use crate::utils::default_config_path;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

/// Loaded InstallTheCli configuration
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// The parsed configuration
    pub config: InstallerConfig,

    /// File it was read from; `None` when built-in defaults are in effect
    pub config_path: Option<Utf8PathBuf>,
}

impl LoadedConfig {
    /// Load configuration from an explicit path or the default location
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::config_not_found(p.as_str())
                    } else {
                        Error::Io(e)
                    }
                })?;
                Self::from_str_at(&content, p)
            }
            None => match default_config_path() {
                Some(p) if p.exists() => {
                    let content = fs::read_to_string(&p)?;
                    Self::from_str_at(&content, &p)
                }
                _ => {
                    debug!("No configuration file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    fn from_str_at(content: &str, path: &Utf8Path) -> Result<Self> {
        debug!("Loading configuration from {}", path);
        let config = parse_config(content)?;
        Ok(Self {
            config,
            config_path: Some(path.to_owned()),
        })
    }
}

/// Parse and validate YAML configuration text
pub fn parse_config(content: &str) -> Result<InstallerConfig> {
    if content.trim().is_empty() {
        return Ok(InstallerConfig::default());
    }

    let config: InstallerConfig = serde_yaml_ng::from_str(content)?;

    if config.npm.max_attempts == 0 {
        return Err(Error::invalid_config("npm.max_attempts must be at least 1"));
    }
    if let Some(key) = config.env.keys().find(|k| k.is_empty() || k.contains('=')) {
        return Err(Error::invalid_config(format!(
            "invalid environment variable name: {:?}",
            key
        )));
    }

    Ok(config)
}
