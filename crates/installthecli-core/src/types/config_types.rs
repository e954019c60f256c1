//! Configuration types for installthecli.yaml

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root installthecli.yaml configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallerConfig {
    /// Background updater settings
    #[serde(default)]
    pub update: UpdateConfig,

    /// npm retry behaviour
    #[serde(default)]
    pub npm: NpmConfig,

    /// Per-machine catalog adjustments
    #[serde(default)]
    pub targets: TargetsConfig,

    /// Extra environment variables applied to every spawned command
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Background updater settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateConfig {
    /// Local time of the daily run, "HH:MM"
    #[serde(default = "default_daily_at")]
    pub daily_at: String,

    /// Run once at system startup
    #[serde(default = "default_true")]
    pub at_boot: bool,

    /// Run once at interactive logon
    #[serde(default = "default_true")]
    pub at_logon: bool,

    /// Scheduled task name (Windows)
    #[serde(default = "default_task_name")]
    pub task_name: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            daily_at: default_daily_at(),
            at_boot: true,
            at_logon: true,
            task_name: default_task_name(),
        }
    }
}

fn default_daily_at() -> String {
    "03:00".to_string()
}

fn default_true() -> bool {
    true
}

fn default_task_name() -> String {
    "InstallTheCli - Update AI CLIs".to_string()
}

/// npm retry behaviour for transient Windows errno failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NpmConfig {
    /// Attempts per candidate, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for NpmConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

/// Per-machine catalog adjustments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetsConfig {
    /// Keys removed from the catalog
    #[serde(default)]
    pub disabled: Vec<String>,
}
