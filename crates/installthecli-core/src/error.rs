//! Error types for installthecli-core

use thiserror::Error;

/// Result type alias using installthecli-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for InstallTheCli
///
/// A single failed candidate and a skipped update are not errors: they are
/// recorded as data on [`crate::types::AttemptResult`] and
/// [`crate::types::TargetStatus`].
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Target key not present in the catalog
    #[error("Unknown target: {key}. Run `installthecli list` to see available targets")]
    UnknownTarget { key: String },

    /// Two catalog entries share a key
    #[error("Duplicate target key in catalog: {key}")]
    DuplicateTarget { key: String },

    /// A shared dependency could not be installed or verified
    #[error("Prerequisite {key} is not satisfied: {reason}")]
    PrerequisiteUnsatisfied { key: String, reason: String },

    /// Current platform or distribution is not supported
    #[error("Unsupported environment: {message}")]
    UnsupportedEnvironment { message: String },

    /// Every candidate for a target failed
    #[error("Failed to install {key}: {last_error}")]
    TargetInstallFailed { key: String, last_error: String },

    /// Update schedule could not be parsed
    #[error("Invalid update schedule: {message}")]
    InvalidSchedule { message: String },

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// External command could not be started
    #[error("Failed to spawn {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unknown target error
    pub fn unknown_target(key: impl Into<String>) -> Self {
        Self::UnknownTarget { key: key.into() }
    }

    /// Create a duplicate target error
    pub fn duplicate_target(key: impl Into<String>) -> Self {
        Self::DuplicateTarget { key: key.into() }
    }

    /// Create a prerequisite unsatisfied error
    pub fn prerequisite_unsatisfied(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PrerequisiteUnsatisfied {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported environment error
    pub fn unsupported_environment(message: impl Into<String>) -> Self {
        Self::UnsupportedEnvironment {
            message: message.into(),
        }
    }

    /// Create a target install failed error
    pub fn target_install_failed(key: impl Into<String>, last_error: impl Into<String>) -> Self {
        Self::TargetInstallFailed {
            key: key.into(),
            last_error: last_error.into(),
        }
    }

    /// Create an invalid schedule error
    pub fn invalid_schedule(message: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            message: message.into(),
        }
    }

    /// Create a command spawn error
    pub fn command_spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandSpawn {
            program: program.into(),
            source,
        }
    }

    /// Whether this error means the process must stop before any mutation
    pub fn is_unsupported_environment(&self) -> bool {
        matches!(self, Self::UnsupportedEnvironment { .. })
    }
}
