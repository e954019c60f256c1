//! Catalog entry types: install targets and shared prerequisites

use semver::Version;
use serde::Serialize;

/// Package manager that installs named candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageManagerKind {
    /// `npm install -g`
    Npm,
    /// `winget install --id`
    Winget,
}

impl std::fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Npm => write!(f, "npm"),
            Self::Winget => write!(f, "winget"),
        }
    }
}

/// Python package tools usable for a language-toolchain target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolchainTool {
    /// `uv tool install`
    Uv,
    /// `python -m pip install --user`
    Pip,
}

impl std::fmt::Display for ToolchainTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uv => write!(f, "uv"),
            Self::Pip => write!(f, "pip"),
        }
    }
}

/// Installation mechanism of a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Backend {
    /// Try each candidate package in order with one package manager
    PackageManagerCandidates { manager: PackageManagerKind },
    /// One-shot fetch-and-execute installer script
    VendorScript { url: String },
    /// Install through a toolchain's own package tool, preferred then fallback
    LanguageToolchain {
        preferred: ToolchainTool,
        fallback: ToolchainTool,
    },
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PackageManagerCandidates { manager } => write!(f, "{}", manager),
            Self::VendorScript { .. } => write!(f, "vendor script"),
            Self::LanguageToolchain {
                preferred,
                fallback,
            } => write!(f, "{} -> {}", preferred, fallback),
        }
    }
}

/// Identifier of a shared prerequisite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrerequisiteKey {
    /// Node.js plus its companion npm
    NodeRuntime,
    /// Python interpreter meeting a version floor
    Python,
    /// pip module of the resolved Python
    Pip,
    /// curl, used by vendor scripts
    Curl,
}

impl PrerequisiteKey {
    /// Stable lowercase name used in logs and errors
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeRuntime => "node-runtime",
            Self::Python => "python",
            Self::Pip => "pip",
            Self::Curl => "curl",
        }
    }
}

impl std::fmt::Display for PrerequisiteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An installable tool tracked by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSpec {
    /// Unique lowercase identifier (e.g., "codex")
    pub key: String,

    /// Human-readable name
    pub label: String,

    /// Installation mechanism
    pub backend: Backend,

    /// Package identifiers in priority order; the first success wins
    pub candidates: Vec<String>,

    /// Executable names the installed tool may expose, in lookup order
    pub commands: Vec<String>,

    /// Prerequisites resolved before any attempt, in resolution order
    pub prerequisite_keys: Vec<PrerequisiteKey>,

    /// Nice-to-have target, excluded by `--required-only`
    pub optional: bool,
}

impl TargetSpec {
    /// Create a target with a single candidate equal to its key
    pub fn new(key: impl Into<String>, label: impl Into<String>, backend: Backend) -> Self {
        let key = key.into();
        Self {
            candidates: vec![key.clone()],
            commands: vec![key.clone()],
            key,
            label: label.into(),
            backend,
            prerequisite_keys: Vec::new(),
            optional: false,
        }
    }

    /// Target installed from npm candidates
    pub fn npm(key: impl Into<String>, label: impl Into<String>, candidates: &[&str]) -> Self {
        Self::new(
            key,
            label,
            Backend::PackageManagerCandidates {
                manager: PackageManagerKind::Npm,
            },
        )
        .with_candidates(candidates)
        .with_prerequisites(&[PrerequisiteKey::NodeRuntime])
    }

    /// Replace the candidate list
    pub fn with_candidates(mut self, candidates: &[&str]) -> Self {
        self.candidates = candidates.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Replace the command names
    pub fn with_commands(mut self, commands: &[&str]) -> Self {
        self.commands = commands.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Replace the prerequisite list
    pub fn with_prerequisites(mut self, keys: &[PrerequisiteKey]) -> Self {
        self.prerequisite_keys = keys.to_vec();
        self
    }

    /// Mark as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// How to invoke a located interpreter, e.g. `py -3.14`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProbeCommand {
    /// Executable name or path
    pub program: String,
    /// Arguments that always precede the real arguments
    pub prefix_args: Vec<String>,
}

impl ProbeCommand {
    /// A bare executable name
    pub fn bare(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    /// An executable with fixed leading arguments
    pub fn with_prefix(program: impl Into<String>, prefix_args: &[&str]) -> Self {
        Self {
            program: program.into(),
            prefix_args: prefix_args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl std::fmt::Display for ProbeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.prefix_args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How presence of a prerequisite is checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Probe {
    /// Every listed executable must be locatable; the first is the primary
    Executables { names: Vec<String> },
    /// First interpreter, in priority order, whose `--version` meets the floor
    VersionedInterpreter { candidates: Vec<ProbeCommand> },
    /// `<python> -m <module> --version` succeeds for the resolved Python
    PythonModule { module: String },
}

/// How a missing prerequisite is installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InstallAction {
    /// `winget install --id <id>`
    Winget { id: String },
    /// Distribution packages through apt-get/dnf/pacman
    SystemPackages { packages: Vec<String> },
    /// `<python> <args...>`, e.g. `-m ensurepip --upgrade`
    PythonInvocation { args: Vec<String> },
}

/// A shared dependency that one or more targets need
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrerequisiteSpec {
    /// Identifier
    pub key: PrerequisiteKey,

    /// Minimum acceptable version, when a floor applies
    #[serde(serialize_with = "serialize_floor")]
    pub version_floor: Option<Version>,

    /// Presence check
    pub probe: Probe,

    /// Platform install action
    pub install_action: InstallAction,

    /// Prerequisites that must be resolved first
    pub depends_on: Vec<PrerequisiteKey>,
}

fn serialize_floor<S: serde::Serializer>(
    floor: &Option<Version>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match floor {
        Some(v) => serializer.serialize_str(&format!(">={}", v)),
        None => serializer.serialize_none(),
    }
}

impl PrerequisiteSpec {
    /// Human-readable constraint, e.g. ">= 3.12"
    pub fn constraint_display(&self) -> String {
        match &self.version_floor {
            Some(v) if v.patch == 0 => format!(">= {}.{}", v.major, v.minor),
            Some(v) => format!(">= {}", v),
            None => "any".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npm_target_builder() {
        let target = TargetSpec::npm("qwen", "Qwen CLI", &["@qwen-code/qwen-code", "qwen-code"])
            .with_commands(&["qwen", "qwen-code"]);
        assert_eq!(target.candidates, vec!["@qwen-code/qwen-code", "qwen-code"]);
        assert_eq!(target.prerequisite_keys, vec![PrerequisiteKey::NodeRuntime]);
        assert!(!target.optional);
        assert_eq!(target.backend.to_string(), "npm");
    }

    #[test]
    fn test_probe_command_display() {
        assert_eq!(
            ProbeCommand::with_prefix("py", &["-3.14"]).to_string(),
            "py -3.14"
        );
        assert_eq!(ProbeCommand::bare("python3").to_string(), "python3");
    }

    #[test]
    fn test_constraint_display() {
        let spec = PrerequisiteSpec {
            key: PrerequisiteKey::Python,
            version_floor: Some(Version::new(3, 12, 0)),
            probe: Probe::VersionedInterpreter { candidates: vec![] },
            install_action: InstallAction::SystemPackages { packages: vec![] },
            depends_on: vec![],
        };
        assert_eq!(spec.constraint_display(), ">= 3.12");
    }
}
