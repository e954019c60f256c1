//! Built-in target catalog
//!
//! The catalog is the single source of candidate lists for both installs and
//! the generated update procedure. Insertion order is the processing order.

use semver::Version;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::platform::{LinuxDistro, Platform};
use crate::types::{
    Backend, InstallAction, PackageManagerKind, PrerequisiteKey, PrerequisiteSpec, Probe,
    ProbeCommand, TargetSpec, ToolchainTool,
};

/// Official Ollama install script
pub const OLLAMA_INSTALL_SCRIPT_URL: &str = "https://ollama.com/install.sh";

/// Ordered set of targets plus the prerequisites they reference
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    targets: Vec<TargetSpec>,
    prerequisites: Vec<PrerequisiteSpec>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate keys
    pub fn new(targets: Vec<TargetSpec>, prerequisites: Vec<PrerequisiteSpec>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for target in &targets {
            if !seen.insert(target.key.as_str()) {
                return Err(Error::duplicate_target(&target.key));
            }
            if target.candidates.is_empty() {
                return Err(Error::invalid_config(format!(
                    "target {} has no candidates",
                    target.key
                )));
            }
        }
        Ok(Self {
            targets,
            prerequisites,
        })
    }

    /// The built-in catalog for a platform
    pub fn builtin(os: Platform) -> Self {
        Self {
            targets: builtin_targets(os),
            prerequisites: builtin_prerequisites(os),
        }
    }

    /// Remove `disabled` keys; unknown keys are a configuration error
    pub fn without(mut self, disabled: &[String]) -> Result<Self> {
        for key in disabled {
            if !self.targets.iter().any(|t| &t.key == key) {
                return Err(Error::invalid_config(format!(
                    "targets.disabled names unknown target: {}",
                    key
                )));
            }
        }
        if !disabled.is_empty() {
            debug!("Disabled targets: {}", disabled.join(", "));
        }
        self.targets.retain(|t| !disabled.contains(&t.key));
        Ok(self)
    }

    /// All targets in catalog order
    pub fn targets(&self) -> &[TargetSpec] {
        &self.targets
    }

    /// Targets not marked optional, in catalog order
    pub fn required_targets(&self) -> Vec<TargetSpec> {
        self.targets.iter().filter(|t| !t.optional).cloned().collect()
    }

    /// Catalog keys in order
    pub fn keys(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.key.as_str()).collect()
    }

    /// Look up a target by key
    pub fn get(&self, key: &str) -> Result<&TargetSpec> {
        self.targets
            .iter()
            .find(|t| t.key == key)
            .ok_or_else(|| Error::unknown_target(key))
    }

    /// All prerequisite definitions
    pub fn prerequisites(&self) -> &[PrerequisiteSpec] {
        &self.prerequisites
    }

    /// Look up a prerequisite definition
    pub fn prerequisite(&self, key: PrerequisiteKey) -> Option<&PrerequisiteSpec> {
        self.prerequisites.iter().find(|p| p.key == key)
    }
}

fn builtin_targets(os: Platform) -> Vec<TargetSpec> {
    let ollama = if os.is_windows() {
        TargetSpec::new(
            "ollama",
            "Ollama CLI (Official)",
            Backend::PackageManagerCandidates {
                manager: PackageManagerKind::Winget,
            },
        )
        .with_candidates(&["Ollama.Ollama"])
    } else {
        TargetSpec::new(
            "ollama",
            "Ollama CLI (Official)",
            Backend::VendorScript {
                url: OLLAMA_INSTALL_SCRIPT_URL.to_string(),
            },
        )
        .with_prerequisites(&[PrerequisiteKey::Curl])
    };

    vec![
        TargetSpec::npm("claude", "Claude CLI", &["@anthropic-ai/claude-code"])
            .with_commands(&["claude"]),
        TargetSpec::npm("codex", "Codex CLI", &["@openai/codex"]).with_commands(&["codex"]),
        TargetSpec::npm("gemini", "Gemini CLI", &["@google/gemini-cli"])
            .with_commands(&["gemini"]),
        TargetSpec::npm("grok", "Grok CLI (Vibe Kit)", &["@vibe-kit/grok-cli"])
            .with_commands(&["grok", "grok-cli"])
            .optional(),
        TargetSpec::npm("qwen", "Qwen CLI", &["@qwen-code/qwen-code", "qwen-code"])
            .with_commands(&["qwen", "qwen-code"]),
        TargetSpec::new(
            "mistral",
            "Mistral Vibe CLI",
            Backend::LanguageToolchain {
                preferred: ToolchainTool::Uv,
                fallback: ToolchainTool::Pip,
            },
        )
        .with_candidates(&["mistral-vibe"])
        .with_commands(&["vibe", "mistral-vibe"])
        .with_prerequisites(&[PrerequisiteKey::Python, PrerequisiteKey::Pip])
        .optional(),
        ollama,
        TargetSpec::npm(
            "copilot",
            "GitHub Copilot CLI",
            &["@github/copilot", "@githubnext/github-copilot-cli"],
        )
        .with_commands(&["copilot", "github-copilot-cli", "github-copilot"]),
        TargetSpec::npm("openclaw", "OpenClaw CLI", &["openclaw"])
            .with_commands(&["openclaw"])
            .optional(),
        TargetSpec::npm("ironclaw", "IronClaw CLI", &["ironclaw"])
            .with_commands(&["ironclaw"])
            .optional(),
    ]
}

fn builtin_prerequisites(os: Platform) -> Vec<PrerequisiteSpec> {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let (python_candidates, python_floor, python_install, node_install) = match os {
        Platform::Windows => (
            vec![
                ProbeCommand::with_prefix("py", &["-3.14"]),
                ProbeCommand::bare("python3.14"),
                ProbeCommand::bare("python"),
            ],
            Version::new(3, 14, 0),
            InstallAction::Winget {
                id: "Python.Python.3.14".to_string(),
            },
            InstallAction::Winget {
                id: "OpenJS.NodeJS.LTS".to_string(),
            },
        ),
        _ => {
            let python_packages = match os {
                Platform::Linux(LinuxDistro::Arch) => strings(&["python", "python-pip"]),
                _ => strings(&["python3", "python3-pip"]),
            };
            (
                vec![
                    ProbeCommand::bare("python3.14"),
                    ProbeCommand::bare("python3"),
                    ProbeCommand::bare("python"),
                ],
                Version::new(3, 12, 0),
                InstallAction::SystemPackages {
                    packages: python_packages,
                },
                InstallAction::SystemPackages {
                    packages: strings(&["nodejs", "npm"]),
                },
            )
        }
    };

    vec![
        PrerequisiteSpec {
            key: PrerequisiteKey::NodeRuntime,
            version_floor: None,
            probe: Probe::Executables {
                names: strings(&["node", "npm"]),
            },
            install_action: node_install,
            depends_on: Vec::new(),
        },
        PrerequisiteSpec {
            key: PrerequisiteKey::Python,
            version_floor: Some(python_floor),
            probe: Probe::VersionedInterpreter {
                candidates: python_candidates,
            },
            install_action: python_install,
            depends_on: Vec::new(),
        },
        PrerequisiteSpec {
            key: PrerequisiteKey::Pip,
            version_floor: None,
            probe: Probe::PythonModule {
                module: "pip".to_string(),
            },
            install_action: InstallAction::PythonInvocation {
                args: strings(&["-m", "ensurepip", "--upgrade"]),
            },
            depends_on: vec![PrerequisiteKey::Python],
        },
        PrerequisiteSpec {
            key: PrerequisiteKey::Curl,
            version_floor: None,
            probe: Probe::Executables {
                names: strings(&["curl"]),
            },
            install_action: InstallAction::SystemPackages {
                packages: strings(&["curl"]),
            },
            depends_on: Vec::new(),
        },
    ]
}
