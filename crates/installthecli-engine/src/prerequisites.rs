//! Prerequisite resolution
//!
//! Shared dependencies (Node.js, Python, pip, curl) are probed, installed when
//! absent and re-probed. Each key is resolved at most once per run: both
//! successes and failures are memoized, so a second `ensure` for the same key
//! performs no probe and no install.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use installthecli_core::platform::{LinuxDistro, Platform, PlatformInfo};
use installthecli_core::types::{
    AttemptResult, InstallAction, PrerequisiteKey, PrerequisiteSpec, Probe, ProbeCommand,
};
use installthecli_core::{Error, Result};
use semver::Version;
use tracing::{debug, info, warn};

use crate::backends::{PackageBackend, WingetBackend};
use crate::locator::ToolLocator;
use crate::probe::{command_with, meets_floor, parse_version, probe_version};
use crate::runner::{CommandSpec, Runner};

/// A prerequisite found on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrerequisite {
    /// Which prerequisite
    pub key: PrerequisiteKey,

    /// How to invoke it (interpreter plus fixed arguments)
    pub command: ProbeCommand,

    /// Located executable, when known
    pub path: Option<PathBuf>,

    /// Reported version, when probed
    pub version: Option<Version>,

    /// Synthesized in dry-run after a simulated install
    pub assumed: bool,
}

type CachedResolution = std::result::Result<ResolvedPrerequisite, String>;
type InstallAttempts = std::result::Result<Vec<AttemptResult>, String>;

/// Memoizing prerequisite resolver
pub struct PrerequisiteResolver {
    runner: Runner,
    locator: Arc<dyn ToolLocator>,
    platform: PlatformInfo,
    specs: Vec<PrerequisiteSpec>,
    cache: HashMap<PrerequisiteKey, CachedResolution>,
    use_sudo: Option<bool>,
}

impl PrerequisiteResolver {
    /// Create a resolver over the catalog's prerequisite definitions
    pub fn new(
        runner: Runner,
        locator: Arc<dyn ToolLocator>,
        platform: PlatformInfo,
        specs: Vec<PrerequisiteSpec>,
    ) -> Self {
        Self {
            runner,
            locator,
            platform,
            specs,
            cache: HashMap::new(),
            use_sudo: None,
        }
    }

    /// Whether `key` has already been resolved (successfully or not) this run
    pub fn is_resolved(&self, key: PrerequisiteKey) -> bool {
        self.cache.contains_key(&key)
    }

    /// Ensure `key` is present, installing it if needed
    pub fn ensure(
        &mut self,
        key: PrerequisiteKey,
    ) -> Pin<Box<dyn Future<Output = Result<ResolvedPrerequisite>> + Send + '_>> {
        Box::pin(async move {
            if let Some(cached) = self.cache.get(&key) {
                debug!("Prerequisite {} already resolved this run", key);
                return cached
                    .clone()
                    .map_err(|reason| Error::prerequisite_unsatisfied(key.as_str(), reason));
            }

            let resolution = self.resolve(key).await;
            self.cache.insert(key, resolution.clone());
            resolution.map_err(|reason| Error::prerequisite_unsatisfied(key.as_str(), reason))
        })
    }

    /// Probe `key` without installing anything and without touching the cache
    pub fn probe(
        &self,
        key: PrerequisiteKey,
    ) -> Pin<Box<dyn Future<Output = Option<ResolvedPrerequisite>> + Send + '_>> {
        Box::pin(async move {
            if let Some(Ok(resolved)) = self.cache.get(&key) {
                return Some(resolved.clone());
            }
            let spec = self.spec(key)?.clone();
            let mut deps = HashMap::new();
            for dep in &spec.depends_on {
                let resolved = self.probe(*dep).await?;
                deps.insert(*dep, resolved);
            }
            self.probe_spec(&spec, &deps).await
        })
    }

    fn spec(&self, key: PrerequisiteKey) -> Option<&PrerequisiteSpec> {
        self.specs.iter().find(|s| s.key == key)
    }

    async fn resolve(&mut self, key: PrerequisiteKey) -> CachedResolution {
        let spec = self
            .spec(key)
            .cloned()
            .ok_or_else(|| format!("no definition of {} for {}", key, self.platform.os))?;

        let mut deps = HashMap::new();
        for dep in &spec.depends_on {
            match self.ensure(*dep).await {
                Ok(resolved) => {
                    deps.insert(*dep, resolved);
                }
                Err(e) => return Err(format!("requires {}: {}", dep, e)),
            }
        }

        if let Some(found) = self.probe_spec(&spec, &deps).await {
            info!(
                "{} is already available: {}{}",
                key,
                found.command,
                version_suffix(&found.version)
            );
            return Ok(found);
        }

        info!(
            "{} ({}) not found; installing via {}",
            key,
            spec.constraint_display(),
            action_display(&spec.install_action)
        );
        let attempts = self.run_install_action(&spec, &deps).await?;
        if let Some(failed) = attempts.iter().find(|a| !a.succeeded) {
            return Err(format!("install failed: {}", failed.failure_summary()));
        }

        if self.runner.is_dry_run() {
            info!("[dry-run] assuming {} is available after install", key);
            return Ok(assumed(&spec, &deps));
        }

        match self.probe_spec(&spec, &deps).await {
            Some(found) => {
                info!(
                    "{} is available: {}{}",
                    key,
                    found.command,
                    version_suffix(&found.version)
                );
                Ok(found)
            }
            None => Err(match &spec.version_floor {
                Some(_) => format!(
                    "no installation {} found after install",
                    spec.constraint_display()
                ),
                None => "still not available after install".to_string(),
            }),
        }
    }

    async fn probe_spec(
        &self,
        spec: &PrerequisiteSpec,
        deps: &HashMap<PrerequisiteKey, ResolvedPrerequisite>,
    ) -> Option<ResolvedPrerequisite> {
        match &spec.probe {
            Probe::Executables { names } => {
                let mut paths = Vec::with_capacity(names.len());
                for name in names {
                    match self.locator.locate(name) {
                        Some(path) => paths.push(path),
                        None => {
                            debug!("{}: {} not found", spec.key, name);
                            return None;
                        }
                    }
                }
                let primary = paths.into_iter().next()?;
                let command = ProbeCommand::bare(primary.to_string_lossy());
                let version = match &spec.version_floor {
                    Some(floor) => {
                        let version = probe_version(&self.runner, &command).await?;
                        if !meets_floor(&version, Some(floor)) {
                            return None;
                        }
                        Some(version)
                    }
                    None => None,
                };
                Some(ResolvedPrerequisite {
                    key: spec.key,
                    command,
                    path: Some(primary),
                    version,
                    assumed: false,
                })
            }
            Probe::VersionedInterpreter { candidates } => {
                for candidate in candidates {
                    let Some(path) = self.locator.locate(&candidate.program) else {
                        continue;
                    };
                    let command = ProbeCommand {
                        program: path.to_string_lossy().into_owned(),
                        prefix_args: candidate.prefix_args.clone(),
                    };
                    match probe_version(&self.runner, &command).await {
                        Some(version) if meets_floor(&version, spec.version_floor.as_ref()) => {
                            return Some(ResolvedPrerequisite {
                                key: spec.key,
                                command,
                                path: Some(path),
                                version: Some(version),
                                assumed: false,
                            });
                        }
                        Some(version) => {
                            debug!(
                                "{} is {} which does not satisfy {}",
                                command,
                                version,
                                spec.constraint_display()
                            );
                        }
                        None => {}
                    }
                }
                None
            }
            Probe::PythonModule { module } => {
                let python = deps.get(&PrerequisiteKey::Python)?;
                let output = self
                    .runner
                    .query(&command_with(&python.command, &["-m", module.as_str(), "--version"]))
                    .await?;
                if !output.success() {
                    return None;
                }
                Some(ResolvedPrerequisite {
                    key: spec.key,
                    command: python.command.clone(),
                    path: python.path.clone(),
                    version: parse_version(&output.stdout),
                    assumed: false,
                })
            }
        }
    }

    async fn run_install_action(
        &mut self,
        spec: &PrerequisiteSpec,
        deps: &HashMap<PrerequisiteKey, ResolvedPrerequisite>,
    ) -> InstallAttempts {
        let candidate = spec.key.as_str();
        match &spec.install_action {
            InstallAction::Winget { id } => {
                let winget = match self.locator.locate("winget") {
                    Some(path) => path,
                    None if self.runner.is_dry_run() => PathBuf::from("winget"),
                    None => {
                        return Err(
                            "winget was not found. Install Microsoft App Installer first"
                                .to_string(),
                        )
                    }
                };
                let attempt = WingetBackend::new(winget).install(&self.runner, id).await;
                Ok(vec![attempt])
            }
            InstallAction::SystemPackages { packages } => {
                let use_sudo = self.needs_sudo().await;
                let commands = self
                    .platform
                    .system_install_commands(packages, use_sudo)
                    .map_err(|e| e.to_string())?;
                let debian = matches!(
                    self.platform.os,
                    Platform::Linux(LinuxDistro::Debian)
                );
                info!("Installing system packages: {}", packages.join(", "));

                let mut attempts = Vec::new();
                for argv in &commands {
                    let Some(mut command) = CommandSpec::from_argv(argv) else {
                        continue;
                    };
                    if debian {
                        command = command.env("DEBIAN_FRONTEND", "noninteractive");
                    }
                    let attempt = self.runner.run(candidate, &command).await;
                    let ok = attempt.succeeded;
                    attempts.push(attempt);
                    if !ok {
                        break;
                    }
                }
                Ok(attempts)
            }
            InstallAction::PythonInvocation { args } => {
                let python = deps.get(&PrerequisiteKey::Python).ok_or_else(|| {
                    format!("{} needs a resolved python interpreter", spec.key)
                })?;
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                let attempt = self
                    .runner
                    .run(candidate, &command_with(&python.command, &args))
                    .await;
                Ok(vec![attempt])
            }
        }
    }

    /// True unless the process already runs as root (Linux only)
    async fn needs_sudo(&mut self) -> bool {
        if let Some(cached) = self.use_sudo {
            return cached;
        }
        let needs = if self.platform.os.is_linux() {
            match self.runner.query(&CommandSpec::new("whoami")).await {
                Some(output) => output.stdout.trim() != "root",
                None => true,
            }
        } else {
            false
        };
        if needs {
            warn!("Not running as root; system package commands will use sudo");
        }
        self.use_sudo = Some(needs);
        needs
    }
}

fn assumed(
    spec: &PrerequisiteSpec,
    deps: &HashMap<PrerequisiteKey, ResolvedPrerequisite>,
) -> ResolvedPrerequisite {
    let command = match &spec.probe {
        Probe::Executables { names } => {
            ProbeCommand::bare(names.first().cloned().unwrap_or_default())
        }
        Probe::VersionedInterpreter { candidates } => candidates
            .first()
            .cloned()
            .unwrap_or_else(|| ProbeCommand::bare("python")),
        Probe::PythonModule { .. } => deps
            .get(&PrerequisiteKey::Python)
            .map(|p| p.command.clone())
            .unwrap_or_else(|| ProbeCommand::bare("python")),
    };
    ResolvedPrerequisite {
        key: spec.key,
        command,
        path: None,
        version: None,
        assumed: true,
    }
}

fn version_suffix(version: &Option<Version>) -> String {
    version
        .as_ref()
        .map(|v| format!(" (v{})", v))
        .unwrap_or_default()
}

fn action_display(action: &InstallAction) -> String {
    match action {
        InstallAction::Winget { id } => format!("winget {}", id),
        InstallAction::SystemPackages { packages } => {
            format!("system packages {}", packages.join(" "))
        }
        InstallAction::PythonInvocation { args } => format!("python {}", args.join(" ")),
    }
}
