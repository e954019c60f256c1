//! Target installation and update
//!
//! A [`TargetInstaller`] turns one catalog entry into a [`TargetOutcome`]:
//! prerequisites first, then the target's backend strategy, then command
//! resolution. Candidate failures are data; the only error it returns is an
//! unsatisfied prerequisite.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use installthecli_core::platform::PlatformInfo;
use installthecli_core::types::{
    AttemptResult, Backend, PackageManagerKind, PrerequisiteKey, PrerequisiteSpec, ProbeCommand,
    SkipReason, TargetOutcome, TargetSpec, TargetStatus, ToolchainTool,
};
use installthecli_core::Result;
use tracing::{debug, error, info, warn};

use crate::backends::{
    NpmBackend, PackageBackend, PipBackend, RetryPolicy, UvBackend, WingetBackend,
};
use crate::locator::ToolLocator;
use crate::prerequisites::{PrerequisiteResolver, ResolvedPrerequisite};
use crate::runner::{CommandSpec, Runner};

/// Output fragments that identify a Windows file-lock failure from npm
const FILE_LOCK_MARKERS: &[&str] = &["ebusy", "-4082", "4294963214"];

type ResolvedSet = HashMap<PrerequisiteKey, ResolvedPrerequisite>;

/// Installs and updates catalog targets
pub struct TargetInstaller {
    runner: Runner,
    locator: Arc<dyn ToolLocator>,
    platform: PlatformInfo,
    resolver: PrerequisiteResolver,
    retry: RetryPolicy,
}

impl TargetInstaller {
    /// Create an installer for `platform` using the catalog's prerequisite definitions
    pub fn new(
        runner: Runner,
        locator: Arc<dyn ToolLocator>,
        platform: PlatformInfo,
        prerequisites: Vec<PrerequisiteSpec>,
    ) -> Self {
        let resolver = PrerequisiteResolver::new(
            runner.clone(),
            Arc::clone(&locator),
            platform.clone(),
            prerequisites,
        );
        Self {
            runner,
            locator,
            platform,
            resolver,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the npm retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The runner every command goes through
    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// The prerequisite resolver shared by every target this run
    pub fn resolver(&self) -> &PrerequisiteResolver {
        &self.resolver
    }

    /// Install one target
    ///
    /// Returns `Err` only when a required prerequisite cannot be satisfied.
    pub async fn install(&mut self, target: &TargetSpec) -> Result<TargetOutcome> {
        info!("Installing {} ({})", target.label, target.key);

        let mut prerequisites = ResolvedSet::new();
        for key in &target.prerequisite_keys {
            let resolved = self.resolver.ensure(*key).await?;
            prerequisites.insert(*key, resolved);
        }

        let mut outcome = match &target.backend {
            Backend::PackageManagerCandidates { manager } => {
                self.install_candidates(target, *manager).await
            }
            Backend::VendorScript { url } => self.install_vendor_script(target, url).await,
            Backend::LanguageToolchain {
                preferred,
                fallback,
            } => {
                self.install_toolchain(target, *preferred, *fallback, &prerequisites)
                    .await
            }
        };

        if matches!(outcome.status, TargetStatus::Installed { .. })
            && outcome.command_path.is_none()
            && !self.runner.is_dry_run()
        {
            outcome.command_path = self.resolve_command(target).await;
            match &outcome.command_path {
                Some(path) => info!("{} command: {}", target.label, path.display()),
                None => warn!(
                    "{} installed, but none of [{}] was found on PATH; open a new terminal",
                    target.label,
                    target.commands.join(", ")
                ),
            }
        }

        log_outcome(&outcome);
        Ok(outcome)
    }

    /// Update one target in place
    ///
    /// Never installs anything that is absent and never fails: every
    /// problem becomes a `Skipped` status.
    pub async fn update(&mut self, target: &TargetSpec) -> TargetOutcome {
        info!("Updating {} ({})", target.label, target.key);
        let outcome = match &target.backend {
            Backend::PackageManagerCandidates { manager } => {
                match self.package_manager(*manager, false) {
                    Some(backend) => {
                        self.update_candidates(target, backend.as_ref(), &target.candidates)
                            .await
                    }
                    None => skipped(
                        target,
                        SkipReason::BackendUnavailable {
                            tool: manager.to_string(),
                        },
                    ),
                }
            }
            Backend::VendorScript { url } => self.update_vendor_script(target, url).await,
            Backend::LanguageToolchain { .. } => self.update_toolchain(target).await,
        };
        log_outcome(&outcome);
        outcome
    }

    fn package_manager(
        &self,
        manager: PackageManagerKind,
        allow_unresolved: bool,
    ) -> Option<Box<dyn PackageBackend>> {
        let name = manager.to_string();
        let path = match self.locator.locate(&name) {
            Some(path) => path,
            None if allow_unresolved && self.runner.is_dry_run() => PathBuf::from(&name),
            None => return None,
        };
        debug!("Using {} at {}", name, path.display());
        Some(match manager {
            PackageManagerKind::Npm => Box::new(NpmBackend::new(path, self.retry)),
            PackageManagerKind::Winget => Box::new(WingetBackend::new(path)),
        })
    }

    async fn install_candidates(
        &self,
        target: &TargetSpec,
        manager: PackageManagerKind,
    ) -> TargetOutcome {
        let Some(backend) = self.package_manager(manager, true) else {
            return failed(target, format!("{} was not found", manager), Vec::new());
        };

        let mut attempts = Vec::with_capacity(target.candidates.len());
        for candidate in &target.candidates {
            info!(
                "Trying {} package {} for {}",
                backend.name(),
                candidate,
                target.label
            );
            let attempt = backend.install(&self.runner, candidate).await;
            let succeeded = attempt.succeeded;
            if !succeeded {
                warn!("{}", attempt.failure_summary());
            }
            attempts.push(attempt);
            if succeeded {
                return with_attempts(
                    target,
                    TargetStatus::Installed {
                        candidate: candidate.clone(),
                        note: None,
                    },
                    attempts,
                );
            }
        }

        let last_error = last_error(&attempts);

        if manager == PackageManagerKind::Npm
            && !attempts.is_empty()
            && attempts.iter().all(is_file_lock_failure)
            && !self.runner.is_dry_run()
        {
            if let Some(path) = self.resolve_command(target).await {
                warn!(
                    "{} could not be replaced because a file is in use; using existing installation at {}",
                    target.label,
                    path.display()
                );
                let mut outcome = with_attempts(
                    target,
                    TargetStatus::Installed {
                        candidate: primary_candidate(target),
                        note: Some(format!(
                            "install blocked by a locked file; using existing installation at {}",
                            path.display()
                        )),
                    },
                    attempts,
                );
                outcome.command_path = Some(path);
                return outcome;
            }
        }

        failed(target, last_error, attempts)
    }

    async fn install_vendor_script(&self, target: &TargetSpec, url: &str) -> TargetOutcome {
        let candidate = primary_candidate(target);

        if let Some(path) = self.resolve_command(target).await {
            info!(
                "{} is already installed at {}; skipping install script",
                target.label,
                path.display()
            );
            let mut outcome = with_attempts(
                target,
                TargetStatus::Installed {
                    candidate,
                    note: Some("already installed".to_string()),
                },
                Vec::new(),
            );
            outcome.command_path = Some(path);
            return outcome;
        }

        let attempt = self.runner.run(&candidate, &vendor_script_command(url)).await;
        if attempt.succeeded {
            return with_attempts(
                target,
                TargetStatus::Installed {
                    candidate,
                    note: None,
                },
                vec![attempt],
            );
        }

        warn!("{}", attempt.failure_summary());
        if let Some(path) = self.resolve_command(target).await {
            warn!(
                "{} install script failed but {} is present; continuing",
                target.label,
                path.display()
            );
            let mut outcome = with_attempts(
                target,
                TargetStatus::Installed {
                    candidate,
                    note: Some("install script failed; existing installation used".to_string()),
                },
                vec![attempt],
            );
            outcome.command_path = Some(path);
            return outcome;
        }

        let error = attempt.failure_summary();
        failed(target, error, vec![attempt])
    }

    async fn install_toolchain(
        &self,
        target: &TargetSpec,
        preferred: ToolchainTool,
        fallback: ToolchainTool,
        prerequisites: &ResolvedSet,
    ) -> TargetOutcome {
        let Some(python) = prerequisites.get(&PrerequisiteKey::Python) else {
            return failed(
                target,
                "no python interpreter was resolved".to_string(),
                Vec::new(),
            );
        };
        let pip = self.pip_backend(python.command.clone());

        let mut tools: Vec<(ToolchainTool, Box<dyn PackageBackend>)> = Vec::new();
        for tool in [preferred, fallback] {
            if tools.iter().any(|(t, _)| *t == tool) {
                continue;
            }
            match self.toolchain_backend(tool, &pip).await {
                Some(backend) => tools.push((tool, backend)),
                None => warn!("{} is not available for {}", tool, target.label),
            }
        }

        let mut attempts = Vec::new();
        for candidate in &target.candidates {
            for (i, (tool, backend)) in tools.iter().enumerate() {
                if i > 0 {
                    info!("Falling back to {} for {}", tool, candidate);
                }
                let attempt = backend.install(&self.runner, candidate).await;
                let succeeded = attempt.succeeded;
                if !succeeded {
                    warn!("{} via {}", attempt.failure_summary(), tool);
                }
                attempts.push(attempt);
                if succeeded {
                    let note = (*tool != preferred).then(|| format!("installed with {}", tool));
                    return with_attempts(
                        target,
                        TargetStatus::Installed {
                            candidate: candidate.clone(),
                            note,
                        },
                        attempts,
                    );
                }
            }
        }

        let error = if tools.is_empty() {
            format!("neither {} nor {} is available", preferred, fallback)
        } else {
            last_error(&attempts)
        };
        failed(target, error, attempts)
    }

    async fn toolchain_backend(
        &self,
        tool: ToolchainTool,
        pip: &PipBackend,
    ) -> Option<Box<dyn PackageBackend>> {
        match tool {
            ToolchainTool::Pip => Some(Box::new(pip.clone())),
            ToolchainTool::Uv => {
                if self.locator.locate("uv").is_none() {
                    info!("uv not found; bootstrapping it with pip");
                    let attempt = self.runner.run("uv", &pip.install_spec("uv")).await;
                    if !attempt.succeeded {
                        warn!("Could not bootstrap uv: {}", attempt.failure_summary());
                    }
                }
                match self.locator.locate("uv") {
                    Some(path) => Some(Box::new(UvBackend::new(path))),
                    None if self.runner.is_dry_run() => Some(Box::new(UvBackend::new("uv"))),
                    None => None,
                }
            }
        }
    }

    fn pip_backend(&self, python: ProbeCommand) -> PipBackend {
        PipBackend::new(python, self.platform.os.is_linux())
    }

    async fn update_candidates(
        &self,
        target: &TargetSpec,
        backend: &dyn PackageBackend,
        candidates: &[String],
    ) -> TargetOutcome {
        let mut attempts = Vec::new();
        let mut last_failure: Option<(String, String)> = None;

        for candidate in candidates {
            if !backend.is_installed(&self.runner, candidate).await {
                debug!("{} is not installed; skipping", candidate);
                continue;
            }
            let attempt = backend.update(&self.runner, candidate).await;
            if attempt.succeeded {
                attempts.push(attempt);
                return with_attempts(
                    target,
                    TargetStatus::Updated {
                        candidate: candidate.clone(),
                    },
                    attempts,
                );
            }
            warn!("Update skipped: {}", attempt.failure_summary());
            last_failure = Some((candidate.clone(), attempt.failure_summary()));
            attempts.push(attempt);
        }

        let reason = match last_failure {
            Some((candidate, error)) => SkipReason::UpdateFailed { candidate, error },
            None => SkipReason::NotInstalled,
        };
        let mut outcome = skipped(target, reason);
        outcome.attempts = attempts;
        outcome
    }

    async fn update_vendor_script(&self, target: &TargetSpec, url: &str) -> TargetOutcome {
        let Some(path) = self.resolve_command(target).await else {
            return skipped(target, SkipReason::NotInstalled);
        };
        let candidate = primary_candidate(target);
        let attempt = self.runner.run(&candidate, &vendor_script_command(url)).await;
        let mut outcome = if attempt.succeeded {
            with_attempts(target, TargetStatus::Updated { candidate }, Vec::new())
        } else {
            skipped(
                target,
                SkipReason::UpdateFailed {
                    candidate,
                    error: attempt.failure_summary(),
                },
            )
        };
        outcome.attempts.push(attempt);
        outcome.command_path = Some(path);
        outcome
    }

    async fn update_toolchain(&self, target: &TargetSpec) -> TargetOutcome {
        let Some(python) = self.resolver.probe(PrerequisiteKey::Python).await else {
            return skipped(
                target,
                SkipReason::BackendUnavailable {
                    tool: "python".to_string(),
                },
            );
        };
        let pip = self.pip_backend(python.command);

        if let Some(uv) = self.locator.locate("uv") {
            let uv = UvBackend::new(uv);
            let mut installed_with_uv = Vec::new();
            for candidate in &target.candidates {
                if uv.is_installed(&self.runner, candidate).await {
                    installed_with_uv.push(candidate.clone());
                }
            }
            if !installed_with_uv.is_empty() {
                return self.update_candidates(target, &uv, &installed_with_uv).await;
            }
        }

        self.update_candidates(target, &pip, &target.candidates)
            .await
    }

    /// Locate the target's command, including npm's global bin directory
    async fn resolve_command(&self, target: &TargetSpec) -> Option<PathBuf> {
        let extra_dirs = self.command_search_dirs(target).await;
        self.locator.locate_first(&target.commands, &extra_dirs)
    }

    async fn command_search_dirs(&self, target: &TargetSpec) -> Vec<PathBuf> {
        let uses_npm = matches!(
            target.backend,
            Backend::PackageManagerCandidates {
                manager: PackageManagerKind::Npm
            }
        );
        if !uses_npm || self.runner.is_dry_run() {
            return Vec::new();
        }
        let Some(npm) = self.locator.locate("npm") else {
            return Vec::new();
        };

        let spec = CommandSpec::new(npm.to_string_lossy()).args(["prefix", "-g"]);
        let Some(output) = self.runner.query(&spec).await else {
            return Vec::new();
        };
        let prefix = output.stdout.trim();
        if !output.success() || prefix.is_empty() {
            return Vec::new();
        }

        let prefix = PathBuf::from(prefix);
        if self.platform.os.is_windows() {
            vec![prefix]
        } else {
            vec![prefix.join("bin")]
        }
    }
}

fn primary_candidate(target: &TargetSpec) -> String {
    target
        .candidates
        .first()
        .cloned()
        .unwrap_or_else(|| target.key.clone())
}

/// `sh -c "curl -fsSL <url> | sh"`
pub fn vendor_script_command(url: &str) -> CommandSpec {
    CommandSpec::new("sh").args(["-c".to_string(), format!("curl -fsSL {} | sh", url)])
}

/// Whether an attempt failed because Windows held a file open
pub fn is_file_lock_failure(attempt: &AttemptResult) -> bool {
    if attempt.succeeded {
        return false;
    }
    if attempt.exit_code == Some(-4082) {
        return true;
    }
    let haystack = format!("{}\n{}", attempt.failure_summary(), attempt.output_tail())
        .to_ascii_lowercase();
    FILE_LOCK_MARKERS.iter().any(|m| haystack.contains(m))
}

fn with_attempts(
    target: &TargetSpec,
    status: TargetStatus,
    attempts: Vec<AttemptResult>,
) -> TargetOutcome {
    let mut outcome = TargetOutcome::new(&target.key, &target.label, status);
    outcome.attempts = attempts;
    outcome
}

fn failed(target: &TargetSpec, last_error: String, attempts: Vec<AttemptResult>) -> TargetOutcome {
    with_attempts(target, TargetStatus::Failed { last_error }, attempts)
}

fn skipped(target: &TargetSpec, reason: SkipReason) -> TargetOutcome {
    TargetOutcome::new(&target.key, &target.label, TargetStatus::Skipped { reason })
}

fn last_error(attempts: &[AttemptResult]) -> String {
    attempts
        .last()
        .map(AttemptResult::failure_summary)
        .unwrap_or_else(|| "no candidates were attempted".to_string())
}

fn log_outcome(outcome: &TargetOutcome) {
    match &outcome.status {
        TargetStatus::Failed { .. } => error!("{}: {}", outcome.label, outcome.status),
        TargetStatus::Skipped { .. } => warn!("{}: {}", outcome.label, outcome.status),
        _ => info!("{}: {}", outcome.label, outcome.status),
    }
}
