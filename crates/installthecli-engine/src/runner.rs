//! Command runner
//!
//! Every external command goes through [`Runner`]. Mutating commands use
//! [`Runner::run`], which honours dry-run by logging the exact command line
//! and synthesizing success. Read-only probes use [`Runner::query`] and always
//! execute. A non-zero exit is data on the returned [`AttemptResult`], never an
//! error.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use installthecli_core::types::{tail_lines, AttemptResult, OUTPUT_TAIL_LINES};
use installthecli_core::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// One external command with its environment overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path
    pub program: String,

    /// Arguments
    pub args: Vec<String>,

    /// Variables set on top of the inherited environment
    pub env_overrides: BTreeMap<String, String>,

    /// Directories placed in front of the inherited search path
    pub path_prepend: Vec<PathBuf>,
}

impl CommandSpec {
    /// Create a command with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Build from an argument vector; `None` when empty
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args))
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for this command only
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(key.into(), value.into());
        self
    }

    /// Prepend a directory to the search path for this command only
    pub fn prepend_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path_prepend.push(dir.into());
        self
    }

    /// Copy-pasteable command line, quoting arguments that need it
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Unquoted `program args...`, used as a lookup key
    pub fn key(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Quote an argument if it is empty or contains whitespace or quotes
pub fn quote_arg(arg: &str) -> Cow<'_, str> {
    if !arg.is_empty() && !arg.chars().any(|c| c.is_whitespace() || c == '"') {
        return Cow::Borrowed(arg);
    }
    Cow::Owned(format!("\"{}\"", arg.replace('"', "\\\"")))
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Full stdout
    pub stdout: String,
    /// Full stderr
    pub stderr: String,
}

impl CommandOutput {
    /// True when the process exited with code zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Spawns one external command and waits for it
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion; only a failure to start is an error
    async fn invoke(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands on the host with tokio, mirroring output into the log
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn invoke(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        cmd.envs(&spec.env_overrides);

        if !spec.path_prepend.is_empty() {
            let inherited = std::env::var_os("PATH").unwrap_or_default();
            let joined = std::env::join_paths(
                spec.path_prepend
                    .iter()
                    .cloned()
                    .chain(std::env::split_paths(&inherited)),
            )
            .map_err(|e| Error::command_spawn(&spec.program, std::io::Error::other(e)))?;
            cmd.env("PATH", joined);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::command_spawn(&spec.program, e))?;

        let label = program_label(&spec.program);
        let stdout = child
            .stdout
            .take()
            .map(|s| tokio::spawn(mirror_lines(s, label.clone())));
        let stderr = child
            .stderr
            .take()
            .map(|s| tokio::spawn(mirror_lines(s, label.clone())));

        let status = child
            .wait()
            .await
            .map_err(|e| Error::command_spawn(&spec.program, e))?;

        let stdout = match stdout {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        let stderr = match stderr {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

fn program_label(program: &str) -> String {
    std::path::Path::new(program)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}

async fn mirror_lines<R: AsyncRead + Unpin>(reader: R, label: String) -> String {
    let mut lines = BufReader::new(reader).lines();
    let mut captured = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim_end();
        if !trimmed.is_empty() {
            debug!("{}: {}", label, trimmed);
        }
        captured.push_str(&line);
        captured.push('\n');
    }
    captured
}

/// Execution mode for mutating commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Spawn commands
    #[default]
    Execute,
    /// Log would-be commands and synthesize success
    DryRun,
}

/// Dry-run aware front for a [`CommandRunner`]
#[derive(Clone)]
pub struct Runner {
    backend: Arc<dyn CommandRunner>,
    mode: RunMode,
    base_env: BTreeMap<String, String>,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("mode", &self.mode)
            .field("base_env", &self.base_env)
            .finish()
    }
}

impl Runner {
    /// Wrap a command runner
    pub fn new(backend: Arc<dyn CommandRunner>, mode: RunMode) -> Self {
        Self {
            backend,
            mode,
            base_env: BTreeMap::new(),
        }
    }

    /// Runner backed by real processes
    pub fn system(mode: RunMode) -> Self {
        Self::new(Arc::new(SystemRunner), mode)
    }

    /// Environment applied to every command; per-command overrides win
    pub fn with_base_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.base_env = env;
        self
    }

    /// Current mode
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// True in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.mode == RunMode::DryRun
    }

    fn with_base(&self, spec: &CommandSpec) -> CommandSpec {
        let mut merged = spec.clone();
        for (k, v) in &self.base_env {
            merged
                .env_overrides
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        merged
    }

    /// Run a mutating command for `candidate`
    pub async fn run(&self, candidate: &str, spec: &CommandSpec) -> AttemptResult {
        let line = spec.command_line();
        if self.is_dry_run() {
            info!("[dry-run] {}", line);
            return AttemptResult::synthesized_success(candidate);
        }

        info!("> {}", line);
        if !spec.env_overrides.is_empty() || !spec.path_prepend.is_empty() {
            debug!(
                "  env: {:?}, path prepend: {:?}",
                spec.env_overrides, spec.path_prepend
            );
        }

        let spec = self.with_base(spec);
        match self.backend.invoke(&spec).await {
            Ok(output) => AttemptResult {
                candidate: candidate.to_string(),
                exit_code: output.exit_code,
                succeeded: output.success(),
                stdout_tail: tail_lines(&output.stdout, OUTPUT_TAIL_LINES),
                stderr_tail: tail_lines(&output.stderr, OUTPUT_TAIL_LINES),
            },
            Err(e) => AttemptResult::spawn_failure(candidate, e),
        }
    }

    /// Run a read-only command; executes in every mode
    ///
    /// Returns `None` when the command could not be started.
    pub async fn query(&self, spec: &CommandSpec) -> Option<CommandOutput> {
        debug!("query: {}", spec.command_line());
        let spec = self.with_base(spec);
        match self.backend.invoke(&spec).await {
            Ok(output) => Some(output),
            Err(e) => {
                debug!("query failed: {}", e);
                None
            }
        }
    }
}
