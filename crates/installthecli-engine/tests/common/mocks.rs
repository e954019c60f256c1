//! Mock implementations for testing
//!
//! Provides a scripted [`CommandRunner`] and an in-memory [`ToolLocator`]
//! so installer behaviour can be tested without spawning processes.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use installthecli_core::{Error, Result};
use installthecli_engine::runner::{CommandOutput, CommandRunner, CommandSpec};
use installthecli_engine::ToolLocator;

/// Mock command execution result
#[derive(Clone, Debug)]
pub enum MockCommandResult {
    /// Process ran and exited
    Exited {
        stdout: String,
        stderr: String,
        exit_code: i32,
    },
    /// Process could not be started
    SpawnError,
}

impl MockCommandResult {
    pub fn success(stdout: &str) -> Self {
        Self::Exited {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failure(stderr: &str, exit_code: i32) -> Self {
        Self::Exited {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }
}

/// Record of a command invocation
#[derive(Clone, Debug)]
pub struct MockCommandInvocation {
    /// `program args...` without quoting
    pub key: String,
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// Mock command runner for testing
///
/// Responses are looked up by the full command key first, then by program
/// name alone, then fall back to the default response. Queued responses for a
/// key are consumed before any fixed response.
pub struct MockRunner {
    /// Pre-configured command responses
    responses: Mutex<HashMap<String, MockCommandResult>>,
    /// One-shot responses consumed in order
    queued: Mutex<HashMap<String, VecDeque<MockCommandResult>>>,
    /// Recorded command invocations
    invocations: Mutex<Vec<MockCommandInvocation>>,
    /// Default response for unknown commands
    default_response: Mutex<MockCommandResult>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            queued: Mutex::new(HashMap::new()),
            invocations: Mutex::new(Vec::new()),
            default_response: Mutex::new(MockCommandResult::success("")),
        }
    }

    /// Shared handle, ready to pass to a `Runner`
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Set a mock response for a specific command
    pub fn mock_command(&self, command: &str, result: MockCommandResult) {
        self.responses
            .lock()
            .unwrap()
            .insert(command.to_string(), result);
    }

    /// Mock a successful command
    pub fn mock_success(&self, command: &str, stdout: &str) {
        self.mock_command(command, MockCommandResult::success(stdout));
    }

    /// Mock a failed command
    pub fn mock_failure(&self, command: &str, stderr: &str, exit_code: i32) {
        self.mock_command(command, MockCommandResult::failure(stderr, exit_code));
    }

    /// Queue a one-shot response; queued responses win over fixed ones
    pub fn queue(&self, command: &str, result: MockCommandResult) {
        self.queued
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(result);
    }

    /// Set the default response for unknown commands
    pub fn set_default_response(&self, result: MockCommandResult) {
        *self.default_response.lock().unwrap() = result;
    }

    fn respond(&self, spec: &CommandSpec) -> MockCommandResult {
        let key = spec.key();

        if let Some(queue) = self.queued.lock().unwrap().get_mut(&key) {
            if let Some(result) = queue.pop_front() {
                return result;
            }
        }

        let responses = self.responses.lock().unwrap();

        // Try full command match first
        if let Some(result) = responses.get(&key) {
            return result.clone();
        }

        // Try program-only match
        if let Some(result) = responses.get(&spec.program) {
            return result.clone();
        }

        self.default_response.lock().unwrap().clone()
    }

    /// Get all recorded invocations
    pub fn get_invocations(&self) -> Vec<MockCommandInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Recorded command keys, in order
    pub fn invoked_keys(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.key.clone())
            .collect()
    }

    /// Check if an exact command was invoked
    pub fn was_invoked(&self, key: &str) -> bool {
        self.invocations.lock().unwrap().iter().any(|i| i.key == key)
    }

    /// Check if any command of `program` was invoked
    pub fn was_program_invoked(&self, program: &str) -> bool {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .any(|i| i.program == program)
    }

    /// Get invocation count for an exact command
    pub fn invocation_count(&self, key: &str) -> usize {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.key == key)
            .count()
    }

    /// Total number of invocations
    pub fn total_invocations(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    /// Clear recorded invocations
    pub fn clear_invocations(&self) {
        self.invocations.lock().unwrap().clear();
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn invoke(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.invocations
            .lock()
            .unwrap()
            .push(MockCommandInvocation {
                key: spec.key(),
                program: spec.program.clone(),
                args: spec.args.clone(),
                env: spec
                    .env_overrides
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            });

        match self.respond(spec) {
            MockCommandResult::Exited {
                stdout,
                stderr,
                exit_code,
            } => Ok(CommandOutput {
                exit_code: Some(exit_code),
                stdout,
                stderr,
            }),
            MockCommandResult::SpawnError => Err(Error::command_spawn(
                spec.program.clone(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
            )),
        }
    }
}

/// Mock tool locator backed by a name → path table
///
/// Tools registered with [`MockLocator::appear_after`] become resolvable once
/// the linked runner has recorded the given command, which models a tool
/// showing up on PATH after its installer ran.
#[derive(Default)]
pub struct MockLocator {
    tools: Mutex<HashMap<String, PathBuf>>,
    pending: Mutex<Vec<(String, String)>>,
    runner: Option<Arc<MockRunner>>,
}

impl MockLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locator that can observe `runner` for [`MockLocator::appear_after`]
    pub fn linked(runner: Arc<MockRunner>) -> Self {
        Self {
            runner: Some(runner),
            ..Self::default()
        }
    }

    /// Make `name` resolvable once `command` has been invoked
    pub fn appear_after(&self, name: &str, command: &str) {
        self.pending
            .lock()
            .unwrap()
            .push((name.to_string(), command.to_string()));
    }

    /// Locator where each name resolves to itself
    pub fn with_tools(names: &[&str]) -> Self {
        let locator = Self::new();
        for name in names {
            locator.add_tool(name);
        }
        locator
    }

    /// Make `name` resolvable as a bare program name
    pub fn add_tool(&self, name: &str) {
        self.add_tool_at(name, PathBuf::from(name));
    }

    /// Make `name` resolvable at `path`
    pub fn add_tool_at(&self, name: &str, path: impl Into<PathBuf>) {
        self.tools
            .lock()
            .unwrap()
            .insert(name.to_string(), path.into());
    }

    /// Remove `name`
    pub fn remove_tool(&self, name: &str) {
        self.tools.lock().unwrap().remove(name);
    }
}

impl ToolLocator for MockLocator {
    fn locate_in(&self, name: &str, _extra_dirs: &[PathBuf]) -> Option<PathBuf> {
        if let Some(path) = self.tools.lock().unwrap().get(name) {
            return Some(path.clone());
        }
        let runner = self.runner.as_ref()?;
        self.pending
            .lock()
            .unwrap()
            .iter()
            .any(|(tool, command)| tool == name && runner.was_invoked(command))
            .then(|| PathBuf::from(name))
    }
}
