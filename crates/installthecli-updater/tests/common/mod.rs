//! Common test utilities for installthecli-updater

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use installthecli_core::Result;
use installthecli_engine::{CommandOutput, CommandRunner, CommandSpec, RunMode, Runner};

/// Command runner returning canned output and recording every invocation
#[derive(Default)]
pub struct RecordingRunner {
    responses: Mutex<HashMap<String, CommandOutput>>,
    invocations: Mutex<Vec<CommandSpec>>,
}

impl RecordingRunner {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Respond to `key` (unquoted `program args...`)
    pub fn respond(&self, key: &str, exit_code: i32, stdout: &str) {
        self.responses.lock().unwrap().insert(
            key.to_string(),
            CommandOutput {
                exit_code: Some(exit_code),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
    }

    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.invocations().iter().map(CommandSpec::key).collect()
    }

    pub fn runner(self: &Arc<Self>, mode: RunMode) -> Runner {
        Runner::new(self.clone(), mode)
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn invoke(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.invocations.lock().unwrap().push(spec.clone());
        let responses = self.responses.lock().unwrap();
        Ok(responses.get(&spec.key()).cloned().unwrap_or(CommandOutput {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }))
    }
}
