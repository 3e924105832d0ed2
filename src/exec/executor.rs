// Script executor - stages code in a scratch file and runs it as a subprocess
//
// Isolation is process separation plus a wall-clock timeout, nothing more.
// Every run stages the code in a freshly created temp file (never a shared
// path reused across runs) and the file is removed on all exit paths,
// including timeouts and spawn failures, by dropping the handle.

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tempfile::{Builder, NamedTempFile};
use thiserror::Error;
use tokio::process::Command;

use super::ExecutionResult;

/// Conditions under which no `ExecutionResult` can be produced at all.
/// Everything the script itself does wrong (non-zero exit, timeout) is an
/// `ExecutionResult`, not an error.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The code could not be written to a scratch file.
    #[error("failed to stage code in a scratch file: {0}")]
    Stage(#[source] std::io::Error),

    /// The interpreter process could not be started.
    #[error("failed to launch interpreter '{interpreter}': {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    /// The child was running but its output could not be collected.
    #[error("failed to collect process output: {0}")]
    Wait(#[source] std::io::Error),
}

/// Runs code strings through a configured interpreter with a timeout.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    interpreter: String,
    timeout: Duration,
    scratch_dir: Option<PathBuf>,
}

impl ScriptExecutor {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
            scratch_dir: None,
        }
    }

    /// Stage scratch files under `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Run `code` as a fresh interpreter process and capture its output.
    ///
    /// On timeout the child is killed and the result is a failure whose
    /// stderr names the timeout; the process's own stderr is gone with it.
    pub async fn execute(&self, code: &str) -> Result<ExecutionResult, ExecError> {
        let file = self.stage(code)?;

        tracing::debug!(
            "Executing staged script {} with {}",
            file.path().display(),
            self.interpreter
        );

        // kill_on_drop: when the timeout drops the wait future, the child
        // goes down with it instead of running on unattended.
        let child = Command::new(&self.interpreter)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ExecutionResult {
                succeeded: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }),
            Ok(Err(e)) => Err(ExecError::Wait(e)),
            Err(_) => {
                tracing::warn!("Execution exceeded {:?}, killing the process", self.timeout);
                Ok(ExecutionResult {
                    succeeded: false,
                    stdout: String::new(),
                    stderr: format!("Execution timed out after {:?}", self.timeout),
                })
            }
        }
    }

    fn stage(&self, code: &str) -> Result<NamedTempFile, ExecError> {
        let mut builder = Builder::new();
        builder.prefix("codemend-").suffix(".py");

        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(ExecError::Stage)?;

        file.write_all(code.as_bytes()).map_err(ExecError::Stage)?;
        Ok(file)
    }
}
