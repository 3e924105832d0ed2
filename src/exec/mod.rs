// Sandboxed script execution

mod executor;

pub use executor::{ExecError, ScriptExecutor};

/// Outcome of one script execution.
///
/// Produced only by the executor. `succeeded` is true iff the process exited
/// with status zero; a timeout or signal death is a failure. On timeout the
/// process's own output is unavailable and `stderr` carries a timeout message
/// instead.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
}
