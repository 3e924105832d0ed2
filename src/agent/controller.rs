// Repair loop controller - generate, execute, repair until something runs
//
// One run() call drives a full task: get initial code (generated, or lifted
// from a "fix this code" request), execute it, and on failure feed the code
// and its stderr back to the model for a corrected version, up to the attempt
// budget. Attempts that yield no code still consume budget, so the loop is
// bounded by the counter alone.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::PromptSet;
use crate::exec::{ExecutionResult, ScriptExecutor};
use crate::ollama::CodeGenerator;

use super::extract_code;

/// One generate-or-repair-then-execute cycle. `result` is filled in once,
/// after execution; attempts that never reached execution carry a synthetic
/// failure instead.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub index: u32,
    pub code: String,
    pub result: Option<ExecutionResult>,
}

/// The mutable record for one task, owned by the caller. Model calls are
/// stateless server-side, so this is the only state that survives between
/// attempts.
#[derive(Debug, Clone)]
pub struct Session {
    pub task: String,
    pub attempt: u32,
    pub code: String,
}

impl Session {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            attempt: 0,
            code: String::new(),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum LoopOutcome {
    /// The code exited with status zero.
    Success {
        code: String,
        stdout: String,
        attempts: u32,
    },
    /// The attempt budget ran out without a successful execution.
    Exhausted { attempts: u32, message: String },
}

/// Receives attempt-by-attempt progress. Implementations only render;
/// they never influence control flow.
pub trait LoopObserver: Send + Sync {
    /// Called with the attempt's code before it is executed.
    fn attempt_started(&self, _attempt: &Attempt) {}

    /// Called after a failed attempt, result filled in. Attempts that had no
    /// code to run are reported here too, with a synthetic result.
    fn attempt_failed(&self, _attempt: &Attempt) {}
}

struct SilentObserver;

impl LoopObserver for SilentObserver {}

/// The repair loop.
///
/// Runs at most `max_attempts` execute cycles. For `n` consecutive failures
/// that is `n` executions and `n - 1` repair generations: the repair after
/// the final failure is skipped because nothing would run it.
pub struct RepairLoop {
    generator: Arc<dyn CodeGenerator>,
    executor: ScriptExecutor,
    prompts: PromptSet,
    max_attempts: u32,
    observer: Arc<dyn LoopObserver>,
}

impl RepairLoop {
    pub fn new(
        generator: Arc<dyn CodeGenerator>,
        executor: ScriptExecutor,
        prompts: PromptSet,
        max_attempts: u32,
    ) -> Self {
        Self {
            generator,
            executor,
            prompts,
            max_attempts,
            observer: Arc::new(SilentObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LoopObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Drive the full loop for `session.task`.
    pub async fn run(&self, session: &mut Session) -> Result<LoopOutcome> {
        let mut code = self.initial_code(&session.task).await;

        for attempt in 1..=self.max_attempts {
            session.attempt = attempt;
            session.code = code.clone();

            // No code to run: a failed attempt that skips execution. The
            // next call re-issues the generate prompt, as there is nothing
            // to build a repair prompt from.
            if code.is_empty() {
                tracing::warn!("Attempt {} has no code to run", attempt);
                self.observer.attempt_failed(&Attempt {
                    index: attempt,
                    code: String::new(),
                    result: Some(ExecutionResult {
                        succeeded: false,
                        stdout: String::new(),
                        stderr: "the model returned no code".to_string(),
                    }),
                });
                if attempt < self.max_attempts {
                    code = self.generate_fresh(&session.task).await;
                }
                continue;
            }

            let mut record = Attempt {
                index: attempt,
                code: code.clone(),
                result: None,
            };
            self.observer.attempt_started(&record);

            let result = self
                .executor
                .execute(&code)
                .await
                .context("Could not run the generated code")?;

            if result.succeeded {
                tracing::debug!("Attempt {} succeeded", attempt);
                return Ok(LoopOutcome::Success {
                    code,
                    stdout: result.stdout,
                    attempts: attempt,
                });
            }

            tracing::debug!("Attempt {} failed: {}", attempt, result.stderr.trim());
            let stderr = result.stderr.clone();
            record.result = Some(result);
            self.observer.attempt_failed(&record);

            // Skip the repair after the final failure; nothing would run it.
            if attempt < self.max_attempts {
                let prompt = self.prompts.improve_prompt(&code, &stderr);
                code = extract_code(&self.generator.generate(&prompt).await);
            }
        }

        Ok(LoopOutcome::Exhausted {
            attempts: self.max_attempts,
            message: format!(
                "No working code after {} attempts. Rephrasing the task or \
                 trying a different model may help.",
                self.max_attempts
            ),
        })
    }

    /// Initial code for a task: either the payload of a "fix this code"
    /// request, or a fresh generation.
    async fn initial_code(&self, task: &str) -> String {
        if let Some(payload) = fix_request_payload(task) {
            tracing::debug!("Task carries its own code, skipping initial generation");
            return extract_code(payload);
        }
        self.generate_fresh(task).await
    }

    async fn generate_fresh(&self, task: &str) -> String {
        let prompt = self.prompts.generate_prompt(task);
        extract_code(&self.generator.generate(&prompt).await)
    }
}

/// Case-insensitive "fix this code" detection. Everything after the phrase
/// is the code to repair; the model is not asked for an initial version.
/// A task that merely mentions the phrase will misfire; accepted, since the
/// payload still goes through the extractor and the loop repairs from there.
fn fix_request_payload(task: &str) -> Option<&str> {
    const PHRASE: &str = "fix this code";
    let bytes = task.as_bytes();
    if bytes.len() < PHRASE.len() {
        return None;
    }
    for start in 0..=(bytes.len() - PHRASE.len()) {
        if bytes[start..start + PHRASE.len()].eq_ignore_ascii_case(PHRASE.as_bytes()) {
            // The phrase is pure ASCII, so this index is a char boundary.
            return Some(&task[start + PHRASE.len()..]);
        }
    }
    None
}
