// End-to-end repair loop scenarios driven by a scripted model
//
// The model is a canned-response fake and the interpreter is `sh`, so these
// run without a model server or a Python installation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use codemend::agent::{LoopOutcome, RepairLoop, Session};
use codemend::config::PromptSet;
use codemend::exec::ScriptExecutor;
use codemend::ollama::CodeGenerator;

/// Replays canned responses and records every prompt it was sent.
struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeGenerator for ScriptedModel {
    async fn generate(&self, prompt: &str) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses.lock().unwrap().pop_front().unwrap_or_default()
    }
}

fn agent_with(model: Arc<ScriptedModel>, prompts: PromptSet, max_attempts: u32) -> RepairLoop {
    RepairLoop::new(
        model,
        ScriptExecutor::new("sh", Duration::from_secs(5)),
        prompts,
        max_attempts,
    )
}

#[tokio::test]
async fn test_first_try_success() {
    let model = ScriptedModel::new(&[
        "Here you go:\n```python\nfor i in 1 2 3; do echo $i; done\n```\nEnjoy!",
    ]);
    let agent = agent_with(Arc::clone(&model), PromptSet::default(), 5);

    let mut session = Session::new("print the numbers 1 to 3");
    let outcome = agent.run(&mut session).await.unwrap();

    match outcome {
        LoopOutcome::Success {
            attempts, stdout, ..
        } => {
            assert_eq!(attempts, 1);
            assert_eq!(stdout.trim(), "1\n2\n3");
        }
        other => panic!("expected first-try success, got {:?}", other),
    }
    assert_eq!(model.prompts().len(), 1);
}

#[tokio::test]
async fn test_broken_code_is_repaired_on_second_attempt() {
    // The first version is missing its `done`, a syntax error under sh.
    let model = ScriptedModel::new(&[
        "```python\nfor i in 1 2 3; do echo $i\n```",
        "```python\nfor i in 1 2 3; do echo $i; done\n```",
    ]);
    let agent = agent_with(Arc::clone(&model), PromptSet::default(), 5);

    let mut session = Session::new("print the numbers 1 to 3");
    let outcome = agent.run(&mut session).await.unwrap();

    match outcome {
        LoopOutcome::Success {
            attempts, stdout, ..
        } => {
            assert_eq!(attempts, 2);
            assert_eq!(stdout.trim(), "1\n2\n3");
        }
        other => panic!("expected success on the second attempt, got {:?}", other),
    }

    // The second prompt is a repair: built from the improve template, with
    // the failing code and the interpreter's complaint embedded.
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].starts_with("Fix the following Python code:"));
    assert!(prompts[1].contains("for i in 1 2 3; do echo $i"));
    assert!(prompts[1].to_lowercase().contains("syntax"));
}

#[tokio::test]
async fn test_exhaustion_after_budget_without_trailing_repair() {
    let model = ScriptedModel::new(&["exit 7", "exit 8"]);
    let agent = agent_with(Arc::clone(&model), PromptSet::default(), 2);

    let mut session = Session::new("never works");
    let outcome = agent.run(&mut session).await.unwrap();

    match outcome {
        LoopOutcome::Exhausted { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected exhaustion, got {:?}", other),
    }

    // Two executions but only one repair generation: the repair after the
    // final failure would never run, so it is not requested.
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].starts_with("Fix the following Python code:"));
}

#[tokio::test]
async fn test_missing_template_file_runs_like_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prompts.txt");

    // No template file on disk: loading falls back to built-in defaults
    // and recreates the file, and the run proceeds as usual.
    let prompts = PromptSet::load_or_create(&path);
    assert_eq!(prompts, PromptSet::default());
    assert!(path.exists(), "template file should be recreated");

    let model = ScriptedModel::new(&["```\necho recovered\n```"]);
    let agent = agent_with(Arc::clone(&model), prompts, 5);

    let mut session = Session::new("say recovered");
    let outcome = agent.run(&mut session).await.unwrap();

    match outcome {
        LoopOutcome::Success {
            attempts, stdout, ..
        } => {
            assert_eq!(attempts, 1);
            assert_eq!(stdout.trim(), "recovered");
        }
        other => panic!("expected success, got {:?}", other),
    }

    // Exactly the prompt the built-in defaults would produce.
    assert_eq!(
        model.prompts()[0],
        PromptSet::default().generate_prompt("say recovered")
    );
}
