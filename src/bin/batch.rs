// Codemend batch runner - one repair loop pass for a task read from a file

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};

use codemend::agent::{LoopOutcome, RepairLoop, Session};
use codemend::cli::{print_outcome, ConsoleObserver};
use codemend::config::{load_settings, PromptSet};
use codemend::exec::ScriptExecutor;
use codemend::ollama::OllamaClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = load_settings()?;
    let prompts = PromptSet::load_or_create(&settings.prompts_path);

    let task = fs::read_to_string(&settings.task_file).with_context(|| {
        format!(
            "Could not read the task file {}\n\n\
             Suggestion: write the task description into that file, or point\n\
             task_file in codemend.toml somewhere else",
            settings.task_file.display()
        )
    })?;
    let task = task.trim().to_string();
    if task.is_empty() {
        anyhow::bail!("The task file {} is empty", settings.task_file.display());
    }

    let client = OllamaClient::with_timeout(
        settings.base_url.clone(),
        settings.model.clone(),
        settings.stream,
        settings.request_timeout(),
    )?;
    client.probe().await?;

    let executor = ScriptExecutor::new(settings.interpreter.clone(), settings.exec_timeout());
    let agent = RepairLoop::new(Arc::new(client), executor, prompts, settings.max_attempts)
        .with_observer(Arc::new(ConsoleObserver));

    println!("Task: {}", task);
    let mut session = Session::new(task);
    let outcome = agent.run(&mut session).await?;
    print_outcome(&outcome);

    if matches!(outcome, LoopOutcome::Exhausted { .. }) {
        std::process::exit(1);
    }
    Ok(())
}
