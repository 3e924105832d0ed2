// Codemend - generate, run, and repair Python code with a local model
// Interactive entry point

use std::sync::Arc;

use anyhow::Result;

use codemend::agent::RepairLoop;
use codemend::cli::{ConsoleObserver, Repl};
use codemend::config::{load_settings, PromptSet};
use codemend::exec::ScriptExecutor;
use codemend::ollama::OllamaClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration and prompt templates
    let settings = load_settings()?;
    let prompts = PromptSet::load_or_create(&settings.prompts_path);

    // Fail fast if the model server is unreachable
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

    // Create and run the REPL
    let mut repl = Repl::new(agent, &settings)?;
    repl.run().await?;

    Ok(())
}
