// Interactive REPL
//
// One task per line; 'multiline' switches to a Ctrl-D-terminated multi-line
// entry for tasks that carry code blocks. Nothing survives between tasks:
// every run gets a fresh session.

use anyhow::Result;
use crossterm::style::Stylize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::agent::{RepairLoop, Session};
use crate::config::Settings;

use super::print_outcome;

pub struct Repl {
    agent: RepairLoop,
    model: String,
    base_url: String,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(agent: RepairLoop, settings: &Settings) -> Result<Self> {
        Ok(Self {
            agent,
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            editor: DefaultEditor::new()?,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        loop {
            println!();
            let line = match self.editor.readline("> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted. Type 'exit' to quit.");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            self.editor.add_history_entry(input)?;

            if input.eq_ignore_ascii_case("exit") {
                break;
            }

            let task = if input.eq_ignore_ascii_case("multiline") {
                match self.read_multiline()? {
                    Some(task) => task,
                    None => continue,
                }
            } else {
                input.to_string()
            };

            let mut session = Session::new(task);
            match self.agent.run(&mut session).await {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => eprintln!("{} {:#}", "Error:".red().bold(), e),
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Collect a multi-line task; Ctrl-D finishes it, Ctrl-C abandons it.
    fn read_multiline(&mut self) -> Result<Option<String>> {
        println!("Multi-line task. Finish with Ctrl-D, cancel with Ctrl-C.");
        let mut lines: Vec<String> = Vec::new();

        loop {
            match self.editor.readline("... ") {
                Ok(line) => lines.push(line),
                Err(ReadlineError::Eof) => break,
                Err(ReadlineError::Interrupted) => {
                    println!("Cancelled.");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let task = lines.join("\n").trim().to_string();
        if task.is_empty() {
            return Ok(None);
        }
        Ok(Some(task))
    }

    fn print_banner(&self) {
        println!(
            "codemend v{} - generate, run, and repair Python code",
            env!("CARGO_PKG_VERSION")
        );
        println!("Model: {} @ {}", self.model, self.base_url);
        println!();
        println!("Type a task to generate code for it.");
        println!(
            "Commands: {} for a multi-line task, {} to quit.",
            "'multiline'".bold(),
            "'exit'".bold()
        );
    }
}
