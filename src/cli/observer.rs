// Console reporting - attempt-by-attempt progress and the final outcome

use crossterm::style::Stylize;

use crate::agent::{Attempt, LoopObserver, LoopOutcome};

/// Prints each attempt's code before it runs and each failure's stderr,
/// the trajectory a user watches while the loop works.
pub struct ConsoleObserver;

impl LoopObserver for ConsoleObserver {
    fn attempt_started(&self, attempt: &Attempt) {
        println!("\n{} Attempt {}", "▸".cyan().bold(), attempt.index);
        print_separator();
        println!("{}", attempt.code);
        print_separator();
    }

    fn attempt_failed(&self, attempt: &Attempt) {
        println!("{} Attempt {} failed", "✗".red().bold(), attempt.index);
        if let Some(result) = &attempt.result {
            let stderr = result.stderr.trim_end();
            if !stderr.is_empty() {
                println!("{}", stderr);
            }
        }
    }
}

/// Final report, shared by the REPL and the batch runner.
pub fn print_outcome(outcome: &LoopOutcome) {
    match outcome {
        LoopOutcome::Success {
            code,
            stdout,
            attempts,
        } => {
            println!("\n{} Worked on attempt {}", "✓".green().bold(), attempts);
            println!("\n{}", "Final code:".bold());
            print_separator();
            println!("{}", code);
            print_separator();
            let out = stdout.trim_end();
            if out.is_empty() {
                println!("{}", "(no output)".dark_grey());
            } else {
                println!("\n{}", "Output:".bold());
                println!("{}", out);
            }
        }
        LoopOutcome::Exhausted { message, .. } => {
            println!("\n{} {}", "✗".red().bold(), message);
        }
    }
}

fn print_separator() {
    println!("{}", "─".repeat(60).dark_grey());
}
