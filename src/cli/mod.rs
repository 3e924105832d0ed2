// CLI module
// Interactive REPL and console reporting for the repair loop

mod observer;
mod repl;

pub use observer::{print_outcome, ConsoleObserver};
pub use repl::Repl;
