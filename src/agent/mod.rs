// The generate-execute-repair agent

mod controller;
mod extractor;

pub use controller::{Attempt, LoopObserver, LoopOutcome, RepairLoop, Session};
pub use extractor::extract_code;
