// Configuration: settings file, environment overrides, and prompt templates

mod loader;
mod prompts;
mod settings;

pub use loader::load_settings;
pub use prompts::{PromptSet, GENERATE_KEY, IMPROVE_KEY};
pub use settings::{Settings, SETTINGS_FILE};
