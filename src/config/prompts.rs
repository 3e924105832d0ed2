// Prompt templates with built-in fallbacks
//
// The template file is a plain `KEY: value` list so users can reword the
// prompts without touching code. Loading can degrade (missing file, missing
// key, empty value) but never fail: whatever is wrong is logged and the
// built-in default takes over.

use std::fs;
use std::io;
use std::path::Path;

/// Template key for the initial generation prompt.
pub const GENERATE_KEY: &str = "GENERATE_CODE";
/// Template key for the repair prompt.
pub const IMPROVE_KEY: &str = "IMPROVE_CODE";

const DEFAULT_GENERATE: &str = "Create Python code for the following task:";

const DEFAULT_IMPROVE: &str = "Fix the following Python code:\n\n{code}\n\nError:\n{error}\n\n\
Fix the code and return only the corrected code, without any explanations or additional comments.";

/// The two prompt templates the repair loop runs on.
///
/// `improve` carries `{code}` and `{error}` placeholders. Both fields are
/// guaranteed non-empty: an empty or missing source entry falls back to the
/// built-in default.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSet {
    pub generate: String,
    pub improve: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            generate: DEFAULT_GENERATE.to_string(),
            improve: DEFAULT_IMPROVE.to_string(),
        }
    }
}

impl PromptSet {
    /// Load templates from `path`, creating the file with defaults when it
    /// does not exist. Never fails; problems are logged and defaulted.
    pub fn load_or_create(path: &Path) -> Self {
        if !path.exists() {
            tracing::warn!(
                "Template file {} not found, creating it with built-in defaults",
                path.display()
            );
            let defaults = Self::default();
            if let Err(e) = defaults.write_to(path) {
                tracing::warn!("Could not create {}: {}", path.display(), e);
            }
            return defaults;
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse `KEY: value` lines. Lines without a colon and unknown keys are
    /// ignored; a missing or empty required key falls back with a warning.
    fn parse(contents: &str) -> Self {
        let mut generate: Option<String> = None;
        let mut improve: Option<String> = None;

        for line in contents.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim() {
                GENERATE_KEY => generate = Some(unescape(value)),
                IMPROVE_KEY => improve = Some(unescape(value)),
                _ => {}
            }
        }

        let defaults = Self::default();
        Self {
            generate: generate.unwrap_or_else(|| {
                tracing::warn!(
                    "'{}' not found in template file, using the built-in default",
                    GENERATE_KEY
                );
                defaults.generate.clone()
            }),
            improve: improve.unwrap_or_else(|| {
                tracing::warn!(
                    "'{}' not found in template file, using the built-in default",
                    IMPROVE_KEY
                );
                defaults.improve.clone()
            }),
        }
    }

    /// Write the templates as `KEY: value` lines. Newlines inside a value
    /// are stored as `\n` so every entry stays on one line.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let contents = format!(
            "# codemend prompt templates. One entry per line, KEY: value.\n\
             # Use \\n inside a value for a line break. {{code}} and {{error}}\n\
             # are filled in by the repair loop.\n\
             {}: {}\n\
             {}: {}\n",
            GENERATE_KEY,
            escape(&self.generate),
            IMPROVE_KEY,
            escape(&self.improve),
        );
        fs::write(path, contents)
    }

    /// Full prompt for the initial generation: template, then the task.
    pub fn generate_prompt(&self, task: &str) -> String {
        format!("{}\n{}", self.generate, task)
    }

    /// Full prompt for a repair: the improve template with the failing code
    /// and its error text substituted in.
    pub fn improve_prompt(&self, code: &str, error: &str) -> String {
        render(&self.improve, code, error)
    }
}

/// Substitute `{code}` and `{error}` in a single pass over the template.
/// Substituted values are never re-scanned, so braces inside code or error
/// text pass through untouched.
fn render(template: &str, code: &str, error: &str) -> String {
    let mut out = String::with_capacity(template.len() + code.len() + error.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{code}") {
            out.push_str(code);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{error}") {
            out.push_str(error);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
