// Runtime settings

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the optional settings file, looked up in the working directory.
pub const SETTINGS_FILE: &str = "codemend.toml";

/// Everything tunable about a run.
///
/// Every field has a default, so a missing settings file (or a file with
/// only some keys) is never an error. `OLLAMA_HOST` overrides `base_url`
/// after the file is read.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Model tag sent to the Ollama generate endpoint.
    pub model: String,

    /// Base URL of the Ollama server.
    pub base_url: String,

    /// Interpreter that runs generated code.
    pub interpreter: String,

    /// Request a streamed NDJSON response instead of a single JSON object.
    pub stream: bool,

    /// Hard timeout for one model request, in seconds.
    pub request_timeout_secs: u64,

    /// Hard wall-clock timeout for one code execution, in seconds.
    pub exec_timeout_secs: u64,

    /// Attempt budget for the repair loop (the first attempt counts).
    pub max_attempts: u32,

    /// Prompt template file; created with built-in defaults when missing.
    pub prompts_path: PathBuf,

    /// Task file read by the batch runner.
    pub task_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: "qwen2.5-coder:7b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            interpreter: "python3".to_string(),
            stream: true,
            request_timeout_secs: 30,
            exec_timeout_secs: 10,
            max_attempts: 5,
            prompts_path: PathBuf::from("prompts.txt"),
            task_file: PathBuf::from("prompt.txt"),
        }
    }
}

impl Settings {
    /// Validate settings and return helpful errors
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            anyhow::bail!("model must not be empty");
        }

        if self.interpreter.trim().is_empty() {
            anyhow::bail!("interpreter must not be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!(
                "Invalid base_url: '{}'\n\n\
                 The Ollama endpoint should look like:\n  \
                 http://localhost:11434",
                self.base_url
            );
        }

        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        if self.max_attempts > 50 {
            anyhow::bail!(
                "max_attempts ({}) is unreasonably high\n\n\
                 Recommended range: 1-10\n\
                 Each failed attempt costs a full model round trip",
                self.max_attempts
            );
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.exec_timeout_secs == 0 {
            anyhow::bail!("exec_timeout_secs must be greater than 0");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.exec_timeout_secs, 10);
        assert_eq!(settings.request_timeout_secs, 30);
        assert!(settings.stream);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        // A partial file must deserialize; absent keys take their defaults.
        let settings: Settings = toml::from_str(r#"model = "llama3.2""#).unwrap();
        assert_eq!(settings.model, "llama3.2");
        assert_eq!(settings.base_url, "http://localhost:11434");
        assert_eq!(settings.max_attempts, 5);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let settings = Settings {
            max_attempts: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let settings = Settings {
            exec_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            request_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_base_url() {
        let settings = Settings {
            base_url: "localhost:11434".to_string(),
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err().to_string();
        assert!(err.contains("base_url"), "unexpected error: {}", err);
    }

    #[test]
    fn test_timeout_accessors() {
        let settings = Settings::default();
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.exec_timeout(), Duration::from_secs(10));
    }
}
