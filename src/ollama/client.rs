// Ollama API client
//
// Talks to a local Ollama-compatible server over /api/generate. Both the
// streamed (newline-delimited JSON fragments) and non-streamed (single
// object) response shapes are handled. Failures never abort the caller:
// the cause is logged and generation degrades to an empty string, which the
// repair loop counts as a failed attempt.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::CodeGenerator;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for a local Ollama-compatible model server.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    stream: bool,
}

impl OllamaClient {
    /// Create a client with the default request timeout.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        stream: bool,
    ) -> Result<Self> {
        Self::with_timeout(
            base_url,
            model,
            stream,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Create a client with a custom request timeout.
    ///
    /// This timeout bounds the model call only; script execution has its own
    /// independent timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        stream: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            stream,
        })
    }

    /// Check that the server is reachable. Called once before entering a
    /// generation loop so an unreachable server fails fast with a clear
    /// message instead of surfacing as silent empty generations.
    pub async fn probe(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await.with_context(|| {
            format!(
                "Could not reach the model server at {}\n\n\
                 Suggestion: start the server (e.g. `ollama serve`) or point\n\
                 base_url / OLLAMA_HOST at the right address",
                self.base_url
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(
                "Model server at {} answered the connectivity probe with {}",
                self.base_url,
                status
            );
        }

        tracing::debug!("Model server probe OK at {}", self.base_url);
        Ok(())
    }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: self.stream,
        };
        let url = format!("{}/api/generate", self.base_url);

        tracing::debug!(
            "Sending generate request to {} (model: {}, stream: {})",
            url,
            self.model,
            self.stream
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the model server")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Model server request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        if self.stream {
            self.collect_stream(response).await
        } else {
            let body: GenerateFragment = response
                .json()
                .await
                .context("Failed to parse the model server response")?;
            Ok(body.response)
        }
    }

    /// Drain a streamed response: one JSON fragment per line, each carrying
    /// a text delta, the last one flagged `done`. Malformed lines are skipped
    /// with a warning so a single bad fragment cannot sink the whole answer.
    async fn collect_stream(&self, response: reqwest::Response) -> Result<String> {
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut text = String::new();
        let mut done = false;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.context("Model server stream was interrupted")?;
            buffer.extend_from_slice(&bytes);

            // Parse line by line
            while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();
                let line = String::from_utf8_lossy(&line_bytes);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match serde_json::from_str::<GenerateFragment>(line) {
                    Ok(fragment) => {
                        text.push_str(&fragment.response);
                        if fragment.done {
                            done = true;
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Skipping malformed stream fragment: {}", e);
                    }
                }
            }

            if done {
                break;
            }
        }

        // A final fragment without a trailing newline still counts.
        if !done && !buffer.is_empty() {
            let tail = String::from_utf8_lossy(&buffer);
            let tail = tail.trim();
            if !tail.is_empty() {
                match serde_json::from_str::<GenerateFragment>(tail) {
                    Ok(fragment) => text.push_str(&fragment.response),
                    Err(e) => tracing::warn!("Skipping malformed stream tail: {}", e),
                }
            }
        }

        Ok(text)
    }
}

#[async_trait]
impl CodeGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> String {
        match self.generate_once(prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Generation failed: {:#}", e);
                String::new()
            }
        }
    }
}

// Ollama API types

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// One streamed fragment, or the whole body in non-streamed mode.
#[derive(Debug, Clone, Deserialize)]
struct GenerateFragment {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}
