// Model server access: the generation seam and its Ollama implementation

use async_trait::async_trait;

mod client;

pub use client::OllamaClient;

/// Text-in, text-out generation seam for the repair loop.
///
/// Implementations return the full response text for one prompt. A failed
/// call yields an empty string rather than an error, so the loop can treat
/// "no text" uniformly as a failed attempt.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Send one prompt and return the complete response text.
    async fn generate(&self, prompt: &str) -> String;
}
