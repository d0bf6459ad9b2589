// Model providers
//
// Every backend answers one plain-text prompt with plain text. The driver
// only sees `LlmClient`; the factory decides which implementation to build.

use async_trait::async_trait;

use crate::errors::TransportError;

pub mod factory;
pub mod ollama;
pub mod openai;

pub use factory::{create_client, ClientOverrides};
pub use ollama::{detect_ollama_models, OllamaClient};
pub use openai::{detect_gateway_models, OpenAiCompatClient};

/// Request timeout shared by the prompt endpoints
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Error bodies are cut to this many bytes before being reported
pub(crate) const MAX_ERROR_BODY_BYTES: usize = 4096;

/// Trait for language-model clients
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one prompt and return the trimmed, non-empty text answer.
    async fn prompt(&self, prompt: &str) -> Result<String, TransportError>;

    /// Provider name (e.g. "vercel", "openai", "ollama")
    fn name(&self) -> &str;

    /// Model every request is sent to
    fn model(&self) -> &str;
}

/// Truncate an error body on a char boundary and trim it.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_BYTES {
        return body.trim().to_string();
    }
    let mut end = MAX_ERROR_BODY_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].trim().to_string()
}
