// Ollama client - local models over the /api/generate endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::openai::status_error;
use super::{LlmClient, REQUEST_TIMEOUT_SECS};
use crate::errors::TransportError;

pub const OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";

const TAGS_TIMEOUT_SECS: u64 = 4;

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Client for the local daemon at the default address
    pub fn new(model: String) -> Result<Self, TransportError> {
        Self::with_base_url(OLLAMA_BASE_URL.to_string(), model)
    }

    pub fn with_base_url(base_url: String, model: String) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn prompt(&self, prompt: &str) -> Result<String, TransportError> {
        let url = format!("{}/api/generate", self.base_url);
        tracing::debug!("Sending prompt to ollama ({} chars, model {})", prompt.len(), self.model);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("ollama", status, &body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(format!("ollama: {}", e)))?;

        let text = parsed.response.trim();
        if text.is_empty() {
            return Err(TransportError::EmptyResponse("ollama".to_string()));
        }
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Models installed in the local Ollama daemon.
pub async fn detect_ollama_models() -> Result<Vec<String>, TransportError> {
    detect_ollama_models_at(OLLAMA_BASE_URL).await
}

pub async fn detect_ollama_models_at(base_url: &str) -> Result<Vec<String>, TransportError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(TAGS_TIMEOUT_SECS))
        .build()?;
    let url = format!("{}/api/tags", base_url.trim().trim_end_matches('/'));

    let response = client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error("ollama", status, &body));
    }

    let parsed: TagsResponse = response
        .json()
        .await
        .map_err(|e| TransportError::Decode(format!("ollama: {}", e)))?;

    Ok(parsed
        .models
        .into_iter()
        .map(|m| m.name)
        .filter(|name| !name.trim().is_empty())
        .collect())
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_generate_sends_non_streaming_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(mockito::Matcher::Json(json!({
                "model": "llama3.2",
                "prompt": "list files",
                "stream": false
            })))
            .with_status(200)
            .with_body(r#"{"model":"llama3.2","response":" The repo has two crates. ","done":true}"#)
            .create_async()
            .await;

        let client = OllamaClient::with_base_url(server.url(), "llama3.2".to_string()).unwrap();
        assert_eq!(client.prompt("list files").await.unwrap(), "The repo has two crates.");
        assert_eq!(client.name(), "ollama");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(404)
            .with_body(r#"{"error":"model not found"}"#)
            .create_async()
            .await;

        let client = OllamaClient::with_base_url(server.url(), "missing".to_string()).unwrap();
        let err = client.prompt("x").await.unwrap_err();
        assert!(matches!(err, TransportError::Http { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_detect_models() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_body(r#"{"models":[{"name":"llama3.2:latest"},{"name":""},{"name":"mistral"}]}"#)
            .create_async()
            .await;

        let models = detect_ollama_models_at(&server.url()).await.unwrap();
        assert_eq!(models, vec!["llama3.2:latest", "mistral"]);
    }
}
