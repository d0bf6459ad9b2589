// OpenAI-compatible chat completions client
//
// Serves both OpenAI itself and the Vercel AI Gateway, which exposes the same
// API shape under a different base URL.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{truncate_body, LlmClient, REQUEST_TIMEOUT_SECS};
use crate::errors::TransportError;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GATEWAY_BASE_URL: &str = "https://ai-gateway.vercel.sh/v1";

pub const GATEWAY_API_KEY_ENV_VAR: &str = "AI_GATEWAY_API_KEY";
pub const GATEWAY_BASE_URL_ENV_VAR: &str = "AI_GATEWAY_BASE_URL";
pub const OPENAI_API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

const MODELS_TIMEOUT_SECS: u64 = 12;

/// Chat-completions client for OpenAI-compatible endpoints
#[derive(Clone)]
pub struct OpenAiCompatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    provider_name: String,
}

impl OpenAiCompatClient {
    /// OpenAI proper
    pub fn new_openai(api_key: String, model: String) -> Result<Self, TransportError> {
        Self::new(api_key, OPENAI_BASE_URL.to_string(), model, "openai".to_string())
    }

    /// Vercel AI Gateway; `base_url` falls back to the public endpoint
    pub fn new_vercel(
        api_key: String,
        base_url: Option<String>,
        model: String,
    ) -> Result<Self, TransportError> {
        Self::new(
            api_key,
            base_url.unwrap_or_else(|| GATEWAY_BASE_URL.to_string()),
            model,
            "vercel".to_string(),
        )
    }

    /// Client with custom settings
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        provider_name: String,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            model,
            provider_name,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn prompt(&self, prompt: &str) -> Result<String, TransportError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(
            "Sending prompt to {} ({} chars, model {})",
            self.provider_name,
            prompt.len(),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.to_request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(&self.provider_name, status, &body));
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::Decode(format!("{}: {}", self.provider_name, e)))?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            TransportError::Decode(format!("{} returned no choices", self.provider_name))
        })?;

        let content = extract_chat_content(&choice.message.content)
            .map_err(|e| TransportError::Decode(format!("{}: {}", self.provider_name, e)))?;
        let content = content.trim();
        if content.is_empty() {
            return Err(TransportError::EmptyResponse(self.provider_name.clone()));
        }

        tracing::debug!("Received {} chars from {}", content.len(), self.provider_name);
        Ok(content.to_string())
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Map a non-2xx response to an error, treating 401/403 as bad credentials.
pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> TransportError {
    let body = truncate_body(body);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return TransportError::Auth(format!(
            "{} rejected the API key (status {}): {}",
            provider,
            status.as_u16(),
            body
        ));
    }
    TransportError::Http {
        provider: provider.to_string(),
        status: status.as_u16(),
        body,
    }
}

/// Message content is either a plain string or a list of typed parts.
/// Text parts (or untyped parts with `text`) are joined with newlines.
fn extract_chat_content(raw: &serde_json::Value) -> Result<String, String> {
    match raw {
        serde_json::Value::String(text) => Ok(text.clone()),
        serde_json::Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter(|part| {
                    matches!(
                        part.get("type").and_then(|t| t.as_str()),
                        None | Some("") | Some("text")
                    )
                })
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .filter(|text| !text.trim().is_empty())
                .collect();
            if texts.is_empty() {
                return Err("no text content in response".to_string());
            }
            Ok(texts.join("\n"))
        }
        serde_json::Value::Null => Ok(String::new()),
        _ => Err("unsupported content format in response".to_string()),
    }
}

/// List model ids from an OpenAI-compatible `/models` endpoint.
pub async fn detect_gateway_models(
    api_key: &str,
    base_url: &str,
) -> Result<Vec<String>, TransportError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(MODELS_TIMEOUT_SECS))
        .build()?;
    let url = format!("{}/models", base_url.trim().trim_end_matches('/'));

    let response = client.get(&url).bearer_auth(api_key).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error("vercel", status, &body));
    }

    let parsed: ModelsResponse = response
        .json()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))?;

    Ok(parsed
        .data
        .into_iter()
        .map(|m| m.id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect())
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[serde(default)]
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base_url: &str) -> OpenAiCompatClient {
        OpenAiCompatClient::new(
            "test-key".to_string(),
            base_url.to_string(),
            "gpt-4o-mini".to_string(),
            "openai".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_provider_creation() {
        let openai = OpenAiCompatClient::new_openai("k".to_string(), "gpt-4o".to_string()).unwrap();
        assert_eq!(openai.name(), "openai");
        assert_eq!(openai.base_url(), OPENAI_BASE_URL);

        let vercel =
            OpenAiCompatClient::new_vercel("k".to_string(), None, "openai/gpt-4o-mini".to_string())
                .unwrap();
        assert_eq!(vercel.name(), "vercel");
        assert_eq!(vercel.model(), "openai/gpt-4o-mini");
        assert_eq!(vercel.base_url(), GATEWAY_BASE_URL);
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        assert_eq!(client("http://localhost:1/v1/").base_url(), "http://localhost:1/v1");
    }

    #[test]
    fn test_extract_chat_content_variants() {
        assert_eq!(extract_chat_content(&json!("hi")).unwrap(), "hi");
        assert_eq!(
            extract_chat_content(&json!([
                {"type": "text", "text": "a"},
                {"type": "image_url", "text": "skip"},
                {"text": "b"}
            ]))
            .unwrap(),
            "a\nb"
        );
        assert!(extract_chat_content(&json!([{"type": "image_url"}])).is_err());
        assert!(extract_chat_content(&json!(42)).is_err());
    }

    #[tokio::test]
    async fn test_prompt_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  {\"operations\":[]}  "}}]}"#)
            .create_async()
            .await;

        let answer = client(&server.url()).prompt("hello").await.unwrap();
        assert_eq!(answer, r#"{"operations":[]}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_prompt_unauthorized_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid key")
            .create_async()
            .await;

        let err = client(&server.url()).prompt("hello").await.unwrap_err();
        assert!(matches!(err, TransportError::Auth(ref msg) if msg.contains("invalid key")));
    }

    #[tokio::test]
    async fn test_prompt_server_error_carries_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        match client(&server.url()).prompt("hello").await.unwrap_err() {
            TransportError::Http { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_prompt_empty_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"   "}}]}"#)
            .create_async()
            .await;

        let err = client(&server.url()).prompt("hello").await.unwrap_err();
        assert!(matches!(err, TransportError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_prompt_no_choices() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = client(&server.url()).prompt("hello").await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_detect_gateway_models() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/models")
            .match_header("authorization", "Bearer gw-key")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"openai/gpt-4o-mini"},{"id":" "},{"id":"google/gemini-2.0-flash"}]}"#)
            .create_async()
            .await;

        let models = detect_gateway_models("gw-key", &server.url()).await.unwrap();
        assert_eq!(models, vec!["openai/gpt-4o-mini", "google/gemini-2.0-flash"]);
    }
}
