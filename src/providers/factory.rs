// Provider factory
//
// Resolves which provider and model to use, then builds the client.

use anyhow::{bail, Result};

use super::ollama::OllamaClient;
use super::openai::{
    OpenAiCompatClient, GATEWAY_API_KEY_ENV_VAR, GATEWAY_BASE_URL, GATEWAY_BASE_URL_ENV_VAR,
    OPENAI_API_KEY_ENV_VAR,
};
use super::LlmClient;
use crate::config::{normalize_provider, Config, NO_PROVIDER};
use crate::models::ModelRegistry;

/// Hard fallbacks when neither config nor registry name a model
const VERCEL_FALLBACK_MODEL: &str = "openai/gpt-4o-mini";
const OPENAI_FALLBACK_MODEL: &str = "gpt-4o-mini";
const OLLAMA_FALLBACK_MODEL: &str = "llama3.2";

/// Command-line overrides for the configured selection
#[derive(Debug, Clone, Default)]
pub struct ClientOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
}

/// Resolved provider/model pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub provider: String,
    /// Empty when nothing names a model; the client applies its fallback
    pub model: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Override, then config, then `none` for the provider; override, then
/// config, then the registry default for the model.
pub fn resolve_selection(
    config: &Config,
    registry: &ModelRegistry,
    overrides: &ClientOverrides,
) -> Selection {
    let provider = non_blank(overrides.provider.as_deref())
        .or_else(|| non_blank(Some(config.default_provider.as_str())))
        .map(normalize_provider)
        .unwrap_or_else(|| NO_PROVIDER.to_string());

    let model = non_blank(overrides.model.as_deref())
        .or_else(|| non_blank(Some(config.default_model.as_str())))
        .or_else(|| registry.default_model_for(&provider))
        .unwrap_or_default()
        .to_string();

    Selection { provider, model }
}

/// Gateway key from config, else `$AI_GATEWAY_API_KEY`.
pub fn gateway_api_key(config: &Config) -> Option<String> {
    config
        .api_key("vercel")
        .map(str::to_string)
        .or_else(|| env_value(GATEWAY_API_KEY_ENV_VAR))
}

/// `$AI_GATEWAY_BASE_URL`, else the public gateway.
pub fn gateway_base_url() -> String {
    env_value(GATEWAY_BASE_URL_ENV_VAR).unwrap_or_else(|| GATEWAY_BASE_URL.to_string())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or_fallback(model: String, fallback: &str) -> String {
    if model.is_empty() {
        fallback.to_string()
    } else {
        model
    }
}

/// Build the client for the resolved selection.
pub fn create_client(
    config: &Config,
    registry: &ModelRegistry,
    overrides: &ClientOverrides,
) -> Result<Box<dyn LlmClient>> {
    let Selection { provider, model } = resolve_selection(config, registry, overrides);
    tracing::info!("Using provider={} model={}", provider, model);

    match provider.as_str() {
        NO_PROVIDER => bail!(
            "no model provider configured (use: aifiler set \"vercel\" \"<api-key>\", or pass --provider)"
        ),

        "vercel" => {
            let Some(api_key) = gateway_api_key(config) else {
                bail!(
                    "missing API key for provider 'vercel' (use: aifiler set \"vercel\" \"<api-key>\" or set {})",
                    GATEWAY_API_KEY_ENV_VAR
                );
            };
            let client = OpenAiCompatClient::new_vercel(
                api_key,
                Some(gateway_base_url()),
                or_fallback(model, VERCEL_FALLBACK_MODEL),
            )?;
            Ok(Box::new(client))
        }

        "openai" => {
            let api_key = config
                .api_key("openai")
                .map(str::to_string)
                .or_else(|| env_value(OPENAI_API_KEY_ENV_VAR));
            let Some(api_key) = api_key else {
                bail!(
                    "missing API key for provider 'openai' (use: aifiler set \"openai\" \"<api-key>\" or set {})",
                    OPENAI_API_KEY_ENV_VAR
                );
            };
            let client =
                OpenAiCompatClient::new_openai(api_key, or_fallback(model, OPENAI_FALLBACK_MODEL))?;
            Ok(Box::new(client))
        }

        "ollama" => Ok(Box::new(OllamaClient::new(or_fallback(
            model,
            OLLAMA_FALLBACK_MODEL,
        ))?)),

        other => bail!(
            "unsupported provider '{}' (supported: vercel, openai, ollama; use: aifiler set \"<provider>\" \"<api-key>\")",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::builtin().unwrap()
    }

    #[test]
    fn test_selection_defaults_to_none() {
        let selection = resolve_selection(&Config::default(), &registry(), &ClientOverrides::default());
        assert_eq!(selection.provider, "none");
        assert_eq!(selection.model, "");
    }

    #[test]
    fn test_selection_uses_registry_default_model() {
        let mut config = Config::default();
        config.default_provider = "Ollama".to_string();
        let selection = resolve_selection(&config, &registry(), &ClientOverrides::default());
        assert_eq!(selection.provider, "ollama");
        assert_eq!(selection.model, "llama3.2");
    }

    #[test]
    fn test_selection_override_wins() {
        let mut config = Config::default();
        config.default_provider = "vercel".to_string();
        config.default_model = "openai/gpt-4o".to_string();
        let overrides = ClientOverrides {
            provider: Some("ollama".to_string()),
            model: Some("mistral".to_string()),
        };
        let selection = resolve_selection(&config, &registry(), &overrides);
        assert_eq!(
            selection,
            Selection {
                provider: "ollama".to_string(),
                model: "mistral".to_string()
            }
        );
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let mut config = Config::default();
        config.default_provider = "openai".to_string();
        let overrides = ClientOverrides {
            provider: Some("  ".to_string()),
            model: None,
        };
        let selection = resolve_selection(&config, &registry(), &overrides);
        assert_eq!(selection.provider, "openai");
        assert_eq!(selection.model, "gpt-4o-mini");
    }

    #[test]
    fn test_none_provider_is_an_error() {
        let err = create_client(&Config::default(), &registry(), &ClientOverrides::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("aifiler set"));
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let overrides = ClientOverrides {
            provider: Some("acme".to_string()),
            model: None,
        };
        let err = create_client(&Config::default(), &registry(), &overrides)
            .err()
            .unwrap();
        assert!(err.to_string().contains("unsupported provider 'acme'"));
    }

    #[test]
    fn test_configured_vercel_client() {
        let mut config = Config::default();
        config.set_api_key("vercel", "gw-key");
        let client = create_client(&config, &registry(), &ClientOverrides::default()).unwrap();
        assert_eq!(client.name(), "vercel");
        assert_eq!(client.model(), "openai/gpt-4o-mini");
    }

    #[test]
    fn test_ollama_client_needs_no_key() {
        let overrides = ClientOverrides {
            provider: Some("ollama".to_string()),
            model: None,
        };
        let client = create_client(&Config::default(), &registry(), &overrides).unwrap();
        assert_eq!(client.name(), "ollama");
        assert_eq!(client.model(), "llama3.2");
    }
}
