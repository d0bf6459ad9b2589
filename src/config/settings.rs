// Configuration structs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider value meaning "nothing configured yet"
pub const NO_PROVIDER: &str = "none";

/// Providers whose key slots exist from the start
const SEEDED_PROVIDERS: [&str; 3] = ["openai", "anthropic", "google"];

/// Persisted user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Provider used when `--provider` is not given
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Model used when `--model` is not given; empty means registry default
    #[serde(default)]
    pub default_model: String,

    /// API keys by lower-case provider name. Empty string means unset.
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,
}

fn default_provider() -> String {
    NO_PROVIDER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            default_model: String::new(),
            api_keys: SEEDED_PROVIDERS
                .iter()
                .map(|p| (p.to_string(), String::new()))
                .collect(),
        }
    }
}

impl Config {
    /// Trimmed key for `provider`, `None` when missing or blank.
    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.api_keys
            .get(&normalize_provider(provider))
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
    }

    /// Store a key. Also adopts `provider` as the default when none is set.
    pub fn set_api_key(&mut self, provider: &str, api_key: &str) {
        let provider = normalize_provider(provider);
        self.api_keys
            .insert(provider.clone(), api_key.trim().to_string());
        if !self.has_default_provider() {
            self.default_provider = provider;
        }
    }

    /// Blank the key and drop the default provider if it was this one.
    pub fn clear_api_key(&mut self, provider: &str) {
        let provider = normalize_provider(provider);
        self.api_keys.insert(provider.clone(), String::new());
        if self.default_provider == provider {
            self.default_provider = default_provider();
        }
    }

    pub fn has_default_provider(&self) -> bool {
        let current = self.default_provider.trim();
        !current.is_empty() && current != NO_PROVIDER
    }
}

/// Provider names are compared trimmed and lower-cased.
pub fn normalize_provider(provider: &str) -> String {
    provider.trim().to_lowercase()
}
