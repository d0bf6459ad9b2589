// Command handling - dispatch for every aifiler subcommand

use std::path::PathBuf;
use std::sync::Arc;

use clap::CommandFactory;
use tokio_util::sync::CancellationToken;

use super::args::{join_words, Cli, Command};
use super::output::Output;
use crate::config::{normalize_provider, ConfigStore, NO_PROVIDER};
use crate::models::{ModelRegistry, REGISTRY_PATH_ENV_VAR};
use crate::planning::{ApprovalController, ConversationDriver, PromptMode};
use crate::providers::factory::{gateway_api_key, gateway_base_url};
use crate::providers::{create_client, detect_gateway_models, detect_ollama_models, ClientOverrides};

/// Everything a command needs from the process environment
pub struct App {
    output: Arc<dyn Output>,
    store: ConfigStore,
    working_dir: PathBuf,
    cancel: CancellationToken,
}

impl App {
    pub fn new(output: Arc<dyn Output>, store: ConfigStore, working_dir: PathBuf) -> Self {
        Self {
            output,
            store,
            working_dir,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel in-flight model calls when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Dispatch parsed arguments. Returns the process exit code.
    pub async fn run(&self, cli: Cli) -> i32 {
        let overrides = ClientOverrides {
            provider: cli.provider,
            model: cli.model,
        };

        match cli.command {
            Some(Command::Create { prompt }) => {
                self.run_prompt(PromptMode::Create, &join_words(&prompt), &overrides)
                    .await
            }
            Some(Command::Rename { prompt }) => {
                self.run_prompt(PromptMode::Rename, &join_words(&prompt), &overrides)
                    .await
            }
            Some(Command::List) => self.run_list().await,
            Some(Command::Set { provider, api_key }) => self.run_set(&provider, &api_key),
            Some(Command::Default { model }) => self.run_default(&join_words(&model)),
            Some(Command::Reset { provider, api_key }) => self.run_reset(&provider, &api_key),
            Some(Command::Doctor) => self.run_doctor(),
            None if cli.prompt.is_empty() => {
                if let Err(e) = Cli::command().print_help() {
                    tracing::warn!("Failed to print help: {}", e);
                }
                0
            }
            None => {
                self.run_prompt(PromptMode::Dynamic, &join_words(&cli.prompt), &overrides)
                    .await
            }
        }
    }

    /// Start a conversation in `mode`.
    pub async fn run_prompt(
        &self,
        mode: PromptMode,
        prompt: &str,
        overrides: &ClientOverrides,
    ) -> i32 {
        if prompt.is_empty() {
            self.output
                .error(&format!("Usage: aifiler {} \"<prompt>\"", mode.as_str()));
            return 2;
        }

        let config = self.store.load_or_default();
        let registry = match ModelRegistry::load_default() {
            Ok((registry, _)) => registry,
            Err(e) => {
                self.output
                    .error(&format!("failed to load model registry: {:#}", e));
                return 1;
            }
        };

        let client = match create_client(&config, &registry, overrides) {
            Ok(client) => client,
            Err(e) => {
                self.output
                    .error(&format!("failed to initialize model client: {:#}", e));
                return 1;
            }
        };

        let approvals = ApprovalController::stdin(Arc::clone(&self.output));
        let mut driver = ConversationDriver::new(
            client,
            Arc::clone(&self.output),
            approvals,
            self.working_dir.clone(),
            mode,
        )
        .with_cancellation(self.cancel.clone());

        driver.run(prompt).await
    }

    pub async fn run_list(&self) -> i32 {
        let registry = match ModelRegistry::load_default() {
            Ok((registry, _)) => registry,
            Err(e) => {
                self.output
                    .error(&format!("failed to load model registry: {:#}", e));
                return 1;
            }
        };
        let config = self.store.load_or_default();

        self.output.header("Available providers and models");
        self.output.line("Curated model registry");
        for line in registry.render_lines() {
            self.output.line(&line);
        }

        self.output.line("");
        self.output.header("Configured API keys");
        let mut providers: Vec<String> = registry
            .provider_names()
            .chain(config.api_keys.keys().map(String::as_str))
            .map(normalize_provider)
            .filter(|p| !p.is_empty() && p != NO_PROVIDER)
            .collect();
        providers.sort();
        providers.dedup();

        if providers.is_empty() {
            self.output.line("- none");
        }
        for provider in &providers {
            let status = if config.api_key(provider).is_some() {
                "set"
            } else {
                "not-set"
            };
            self.output.line(&format!("- {}: {}", provider, status));
        }

        self.output.line("");
        self.output
            .line(&format!("default_provider: {}", config.default_provider));
        self.output
            .line(&format!("default_model: {}", config.default_model));

        // Detection is best effort; failures only show up in the log
        match detect_ollama_models().await {
            Ok(models) if !models.is_empty() => {
                self.print_model_block("Detected local Ollama models", &models)
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Ollama detection skipped: {}", e),
        }

        if let Some(api_key) = gateway_api_key(&config) {
            match detect_gateway_models(&api_key, &gateway_base_url()).await {
                Ok(models) if !models.is_empty() => {
                    self.print_model_block("Detected Vercel AI Gateway models", &models)
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Gateway model detection skipped: {}", e),
            }
        }

        0
    }

    fn print_model_block(&self, title: &str, models: &[String]) {
        self.output.line("");
        self.output.header(title);
        for model in models {
            self.output.line(&format!("  - {}", model));
        }
    }

    pub fn run_set(&self, provider: &str, api_key: &str) -> i32 {
        let provider = normalize_provider(provider);
        let api_key = api_key.trim();
        if provider.is_empty() || api_key.is_empty() {
            self.output.error("provider and api key cannot be empty");
            return 2;
        }

        let mut config = self.store.load_or_default();
        config.set_api_key(&provider, api_key);

        match self.store.save(&config) {
            Ok(path) => {
                self.output.success(&format!(
                    "Saved API key for provider '{}' in {}",
                    provider,
                    path.display()
                ));
                0
            }
            Err(e) => {
                self.output.error(&format!("failed to save config: {:#}", e));
                1
            }
        }
    }

    pub fn run_default(&self, model: &str) -> i32 {
        let model = model.trim();
        if model.is_empty() {
            self.output.error("model cannot be empty");
            return 2;
        }

        let mut config = self.store.load_or_default();
        config.default_model = model.to_string();

        match self.store.save(&config) {
            Ok(path) => {
                self.output.success(&format!(
                    "Default model set to '{}' in {}",
                    model,
                    path.display()
                ));
                0
            }
            Err(e) => {
                self.output.error(&format!("failed to save config: {:#}", e));
                1
            }
        }
    }

    pub fn run_reset(&self, provider: &str, api_key: &str) -> i32 {
        let provider = normalize_provider(provider);
        let api_key = api_key.trim();
        if provider.is_empty() || api_key.is_empty() {
            self.output.error("provider and api key cannot be empty");
            return 2;
        }

        let mut config = self.store.load_or_default();
        let Some(current) = config.api_key(&provider) else {
            self.output
                .warn(&format!("No API key found for provider '{}'", provider));
            return 0;
        };
        if api_key != "*" && api_key != current {
            self.output.error(&format!(
                "Provided api key does not match the stored key for provider '{}'",
                provider
            ));
            return 1;
        }

        config.clear_api_key(&provider);
        match self.store.save(&config) {
            Ok(path) => {
                self.output.success(&format!(
                    "API key reset for provider '{}' in {}",
                    provider,
                    path.display()
                ));
                0
            }
            Err(e) => {
                self.output.error(&format!("failed to save config: {:#}", e));
                1
            }
        }
    }

    pub fn run_doctor(&self) -> i32 {
        self.output.header("aifiler diagnostics");
        self.output
            .line(&format!("cwd: {}", self.working_dir.display()));
        if let Ok(exe) = std::env::current_exe() {
            self.output.line(&format!("executable: {}", exe.display()));
        }

        match std::env::var(REGISTRY_PATH_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => self
                .output
                .line(&format!("{}: {}", REGISTRY_PATH_ENV_VAR, value.trim())),
            _ => self
                .output
                .line(&format!("{}: (not set)", REGISTRY_PATH_ENV_VAR)),
        }
        self.output
            .line(&format!("config: {}", self.store.path().display()));

        match ModelRegistry::load_default() {
            Ok((_, source)) => {
                self.output.success(&format!("registry: {}", source));
                0
            }
            Err(e) => {
                self.output
                    .error(&format!("registry: unresolved ({:#})", e));
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{BufferedOutput, MessageKind};
    use crate::config::Config;
    use tempfile::TempDir;

    fn app() -> (App, BufferedOutput, ConfigStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let out = BufferedOutput::new();
        let store = ConfigStore::new(dir.path().join("aifiler/config.toml"));
        let app = App::new(Arc::new(out.clone()), store.clone(), dir.path().to_path_buf());
        (app, out, store, dir)
    }

    #[test]
    fn test_set_saves_key_and_default_provider() {
        let (app, out, store, _dir) = app();
        assert_eq!(app.run_set(" Vercel ", "gw-key"), 0);

        let config = store.load().unwrap();
        assert_eq!(config.api_key("vercel"), Some("gw-key"));
        assert_eq!(config.default_provider, "vercel");
        assert!(out.contains("Saved API key for provider 'vercel'"));
    }

    #[test]
    fn test_set_rejects_blank_values() {
        let (app, out, _store, _dir) = app();
        assert_eq!(app.run_set("vercel", "  "), 2);
        assert_eq!(
            out.lines_of(MessageKind::Error),
            vec!["provider and api key cannot be empty"]
        );
    }

    #[test]
    fn test_default_sets_model() {
        let (app, _out, store, _dir) = app();
        assert_eq!(app.run_default("openai/gpt-4o-mini"), 0);
        assert_eq!(store.load().unwrap().default_model, "openai/gpt-4o-mini");
        assert_eq!(app.run_default(" "), 2);
    }

    #[test]
    fn test_reset_requires_matching_key() {
        let (app, out, store, _dir) = app();
        app.run_set("openai", "sk-1");

        assert_eq!(app.run_reset("openai", "wrong"), 1);
        assert_eq!(store.load().unwrap().api_key("openai"), Some("sk-1"));

        assert_eq!(app.run_reset("openai", "sk-1"), 0);
        let config = store.load().unwrap();
        assert!(config.api_key("openai").is_none());
        assert_eq!(config.default_provider, "none");
        assert!(out.contains("API key reset for provider 'openai'"));
    }

    #[test]
    fn test_reset_wildcard_and_missing_key() {
        let (app, out, store, _dir) = app();
        assert_eq!(app.run_reset("vercel", "*"), 0);
        assert!(out.contains("No API key found for provider 'vercel'"));

        let mut config = Config::default();
        config.set_api_key("vercel", "k");
        config.default_provider = "openai".to_string();
        store.save(&config).unwrap();

        assert_eq!(app.run_reset("vercel", "*"), 0);
        let config = store.load().unwrap();
        assert!(config.api_key("vercel").is_none());
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn test_doctor_reports_paths() {
        let (app, out, store, dir) = app();
        assert_eq!(app.run_doctor(), 0);
        assert!(out.contains(&format!("cwd: {}", dir.path().display())));
        assert!(out.contains(&format!("config: {}", store.path().display())));
        assert_eq!(out.lines_of(MessageKind::Success).len(), 1);
    }

    #[tokio::test]
    async fn test_list_shows_key_status() {
        let (app, out, _store, _dir) = app();
        app.run_set("openai", "sk-1");
        assert_eq!(app.run_list().await, 0);

        assert!(out.contains("- openai: set"));
        assert!(out.contains("- anthropic: not-set"));
        assert!(out.contains("default_provider: openai"));
        assert!(!out.lines().iter().any(|l| l == "- none: not-set"));
    }

    #[tokio::test]
    async fn test_prompt_without_provider_fails_to_initialize() {
        let (app, out, _store, _dir) = app();
        let code = app
            .run_prompt(PromptMode::Create, "add a readme", &ClientOverrides::default())
            .await;
        assert_eq!(code, 1);
        assert!(out.contains("failed to initialize model client"));
    }
}
