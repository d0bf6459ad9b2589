// Configuration loader
// Reads and writes <config_dir>/aifiler/config.toml (or $AIFILER_CONFIG)

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::Config;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV_VAR: &str = "AIFILER_CONFIG";

/// Owns the location of the config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$AIFILER_CONFIG`, else the platform config directory.
    pub fn default_location() -> Result<Self> {
        if let Ok(configured) = std::env::var(CONFIG_PATH_ENV_VAR) {
            let configured = configured.trim();
            if !configured.is_empty() {
                return Ok(Self::new(configured));
            }
        }

        let base = dirs::config_dir().context("Could not determine config directory")?;
        Ok(Self::new(base.join("aifiler").join("config.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config. A missing file yields defaults; a malformed one is an error.
    pub fn load(&self) -> Result<Config> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {:?}, using defaults", self.path);
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file {}", self.path.display()))
            }
        };

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", self.path.display()))?;
        tracing::debug!("Loaded config from {:?}", self.path);
        Ok(config)
    }

    /// Load, warning and falling back to defaults on any error.
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{:#}; using default configuration", e);
                Config::default()
            }
        }
    }

    /// Write `config`, creating the parent directory. Returns the path written.
    pub fn save(&self, config: &Config) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.path, toml_string)
            .with_context(|| format!("Failed to write config file {}", self.path.display()))?;

        tracing::info!("Configuration saved to {:?}", self.path);
        Ok(self.path.clone())
    }
}
