// Curated model registry
//
// A small TOML file listing, per provider, the default model and a few known
// good ones. Looked up on disk first so it can be edited without rebuilding;
// the copy compiled into the binary is the last resort.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::normalize_provider;

/// Environment variable pointing at a registry file
pub const REGISTRY_PATH_ENV_VAR: &str = "AIFILER_MODEL_REGISTRY";

/// Registry location relative to the working directory or executable
pub const DEFAULT_REGISTRY_PATH: &str = "assets/models/registry.toml";

const BUILTIN_REGISTRY: &str = include_str!("../../assets/models/registry.toml");

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderModels {
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModelRegistry {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderModels>,
}

/// Where a loaded registry came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    File(PathBuf),
    BuiltIn,
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrySource::File(path) => write!(f, "{}", path.display()),
            RegistrySource::BuiltIn => write!(f, "(built-in)"),
        }
    }
}

impl ModelRegistry {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: ModelRegistry = toml::from_str(contents).context("Failed to parse model registry")?;
        // Provider keys are matched case-insensitively
        let providers = raw
            .providers
            .into_iter()
            .map(|(name, entry)| (normalize_provider(&name), entry))
            .collect();
        Ok(Self { providers })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model registry {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid model registry {}", path.display()))
    }

    /// The registry compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_REGISTRY)
    }

    /// Load from the first registry file found, else the built-in copy.
    pub fn load_default() -> Result<(Self, RegistrySource)> {
        match resolve_registry_path() {
            Some(path) => {
                tracing::debug!("Loading model registry from {:?}", path);
                let registry = Self::load(&path)?;
                Ok((registry, RegistrySource::File(path)))
            }
            None => {
                tracing::debug!("No registry file found, using built-in registry");
                Ok((Self::builtin()?, RegistrySource::BuiltIn))
            }
        }
    }

    /// Default model for `provider`, `None` when unknown or blank.
    pub fn default_model_for(&self, provider: &str) -> Option<&str> {
        self.providers
            .get(&normalize_provider(provider))
            .map(|p| p.default.trim())
            .filter(|m| !m.is_empty())
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Human-readable listing, providers in name order.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (name, entry) in &self.providers {
            lines.push(String::new());
            lines.push(name.to_uppercase());
            lines.push(format!("  default: {}", entry.default));
            for model in &entry.models {
                lines.push(format!("  - {}", model));
            }
        }
        lines
    }
}

/// Find a registry file: `$AIFILER_MODEL_REGISTRY`, then the working
/// directory, then next to (or one level above) the executable.
pub fn resolve_registry_path() -> Option<PathBuf> {
    if let Ok(configured) = std::env::var(REGISTRY_PATH_ENV_VAR) {
        let configured = PathBuf::from(configured.trim());
        if !configured.as_os_str().is_empty() && configured.is_file() {
            return Some(configured);
        }
    }

    let cwd = std::env::current_dir().ok();
    let exe = std::env::current_exe().ok();
    registry_candidates(cwd.as_deref(), exe.as_deref())
        .into_iter()
        .find(|candidate| candidate.is_file())
}

/// Candidate locations in lookup order.
pub fn registry_candidates(cwd: Option<&Path>, exe: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(cwd) = cwd {
        candidates.push(cwd.join(DEFAULT_REGISTRY_PATH));
    }
    if let Some(exe_dir) = exe.and_then(Path::parent) {
        candidates.push(exe_dir.join(DEFAULT_REGISTRY_PATH));
        if let Some(parent) = exe_dir.parent() {
            candidates.push(parent.join(DEFAULT_REGISTRY_PATH));
        }
    }
    candidates
}
