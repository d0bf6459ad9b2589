// Model registry - curated default models per provider

pub mod registry;

pub use registry::{
    resolve_registry_path, ModelRegistry, ProviderModels, RegistrySource, DEFAULT_REGISTRY_PATH,
    REGISTRY_PATH_ENV_VAR,
};
