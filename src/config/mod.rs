// Configuration module
// Public interface for configuration loading

mod loader;
mod settings;

pub use loader::{ConfigStore, CONFIG_PATH_ENV_VAR};
pub use settings::{normalize_provider, Config, NO_PROVIDER};
