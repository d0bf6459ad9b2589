// Diagnostic logging
//
// Tracing goes to stderr so it never mixes with the preview and prompts on
// stdout. Verbosity comes from AIFILER_LOG (EnvFilter syntax, default "warn").

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV_VAR: &str = "AIFILER_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Filter from `AIFILER_LOG`, falling back to `warn` when unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
