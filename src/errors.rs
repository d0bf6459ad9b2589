// Error types for the plan engine
//
// Sandbox and parse errors change control flow locally, operation errors are
// collected per operation, transport errors end the current turn.

use thiserror::Error;

/// A plan path that cannot be used safely.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("empty path")]
    EmptyPath,

    /// Carries the offending input for logging
    #[error("path escapes current directory")]
    PathEscape(String),
}

/// Model output that could not be decoded into a plan.
#[derive(Debug, Error)]
#[error("could not decode plan: {source}")]
pub struct PlanParseError {
    #[from]
    source: serde_json::Error,
}

/// Failure talking to a model provider.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{provider} request failed with status {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected response format: {0}")]
    Decode(String),

    #[error("{0} returned an empty response")]
    EmptyResponse(String),

    #[error("request cancelled")]
    Cancelled,
}

/// Failure of a single plan operation. Never aborts the rest of the plan.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid {role} path '{path}': {source}")]
    InvalidPath {
        role: &'static str,
        path: String,
        #[source]
        source: SandboxError,
    },

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("source missing: {0}")]
    SourceMissing(String),

    #[error("target exists: {0}")]
    TargetExists(String),

    #[error("command failed: {command} ({status})")]
    CommandFailed { command: String, status: String },

    #[error("command failed to start: {command} ({source})")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl OperationError {
    pub(crate) fn io(action: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
