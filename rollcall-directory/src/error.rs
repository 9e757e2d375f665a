//! Error types for rollcall-directory.

use thiserror::Error;

use rollcall_render::RenderError;

/// Everything a single downstream call can fail with.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No HTTP response at all (DNS, connect, TLS, timeout).
    #[error("{operation}: transport error: {message}")]
    Transport { operation: String, message: String },

    /// The system answered with a status the operation does not accept.
    #[error("{operation}: HTTP {status}: detail -> {detail}")]
    Request {
        operation: String,
        status: u16,
        detail: String,
    },

    /// An existence query failed (as opposed to finding nothing).
    #[error("lookup of '{key}' in {system} failed: {source}")]
    Lookup {
        system: String,
        key: String,
        #[source]
        source: Box<DirectoryError>,
    },

    /// A group name resolved to zero groups.
    #[error("group '{group}' not found in {system}")]
    GroupNotFound { system: String, group: String },

    /// The person has no record where one is required.
    #[error("'{key}' not found in {system}: {detail}")]
    NotFound {
        system: String,
        key: String,
        detail: String,
    },

    /// Token acquisition failed or no token is available.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The response body did not have the expected shape.
    #[error("{operation}: unexpected response: {message}")]
    Decode { operation: String, message: String },

    /// A payload template failed to render.
    #[error("payload render failed: {0}")]
    Render(#[from] RenderError),

    /// A retried operation kept failing transiently.
    #[error("{operation} failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        last: Box<DirectoryError>,
    },
}

impl DirectoryError {
    /// Network failures, throttling and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            DirectoryError::Transport { .. } => true,
            DirectoryError::Request { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }

    pub(crate) fn lookup(system: &str, key: &str, source: DirectoryError) -> Self {
        DirectoryError::Lookup {
            system: system.to_string(),
            key: key.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn decode(operation: &str, message: impl Into<String>) -> Self {
        DirectoryError::Decode {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}
