//! Error types for rollcall-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading configuration or resolving secrets.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, with the path that was being read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// The config parsed but violates a structural rule.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// A field looked like a secret marker but could not be parsed.
    #[error("malformed secret marker in '{field}'; expected [vault]FieldName:SecretIdentifier")]
    MalformedSecret { field: String },

    /// The resolver could not produce a value for a secret marker.
    #[error("secret '{identifier}' for '{field}' unavailable: {reason}")]
    SecretUnavailable {
        field: String,
        identifier: String,
        reason: String,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
