//! Secret-bearing config values and their resolvers.
//!
//! A [`Secret`] holds either a literal value or an indirection marker of the
//! form `[vault]FieldName:SecretIdentifier`. Markers are resolved once, at
//! load time, through a [`SecretResolver`].

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};

const MARKER_PREFIX: &str = "[vault]";

/// A parsed `[vault]FieldName:SecretIdentifier` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub field: String,
    pub identifier: String,
}

/// A config value that must never be logged.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value. Only call at the point of use (auth header, form body).
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_marker(&self) -> bool {
        self.0.trim_start().starts_with(MARKER_PREFIX)
    }

    /// Parse the marker, if this value is one.
    ///
    /// `field` names the config field for error reporting.
    pub fn reference(&self, field: &str) -> Result<Option<SecretRef>, CoreError> {
        let Some(rest) = self.0.trim().strip_prefix(MARKER_PREFIX) else {
            return Ok(None);
        };
        let malformed = || CoreError::MalformedSecret {
            field: field.to_string(),
        };
        let (name, identifier) = rest.split_once(':').ok_or_else(malformed)?;
        if name.trim().is_empty() || identifier.trim().is_empty() {
            return Err(malformed());
        }
        Ok(Some(SecretRef {
            field: name.trim().to_string(),
            identifier: identifier.trim().to_string(),
        }))
    }

    /// Resolve a marker through `resolver`; literal values pass through.
    pub fn resolve(&self, field: &str, resolver: &dyn SecretResolver) -> Result<Secret, CoreError> {
        match self.reference(field)? {
            Some(reference) => resolver.resolve(&reference).map(Secret),
            None => Ok(self.clone()),
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_marker() {
            write!(f, "Secret({})", self.0)
        } else {
            f.write_str("Secret(***)")
        }
    }
}

/// Fetches the value behind a secret marker.
pub trait SecretResolver {
    fn resolve(&self, reference: &SecretRef) -> Result<String, CoreError>;
}

// ---------------------------------------------------------------------------
// Environment resolver
// ---------------------------------------------------------------------------

/// Reads `<prefix><IDENTIFIER>` from the process environment.
///
/// The identifier is upper-cased and `-`/`.` become `_`, so
/// `[vault]IdcsClientSecret:idcs-client.secret` reads
/// `ROLLCALL_SECRET_IDCS_CLIENT_SECRET`.
#[derive(Debug, Clone)]
pub struct EnvSecretResolver {
    prefix: String,
}

impl EnvSecretResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_name(&self, identifier: &str) -> String {
        let suffix: String = identifier
            .chars()
            .map(|c| match c {
                '-' | '.' | '/' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{suffix}", self.prefix)
    }
}

impl Default for EnvSecretResolver {
    fn default() -> Self {
        Self::new("ROLLCALL_SECRET_")
    }
}

impl SecretResolver for EnvSecretResolver {
    fn resolve(&self, reference: &SecretRef) -> Result<String, CoreError> {
        let var = self.variable_name(&reference.identifier);
        std::env::var(&var).map_err(|err| CoreError::SecretUnavailable {
            field: reference.field.clone(),
            identifier: reference.identifier.clone(),
            reason: format!("{var}: {err}"),
        })
    }
}

// ---------------------------------------------------------------------------
// File resolver
// ---------------------------------------------------------------------------

/// Reads `<dir>/<SecretIdentifier>` (trimmed), e.g. a mounted secrets volume.
#[derive(Debug, Clone)]
pub struct FileSecretResolver {
    dir: PathBuf,
}

impl FileSecretResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SecretResolver for FileSecretResolver {
    fn resolve(&self, reference: &SecretRef) -> Result<String, CoreError> {
        if reference.identifier.contains("..") || reference.identifier.contains('/') {
            return Err(CoreError::SecretUnavailable {
                field: reference.field.clone(),
                identifier: reference.identifier.clone(),
                reason: "identifier must be a plain file name".to_string(),
            });
        }
        let path = self.dir.join(&reference.identifier);
        let value = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        Ok(value.trim().to_string())
    }
}
