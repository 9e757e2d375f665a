//! Run-scoped context passed to every adapter call.

use std::fmt;

use rollcall_core::Secret;

use crate::error::DirectoryError;

/// Identity-provider OAuth2 access token.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Secret);

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Secret::new(value))
    }

    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Immutable per-run state shared by all adapters.
///
/// Refreshing the token produces a new context; existing copies keep the
/// token they were created with.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    token: Option<BearerToken>,
    generation: u32,
}

impl RunContext {
    /// A context without a token (tests, roster-only modes).
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(&self, token: BearerToken) -> RunContext {
        RunContext {
            token: Some(token),
            generation: self.generation.saturating_add(1),
        }
    }

    /// Number of tokens issued so far in this run.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn bearer(&self) -> Result<&str, DirectoryError> {
        self.token
            .as_ref()
            .map(BearerToken::expose)
            .ok_or_else(|| DirectoryError::Auth("no bearer token acquired for this run".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_returns_new_context() {
        let first = RunContext::anonymous().with_token(BearerToken::new("t1"));
        let second = first.with_token(BearerToken::new("t2"));
        assert_eq!(first.bearer().unwrap(), "t1");
        assert_eq!(second.bearer().unwrap(), "t2");
        assert_eq!(second.generation(), 2);
    }

    #[test]
    fn anonymous_context_has_no_bearer() {
        assert!(matches!(
            RunContext::anonymous().bearer(),
            Err(DirectoryError::Auth(_))
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let ctx = RunContext::anonymous().with_token(BearerToken::new("very-secret"));
        assert!(!format!("{ctx:?}").contains("very-secret"));
    }
}
