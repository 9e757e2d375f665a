//! Error types for rollcall-sync.

use std::fmt;

use thiserror::Error;

use rollcall_directory::DirectoryError;

/// One step of a person's reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    IdentityProvider,
    Groups,
    App,
    ContentShare,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::IdentityProvider => "identity provider",
            Step::Groups => "group assignment",
            Step::App => "business app",
            Step::ContentShare => "content share",
        };
        f.write_str(s)
    }
}

/// A failed step for one person. Recorded in the tally; the run continues.
#[derive(Debug, Error)]
#[error("{step} step failed for {person} in {system}: {source}")]
pub struct StepError {
    pub step: Step,
    pub system: String,
    pub person: String,
    #[source]
    pub source: DirectoryError,
}

impl StepError {
    pub fn new(step: Step, system: &str, person: &str, source: DirectoryError) -> Self {
        Self {
            step,
            system: system.to_string(),
            person: person.to_string(),
            source,
        }
    }
}

/// Errors that abort a run (or its setup).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Roster fetch, token acquisition or a required listing failed.
    #[error("{stage} failed: {source}")]
    Fatal {
        stage: String,
        #[source]
        source: DirectoryError,
    },

    /// An adapter could not be built from configuration.
    #[error("cannot configure {system}: {source}")]
    Adapter {
        system: String,
        #[source]
        source: DirectoryError,
    },

    /// A clean-mode exclusion pattern is not a valid regex.
    #[error("invalid exclude pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The configuration cannot drive the requested mode.
    #[error("{0}")]
    Unsupported(String),
}

pub(crate) fn fatal(stage: &str, source: DirectoryError) -> SyncError {
    SyncError::Fatal {
        stage: stage.to_string(),
        source,
    }
}
