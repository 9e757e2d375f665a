//! Capability traits implemented by each downstream system.

use rollcall_core::{Person, RecordHandle};

use crate::context::{BearerToken, RunContext};
use crate::error::DirectoryError;

/// Result of a create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(RecordHandle),
    /// The system reported a conflict; the handle is present when the
    /// response carried one.
    AlreadyPresent(Option<RecordHandle>),
}

impl CreateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// Uniform record operations keyed by the person's email.
pub trait DirectoryAdapter {
    /// Label used in logs and errors.
    fn system(&self) -> &str;

    /// `Ok(None)` when nothing matches.
    fn find_by_key(&self, ctx: &RunContext, key: &str) -> Result<Option<RecordHandle>, DirectoryError>;

    fn create(&self, ctx: &RunContext, person: &Person) -> Result<CreateOutcome, DirectoryError>;

    fn update(&self, ctx: &RunContext, handle: &RecordHandle, person: &Person) -> Result<(), DirectoryError>;

    /// Removing an absent record succeeds.
    fn delete(&self, ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError>;
}

/// The identity provider: groups and token issuance.
pub trait GroupDirectory: DirectoryAdapter {
    fn acquire_token(&self) -> Result<BearerToken, DirectoryError>;

    fn add_to_group(&self, ctx: &RunContext, handle: &RecordHandle, group: &str) -> Result<(), DirectoryError>;

    fn remove_from_group(&self, ctx: &RunContext, handle: &RecordHandle, group: &str) -> Result<(), DirectoryError>;
}

/// A business-application user store.
pub trait AppDirectory: DirectoryAdapter {
    /// Every provisioned email, across all pages.
    fn list_keys(&self, ctx: &RunContext) -> Result<Vec<String>, DirectoryError>;
}

/// The content-sharing system.
pub trait ContentShare {
    fn system(&self) -> &str;

    /// Membership tag that opts a person in.
    fn tag(&self) -> &str;

    /// One-time administrative profile sync; must precede grants and revokes.
    fn sync_profiles(&self, ctx: &RunContext) -> Result<(), DirectoryError>;

    fn find_by_key(&self, ctx: &RunContext, email: &str) -> Result<Option<RecordHandle>, DirectoryError>;

    /// Already shared counts as success.
    fn grant(&self, ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError>;

    /// Not shared counts as success.
    fn revoke(&self, ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError>;
}
