//! # rollcall-directory
//!
//! Blocking REST adapters for every downstream directory, plus the roster
//! feed client.
//!
//! Each adapter implements [`DirectoryAdapter`] (lookup / create / update /
//! delete by the person's email key) and one capability trait:
//! [`GroupDirectory`] for the identity provider, [`AppDirectory`] for
//! business-app user stores, [`ContentShare`] for the content-sharing system.
//! Idempotent conflicts (already exists, already shared, already removed) are
//! mapped to `Ok` inside the adapters.

pub mod adapter;
pub mod app;
pub mod context;
pub mod error;
pub mod http;
pub mod idp;
pub mod retry;
pub mod roster;
pub mod share;

pub use adapter::{AppDirectory, ContentShare, CreateOutcome, DirectoryAdapter, GroupDirectory};
pub use app::BusinessAppAdapter;
pub use context::{BearerToken, RunContext};
pub use error::DirectoryError;
pub use http::HttpClient;
pub use idp::{GroupSelection, IdentityProviderAdapter};
pub use retry::RetryPolicy;
pub use roster::{HttpRosterSource, RosterSource};
pub use share::ContentShareAdapter;
