//! Rollcall core library: roster types, typed configuration, secret
//! resolution, errors.
//!
//! - [`types`]: [`Person`], [`Role`], [`RecordHandle`]
//! - [`normalize`]: manager reference → email conversion
//! - [`config`]: [`Config`] load / validate
//! - [`secret`]: [`Secret`] fields and the [`SecretResolver`] seam
//! - [`error`]: [`CoreError`]

pub mod config;
pub mod error;
pub mod normalize;
pub mod secret;
pub mod types;

pub use config::Config;
pub use error::CoreError;
pub use normalize::convert_manager_reference_to_email;
pub use secret::{EnvSecretResolver, FileSecretResolver, Secret, SecretRef, SecretResolver};
pub use types::{Person, RecordHandle, Role};
