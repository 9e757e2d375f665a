//! # rollcall-sync
//!
//! Roster reconciliation across the identity provider, business apps and
//! the content share.
//!
//! Call [`pipeline::run`] with a resolved [`rollcall_core::Config`] for a full
//! run, or drive a [`ReconciliationEngine`] directly with your own adapters.

pub mod diff;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod tally;

pub use diff::{Confirm, DiffReconciler};
pub use engine::{Directories, EngineSettings, ReconciliationEngine};
pub use error::{Step, StepError, SyncError};
pub use pipeline::{fetch_roster, load_roster, run, Mode};
pub use tally::{PersonFailure, Phase, RunReport, RunTally};
