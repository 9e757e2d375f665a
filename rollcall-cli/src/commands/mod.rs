pub mod config;
pub mod confirm;
pub mod list;
pub mod run;

/// How a command finished when it did not error outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// A whole phase was skipped (content-share sync failure).
    PhaseFailed,
}
