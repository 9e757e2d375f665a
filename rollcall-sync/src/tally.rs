//! Per-phase result counters and the run report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Step, StepError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Identity provider plus business apps.
    Directories,
    ContentShare,
    /// Stray-account removal.
    Clean,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Directories => "identity provider and business apps",
            Phase::ContentShare => "content share",
            Phase::Clean => "stray account removal",
        };
        f.write_str(s)
    }
}

/// A person whose reconciliation stopped at a failing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonFailure {
    pub person: String,
    pub step: Step,
    pub system: String,
    pub message: String,
}

impl From<&StepError> for PersonFailure {
    fn from(err: &StepError) -> Self {
        Self {
            person: err.person.clone(),
            step: err.step,
            system: err.system.clone(),
            message: err.source.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunTally {
    pub phase: Phase,
    /// Persons picked up by this phase (skips and failures included).
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failures: Vec<PersonFailure>,
    /// The deadline stopped the phase before every person was processed.
    pub interrupted: bool,
}

impl RunTally {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            total: 0,
            succeeded: 0,
            skipped: 0,
            failures: Vec::new(),
            interrupted: false,
        }
    }

    pub fn record_success(&mut self) {
        self.total += 1;
        self.succeeded += 1;
    }

    pub fn record_skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    pub fn record_failure(&mut self, failure: PersonFailure) {
        self.total += 1;
        self.failures.push(failure);
    }

    pub fn record(&mut self, outcome: Result<(), StepError>) {
        match outcome {
            Ok(()) => self.record_success(),
            Err(err) => self.record_failure(PersonFailure::from(&err)),
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Successfully processed [{}/{}] users for {}",
            self.succeeded, self.total, self.phase
        )
    }
}

/// Everything a run produced, in phase order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tallies: Vec<RunTally>,
    /// Set when the one-time content-share sync failed and the phase was skipped.
    pub content_share_error: Option<String>,
}

impl RunReport {
    pub(crate) fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            tallies: Vec::new(),
            content_share_error: None,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn tally(&self, phase: Phase) -> Option<&RunTally> {
        self.tallies.iter().find(|t| t.phase == phase)
    }

    /// True when a whole phase was lost (non-zero exit).
    pub fn phase_failed(&self) -> bool {
        self.content_share_error.is_some()
    }

    pub fn failure_count(&self) -> usize {
        self.tallies.iter().map(|t| t.failures.len()).sum()
    }
}
