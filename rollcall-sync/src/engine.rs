//! Reconciliation engine: drives every adapter for add, delete and clean runs.
//!
//! ## Per-person ordering
//!
//! 1. Identity provider (lookup, create, group assignment for new accounts).
//! 2. Each business app the person is tagged for.
//! 3. After every person finished 1-2: one content-share profile sync, then
//!    the grant or revoke for each person tagged for content sharing.
//!
//! The first failing step ends that person's reconciliation; nothing already
//! done is rolled back and the loop moves on.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use rollcall_core::config::Config;
use rollcall_core::{Person, Role};
use rollcall_directory::{
    AppDirectory, ContentShare, CreateOutcome, DirectoryError, GroupDirectory, GroupSelection,
    RunContext,
};

use crate::diff::{Confirm, DiffReconciler};
use crate::error::{fatal, Step, StepError, SyncError};
use crate::tally::{Phase, PersonFailure, RunReport, RunTally};

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// The downstream systems a run talks to.
pub struct Directories<'a> {
    pub idp: &'a dyn GroupDirectory,
    pub apps: Vec<&'a dyn AppDirectory>,
    pub share: Option<&'a dyn ContentShare>,
}

/// Run tunables, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub email_domain: String,
    pub manager_groups: GroupSelection,
    pub user_groups: GroupSelection,
    pub token_refresh_every: usize,
    pub protected_ids: Vec<String>,
    pub limit: Option<usize>,
    pub deadline: Option<Duration>,
    /// App whose listing drives clean mode; `None` means the first app.
    pub clean_app: Option<String>,
    pub exclude_patterns: Vec<String>,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        let idp = &config.identity_provider;
        Self {
            email_domain: config.organization.email_domain.clone(),
            manager_groups: GroupSelection::for_role(Role::Manager, idp),
            user_groups: GroupSelection::for_role(Role::IndividualContributor, idp),
            token_refresh_every: idp.token_refresh_every.max(1),
            protected_ids: config.run.protected_ids.clone(),
            limit: config.run.limit,
            deadline: config.run.deadline_secs.map(Duration::from_secs),
            clean_app: config.clean.app.clone(),
            exclude_patterns: config.clean.exclude_patterns.clone(),
        }
    }

    pub fn groups_for(&self, role: Role) -> &GroupSelection {
        match role {
            Role::Manager => &self.manager_groups,
            Role::IndividualContributor => &self.user_groups,
        }
    }

    pub fn is_protected(&self, id: &str) -> bool {
        self.protected_ids
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(id.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Provision,
    Deprovision,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ReconciliationEngine<'a> {
    dirs: Directories<'a>,
    settings: EngineSettings,
    ctx: RunContext,
    since_refresh: usize,
    started: Instant,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(dirs: Directories<'a>, settings: EngineSettings) -> Self {
        Self {
            dirs,
            settings,
            ctx: RunContext::anonymous(),
            since_refresh: 0,
            started: Instant::now(),
        }
    }

    /// The context currently handed to adapters.
    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn run_add(&mut self, people: &[Person]) -> Result<RunReport, SyncError> {
        self.run_directional(people, Direction::Provision)
    }

    pub fn run_delete(&mut self, people: &[Person]) -> Result<RunReport, SyncError> {
        self.run_directional(people, Direction::Deprovision)
    }

    fn begin(&mut self) -> Result<(), SyncError> {
        self.started = Instant::now();
        self.since_refresh = 0;
        self.refresh_token()
    }

    fn refresh_token(&mut self) -> Result<(), SyncError> {
        let token = self
            .dirs
            .idp
            .acquire_token()
            .map_err(|e| fatal("token acquisition", e))?;
        self.ctx = self.ctx.with_token(token);
        self.since_refresh = 0;
        debug!(generation = self.ctx.generation(), "bearer token acquired");
        Ok(())
    }

    /// Called before each person's identity-provider work.
    fn rotate_token_if_due(&mut self) -> Result<(), SyncError> {
        if self.since_refresh >= self.settings.token_refresh_every {
            info!(after = self.since_refresh, "refreshing bearer token");
            self.refresh_token()?;
        }
        Ok(())
    }

    fn deadline_passed(&self) -> bool {
        self.settings
            .deadline
            .is_some_and(|limit| self.started.elapsed() >= limit)
    }

    fn limit_reached(&self, attempted: usize) -> bool {
        self.settings.limit.is_some_and(|limit| attempted >= limit)
    }

    fn run_directional(&mut self, people: &[Person], direction: Direction) -> Result<RunReport, SyncError> {
        let mut report = RunReport::new(Utc::now());
        self.begin()?;

        let mut tally = RunTally::new(Phase::Directories);
        let mut attempted = 0;
        for person in people {
            if self.deadline_passed() {
                warn!("deadline reached; remaining persons not processed");
                tally.interrupted = true;
                break;
            }
            if self.limit_reached(attempted) {
                info!(limit = attempted, "run limit reached");
                break;
            }
            if self.settings.is_protected(person.key()) {
                info!(person = %person.key(), "protected account skipped");
                tally.record_skip();
                continue;
            }

            self.rotate_token_if_due()?;
            attempted += 1;
            self.since_refresh += 1;

            let person = person.with_manager_email(&self.settings.email_domain);
            let outcome = match direction {
                Direction::Provision => self.provision(&person),
                Direction::Deprovision => self.deprovision(&person),
            };
            log_outcome(&person, &outcome);
            tally.record(outcome);
        }
        let interrupted = tally.interrupted;
        report.tallies.push(tally);

        if interrupted {
            warn!("content share phase skipped after interruption");
        } else if let Some(share) = self.dirs.share {
            self.share_phase(share, people, direction, &mut report);
        }
        Ok(report.finish())
    }

    fn share_phase(
        &self,
        share: &dyn ContentShare,
        people: &[Person],
        direction: Direction,
        report: &mut RunReport,
    ) {
        let tagged: Vec<&Person> = people.iter().filter(|p| p.is_tagged(share.tag())).collect();
        if tagged.is_empty() {
            debug!("no persons tagged for content share");
            return;
        }

        if let Err(message) = self.sync_share(share) {
            report.content_share_error = Some(message);
            return;
        }

        let mut tally = RunTally::new(Phase::ContentShare);
        let mut attempted = 0;
        for person in tagged {
            if self.deadline_passed() {
                warn!("deadline reached during content share phase");
                tally.interrupted = true;
                break;
            }
            if self.limit_reached(attempted) {
                break;
            }
            if self.settings.is_protected(person.key()) {
                tally.record_skip();
                continue;
            }
            attempted += 1;
            let outcome = match direction {
                Direction::Provision => self.grant_share(share, person),
                Direction::Deprovision => self.revoke_share(share, person),
            };
            log_outcome(person, &outcome);
            tally.record(outcome);
        }
        report.tallies.push(tally);
    }

    /// The profile sync that must precede every content-share step of a run.
    fn sync_share(&self, share: &dyn ContentShare) -> Result<(), String> {
        share.sync_profiles(&self.ctx).map_err(|e| {
            error!(error = %e, "content share sync failed; phase skipped");
            format!("{} profile sync failed: {e}", share.system())
        })
    }

    // -----------------------------------------------------------------------
    // Per-person steps
    // -----------------------------------------------------------------------

    fn provision(&self, person: &Person) -> Result<(), StepError> {
        let idp = self.dirs.idp;
        let key = person.key();
        let idp_step = |e| StepError::new(Step::IdentityProvider, idp.system(), key, e);

        if idp.find_by_key(&self.ctx, key).map_err(idp_step)?.is_none() {
            match idp.create(&self.ctx, person).map_err(idp_step)? {
                CreateOutcome::Created(handle) => {
                    for group in self.settings.groups_for(person.role()).names() {
                        idp.add_to_group(&self.ctx, &handle, group).map_err(|e| {
                            StepError::new(Step::Groups, idp.system(), key, e)
                        })?;
                        debug!(person = %key, group = %group, "added to group");
                    }
                }
                CreateOutcome::AlreadyPresent(_) => {
                    info!(person = %key, "identity provider account already present; groups left unchanged");
                }
            }
        }

        for app in self.tagged_apps(person) {
            let app_step = |e| StepError::new(Step::App, app.system(), key, e);
            match app.find_by_key(&self.ctx, key).map_err(app_step)? {
                Some(handle) => app.update(&self.ctx, &handle, person).map_err(app_step)?,
                None => {
                    app.create(&self.ctx, person).map_err(app_step)?;
                }
            }
        }
        Ok(())
    }

    fn deprovision(&self, person: &Person) -> Result<(), StepError> {
        let idp = self.dirs.idp;
        let key = person.key();
        let idp_step = |e| StepError::new(Step::IdentityProvider, idp.system(), key, e);

        match idp.find_by_key(&self.ctx, key).map_err(idp_step)? {
            Some(handle) => idp.delete(&self.ctx, &handle).map_err(idp_step)?,
            None => info!(person = %key, "identity provider account already gone"),
        }

        for app in self.tagged_apps(person) {
            let app_step = |e| StepError::new(Step::App, app.system(), key, e);
            if let Some(handle) = app.find_by_key(&self.ctx, key).map_err(app_step)? {
                app.delete(&self.ctx, &handle).map_err(app_step)?;
            }
        }
        Ok(())
    }

    fn grant_share(&self, share: &dyn ContentShare, person: &Person) -> Result<(), StepError> {
        let key = person.key();
        let step = |e| StepError::new(Step::ContentShare, share.system(), key, e);
        let handle = share
            .find_by_key(&self.ctx, key)
            .map_err(step)?
            .ok_or_else(|| {
                step(DirectoryError::NotFound {
                    system: share.system().to_string(),
                    key: key.to_string(),
                    detail: "not synced with this user".to_string(),
                })
            })?;
        share.grant(&self.ctx, &handle).map_err(step)
    }

    fn revoke_share(&self, share: &dyn ContentShare, person: &Person) -> Result<(), StepError> {
        let key = person.key();
        let step = |e| StepError::new(Step::ContentShare, share.system(), key, e);
        match share.find_by_key(&self.ctx, key).map_err(step)? {
            Some(handle) => share.revoke(&self.ctx, &handle).map_err(step),
            None => {
                info!(person = %key, "not present in content share");
                Ok(())
            }
        }
    }

    fn tagged_apps<'p>(&'p self, person: &'p Person) -> impl Iterator<Item = &'a dyn AppDirectory> + 'p {
        self.dirs
            .apps
            .iter()
            .copied()
            .filter(move |app| person.is_tagged(app.system()))
    }

    /// Every membership tag this run can act on.
    fn all_tags(&self) -> BTreeSet<String> {
        let mut tags: BTreeSet<String> = self.dirs.apps.iter().map(|a| a.system().to_string()).collect();
        if let Some(share) = self.dirs.share {
            tags.insert(share.tag().to_string());
        }
        tags
    }

    fn clean_app(&self) -> Result<&'a dyn AppDirectory, SyncError> {
        let found = match &self.settings.clean_app {
            Some(name) => self.dirs.apps.iter().copied().find(|a| a.system() == name),
            None => self.dirs.apps.first().copied(),
        };
        found.ok_or_else(|| SyncError::Unsupported("clean mode needs a configured business app".to_string()))
    }

    // -----------------------------------------------------------------------
    // Clean mode
    // -----------------------------------------------------------------------

    /// Remove accounts present in the clean app but absent from `roster`.
    ///
    /// Each stray is confirmed individually and removed from the identity
    /// provider and every business app. Once every confirmed stray has been
    /// handled, the content share is synced a single time and the removed
    /// strays are unshared.
    pub fn run_clean(&mut self, roster: &[Person], confirm: &mut dyn Confirm) -> Result<RunReport, SyncError> {
        let mut report = RunReport::new(Utc::now());
        self.begin()?;

        let app = self.clean_app()?;
        let listing = app
            .list_keys(&self.ctx)
            .map_err(|e| fatal(&format!("{} listing", app.system()), e))?;
        let diff = DiffReconciler::new(roster, &self.settings.exclude_patterns, &self.settings.protected_ids)?;
        let strays = diff.strays(&listing);
        info!(listed = listing.len(), strays = strays.len(), system = %app.system(), "clean diff computed");

        let tags = self.all_tags();
        let mut tally = RunTally::new(Phase::Clean);
        let mut removed = Vec::new();

        for email in &strays {
            if self.deadline_passed() {
                warn!("deadline reached; remaining strays not processed");
                tally.interrupted = true;
                break;
            }
            if self.limit_reached(removed.len() + tally.failures.len()) {
                break;
            }
            if !confirm.confirm(email) {
                info!(person = %email, "removal declined");
                tally.record_skip();
                continue;
            }

            self.rotate_token_if_due()?;
            self.since_refresh += 1;

            let person = Person {
                memberships: tags.clone(),
                ..Person::minimal(email.as_str())
            };
            match self.deprovision(&person) {
                Ok(()) => removed.push(person),
                Err(err) => {
                    log_failure(&err);
                    tally.record_failure(PersonFailure::from(&err));
                }
            }
        }

        match self.dirs.share {
            Some(share) if !removed.is_empty() => {
                self.unshare_strays(share, &removed, &mut tally, &mut report)
            }
            _ => {
                for person in &removed {
                    info!(person = %person.key(), "stray removed");
                    tally.record_success();
                }
            }
        }
        report.tallies.push(tally);
        Ok(report.finish())
    }

    /// Second clean-mode pass: one profile sync, then a revoke per removed stray.
    fn unshare_strays(
        &self,
        share: &dyn ContentShare,
        removed: &[Person],
        tally: &mut RunTally,
        report: &mut RunReport,
    ) {
        if let Err(message) = self.sync_share(share) {
            for person in removed {
                tally.record_failure(PersonFailure {
                    person: person.key().to_string(),
                    step: Step::ContentShare,
                    system: share.system().to_string(),
                    message: message.clone(),
                });
            }
            report.content_share_error = Some(message);
            return;
        }

        for person in removed {
            let outcome = self.revoke_share(share, person);
            log_outcome(person, &outcome);
            tally.record(outcome);
        }
    }
}

fn log_outcome(person: &Person, outcome: &Result<(), StepError>) {
    match outcome {
        Ok(()) => info!(person = %person.key(), "reconciled"),
        Err(err) => log_failure(err),
    }
}

fn log_failure(err: &StepError) {
    error!(
        person = %err.person,
        step = %err.step,
        system = %err.system,
        error = %err.source,
        "step failed"
    );
}
