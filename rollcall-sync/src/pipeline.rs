//! Entry point used by the CLI: builds the adapters from configuration,
//! fetches the roster and runs the engine in the requested mode.

use tracing::info;

use rollcall_core::config::Config;
use rollcall_core::Person;
use rollcall_directory::{
    AppDirectory, BusinessAppAdapter, ContentShare, ContentShareAdapter, HttpClient,
    HttpRosterSource, IdentityProviderAdapter, RosterSource,
};

use crate::diff::Confirm;
use crate::engine::{Directories, EngineSettings, ReconciliationEngine};
use crate::error::{fatal, SyncError};
use crate::tally::RunReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Add,
    Delete,
    Clean,
}

/// Fetch the roster and apply the configured default memberships.
pub fn fetch_roster(config: &Config) -> Result<Vec<Person>, SyncError> {
    let http = HttpClient::from_config(&config.run, &config.retry);
    let source = HttpRosterSource::from_config(&config.roster, http);
    load_roster(&source, config)
}

/// Fetch from any [`RosterSource`] and apply the configured default memberships.
pub fn load_roster(source: &dyn RosterSource, config: &Config) -> Result<Vec<Person>, SyncError> {
    let people = source.fetch().map_err(|e| fatal("roster fetch", e))?;
    Ok(people
        .into_iter()
        .map(|p| p.with_default_memberships(&config.defaults.memberships))
        .collect())
}

/// Run one full reconciliation. `config` must already have its secrets resolved.
pub fn run(config: &Config, mode: Mode, confirm: &mut dyn Confirm) -> Result<RunReport, SyncError> {
    let http = HttpClient::from_config(&config.run, &config.retry);

    let idp = IdentityProviderAdapter::from_config(&config.identity_provider, http.clone())
        .map_err(|source| SyncError::Adapter {
            system: "identity provider".to_string(),
            source,
        })?;
    let apps = config
        .apps
        .iter()
        .map(|app| {
            BusinessAppAdapter::from_config(app, http.clone()).map_err(|source| SyncError::Adapter {
                system: app.name.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let share = config
        .content_share
        .as_ref()
        .map(|cfg| {
            ContentShareAdapter::from_config(cfg, http.clone()).map_err(|source| SyncError::Adapter {
                system: "content share".to_string(),
                source,
            })
        })
        .transpose()?;

    let people = load_roster(&HttpRosterSource::from_config(&config.roster, http), config)?;
    info!(count = people.len(), mode = ?mode, "starting run");

    let dirs = Directories {
        idp: &idp,
        apps: apps.iter().map(|a| a as &dyn AppDirectory).collect(),
        share: share.as_ref().map(|s| s as &dyn ContentShare),
    };
    let mut engine = ReconciliationEngine::new(dirs, EngineSettings::from_config(config));
    match mode {
        Mode::Add => engine.run_add(&people),
        Mode::Delete => engine.run_delete(&people),
        Mode::Clean => engine.run_clean(&people, confirm),
    }
}
