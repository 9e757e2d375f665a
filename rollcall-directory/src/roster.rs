//! Roster feed client.

use tracing::{info, warn};

use rollcall_core::config::RosterConfig;
use rollcall_core::types::RosterPage;
use rollcall_core::{Person, Secret};

use crate::error::DirectoryError;
use crate::http::{Auth, HttpClient, HttpRequest, Method};

/// Source of the authoritative person list.
pub trait RosterSource {
    /// Every valid roster entry, in feed order.
    fn fetch(&self) -> Result<Vec<Person>, DirectoryError>;
}

pub struct HttpRosterSource {
    http: HttpClient,
    url: String,
    username: Option<String>,
    password: Option<Secret>,
}

impl HttpRosterSource {
    pub fn from_config(config: &RosterConfig, http: HttpClient) -> Self {
        Self {
            http,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn auth(&self) -> Auth {
        match (&self.username, &self.password) {
            (Some(username), password) => Auth::Basic {
                username: username.clone(),
                password: password
                    .as_ref()
                    .map(|p| p.expose().to_string())
                    .unwrap_or_default(),
            },
            (None, _) => Auth::None,
        }
    }
}

impl RosterSource for HttpRosterSource {
    fn fetch(&self) -> Result<Vec<Person>, DirectoryError> {
        let request = HttpRequest::new("roster fetch", Method::Get, self.url.as_str()).auth(self.auth());
        let response = self.http.send_idempotent(&request)?;
        if !response.is_success() {
            return Err(response.into_error(&request.operation));
        }
        let page: RosterPage = serde_json::from_str(&response.body)
            .map_err(|e| DirectoryError::decode(&request.operation, e.to_string()))?;
        let people = retain_valid(page.items);
        info!(count = people.len(), "roster fetched");
        Ok(people)
    }
}

/// Drop entries whose id is blank.
pub fn retain_valid(items: Vec<Person>) -> Vec<Person> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, person)| {
            if person.key().is_empty() {
                warn!(index, name = %person.display_name, "roster entry without id dropped");
                None
            } else {
                Some(person)
            }
        })
        .collect()
}
