//! Business-application user store adapter (basic auth, JSON collection).

use tracing::{debug, info, warn};

use rollcall_core::config::AppConfig;
use rollcall_core::{Person, RecordHandle, Role, Secret};
use rollcall_render::{PayloadContext, PayloadRenderer};

use crate::adapter::{AppDirectory, CreateOutcome, DirectoryAdapter};
use crate::context::RunContext;
use crate::error::DirectoryError;
use crate::http::{join, Auth, HttpClient, HttpRequest, Method};

const CREATE: &str = "create";
const UPDATE: &str = "update";

/// Stop paging after this many pages even if the store keeps saying `hasMore`.
const MAX_PAGES: usize = 10_000;

pub struct BusinessAppAdapter {
    http: HttpClient,
    name: String,
    endpoint: String,
    username: String,
    password: Secret,
    user_role_code: String,
    manager_role_code: String,
    page_size: usize,
    max_pages: usize,
    renderer: PayloadRenderer,
}

impl BusinessAppAdapter {
    pub fn from_config(config: &AppConfig, http: HttpClient) -> Result<Self, DirectoryError> {
        let renderer = PayloadRenderer::new([
            (CREATE, config.create_template.as_str()),
            (UPDATE, config.update_template.as_str()),
        ])?;
        Ok(Self {
            http,
            name: config.name.clone(),
            endpoint: config.endpoint.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            user_role_code: config.user_role_code.clone(),
            manager_role_code: config.manager_role_code.clone(),
            page_size: config.page_size.max(1),
            max_pages: MAX_PAGES,
            renderer,
        })
    }

    fn auth(&self) -> Auth {
        Auth::Basic {
            username: self.username.clone(),
            password: self.password.expose().to_string(),
        }
    }

    /// `q` filter for one email; single quotes are doubled inside the literal.
    fn email_filter(key: &str) -> String {
        format!("userEmail='{}'", key.replace('\'', "''"))
    }

    fn operation(&self, verb: &str) -> String {
        format!("{} {verb}", self.name)
    }

    pub fn role_code(&self, role: Role) -> &str {
        match role {
            Role::Manager => &self.manager_role_code,
            Role::IndividualContributor => &self.user_role_code,
        }
    }

    fn payload(&self, template: &str, person: &Person) -> Result<String, DirectoryError> {
        let ctx = PayloadContext::for_person(person).with_role(self.role_code(person.role()));
        Ok(self.renderer.render(template, &ctx)?)
    }
}

impl DirectoryAdapter for BusinessAppAdapter {
    fn system(&self) -> &str {
        &self.name
    }

    fn find_by_key(&self, _ctx: &RunContext, key: &str) -> Result<Option<RecordHandle>, DirectoryError> {
        let request = HttpRequest::new(self.operation("lookup"), Method::Get, self.endpoint.as_str())
            .query("q", Self::email_filter(key))
            .auth(self.auth());
        let response = self
            .http
            .send_idempotent(&request)
            .and_then(|r| r.accept(&request.operation, &[200]))
            .map_err(|e| DirectoryError::lookup(&self.name, key, e))?;
        Ok(response.id_at("/items/0/id").map(RecordHandle::from))
    }

    fn create(&self, _ctx: &RunContext, person: &Person) -> Result<CreateOutcome, DirectoryError> {
        let request = HttpRequest::new(self.operation("create"), Method::Post, self.endpoint.as_str())
            .auth(self.auth())
            .json(self.payload(CREATE, person)?);
        let response = self.http.send(&request)?;
        match response.status {
            200 | 201 => response
                .id_at("/id")
                .map(|id| CreateOutcome::Created(RecordHandle::from(id)))
                .ok_or_else(|| DirectoryError::decode(&request.operation, "created record has no id")),
            409 => {
                info!(person = %person.key(), system = %self.name, "user already exists");
                Ok(CreateOutcome::AlreadyPresent(None))
            }
            _ => Err(response.into_error(&request.operation)),
        }
    }

    fn update(&self, _ctx: &RunContext, handle: &RecordHandle, person: &Person) -> Result<(), DirectoryError> {
        let request = HttpRequest::new(
            self.operation("update"),
            Method::Patch,
            join(&self.endpoint, handle.as_str()),
        )
        .auth(self.auth())
        .json(self.payload(UPDATE, person)?);
        self.http
            .send(&request)?
            .accept(&request.operation, &[200, 204, 409])?;
        Ok(())
    }

    fn delete(&self, _ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError> {
        let request = HttpRequest::new(
            self.operation("delete"),
            Method::Delete,
            join(&self.endpoint, handle.as_str()),
        )
        .auth(self.auth());
        self.http
            .send_idempotent(&request)?
            .accept(&request.operation, &[200, 204, 404])?;
        Ok(())
    }
}

impl AppDirectory for BusinessAppAdapter {
    fn list_keys(&self, _ctx: &RunContext) -> Result<Vec<String>, DirectoryError> {
        let operation = self.operation("listing");
        let mut keys = Vec::new();
        let mut offset = 0usize;

        for page in 0..self.max_pages {
            let request = HttpRequest::new(operation.as_str(), Method::Get, self.endpoint.as_str())
                .query("fields", "userEmail")
                .query("limit", self.page_size.to_string())
                .query("offset", offset.to_string())
                .auth(self.auth());
            let value = self
                .http
                .send_idempotent(&request)?
                .accept(&operation, &[200])?
                .json(&operation)?;

            let items = value
                .get("items")
                .and_then(|v| v.as_array())
                .ok_or_else(|| DirectoryError::decode(&operation, "listing has no items array"))?;
            keys.extend(
                items
                    .iter()
                    .filter_map(|item| item.get("userEmail")?.as_str())
                    .map(|email| email.trim().to_string())
                    .filter(|email| !email.is_empty()),
            );

            let has_more = value.get("hasMore").and_then(|v| v.as_bool()).unwrap_or(false);
            debug!(system = %self.name, page, fetched = items.len(), has_more, "listing page");
            if !has_more || items.is_empty() {
                return Ok(keys);
            }
            offset += items.len();
        }
        warn!(system = %self.name, pages = self.max_pages, fetched = keys.len(), "listing still has more pages");
        Err(DirectoryError::decode(
            &operation,
            format!("listing did not end within {} pages", self.max_pages),
        ))
    }
}
