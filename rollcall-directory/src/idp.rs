//! SCIM-style identity provider adapter.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, info};

use rollcall_core::config::IdentityProviderConfig;
use rollcall_core::{Person, RecordHandle, Role, Secret};
use rollcall_render::{PayloadContext, PayloadRenderer};

use crate::adapter::{CreateOutcome, DirectoryAdapter, GroupDirectory};
use crate::context::{BearerToken, RunContext};
use crate::error::DirectoryError;
use crate::http::{join, Auth, HttpClient, HttpRequest, Method};

const SYSTEM: &str = "identity provider";

const CREATE_USER: &str = "create_user";
const ADD_TO_GROUP: &str = "add_to_group";
const REMOVE_FROM_GROUP: &str = "remove_from_group";

// ---------------------------------------------------------------------------
// Group selection
// ---------------------------------------------------------------------------

/// Group names assigned to a newly created account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSelection(Vec<String>);

impl GroupSelection {
    /// Manager groups for people with direct reports, user groups otherwise.
    pub fn for_role(role: Role, config: &IdentityProviderConfig) -> Self {
        let source = match role {
            Role::Manager => &config.manager_groups,
            Role::IndividualContributor => &config.user_groups,
        };
        Self::parse(source)
    }

    /// Split a comma-delimited list, trimming and skipping blanks.
    pub fn parse(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

pub struct IdentityProviderAdapter {
    http: HttpClient,
    base_url: String,
    client_id: String,
    client_secret: Secret,
    scope: String,
    renderer: PayloadRenderer,
    /// Group display name -> group id, filled lazily for the run.
    group_ids: Mutex<HashMap<String, RecordHandle>>,
}

impl IdentityProviderAdapter {
    pub fn from_config(config: &IdentityProviderConfig, http: HttpClient) -> Result<Self, DirectoryError> {
        let renderer = PayloadRenderer::new([
            (CREATE_USER, config.create_user_template.as_str()),
            (ADD_TO_GROUP, config.add_to_group_template.as_str()),
            (REMOVE_FROM_GROUP, config.remove_from_group_template.as_str()),
        ])?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            renderer,
            group_ids: Mutex::new(HashMap::new()),
        })
    }

    fn url(&self, path: &str) -> String {
        join(&self.base_url, path)
    }

    fn bearer(ctx: &RunContext) -> Result<Auth, DirectoryError> {
        Ok(Auth::Bearer(ctx.bearer()?.to_string()))
    }

    /// Resolve a group display name to its id, consulting the run cache first.
    pub fn resolve_group(&self, ctx: &RunContext, group: &str) -> Result<RecordHandle, DirectoryError> {
        if let Some(id) = self.cached_group(group) {
            return Ok(id);
        }

        let request = HttpRequest::new("group lookup", Method::Get, self.url("/admin/v1/Groups"))
            .query("filter", format!("displayName eq \"{group}\""))
            .auth(Self::bearer(ctx)?);
        let response = self
            .http
            .send_idempotent(&request)
            .and_then(|r| r.accept(&request.operation, &[200]))
            .map_err(|e| DirectoryError::lookup(SYSTEM, group, e))?;

        let id = response
            .string_at("/Resources/0/id")
            .map(RecordHandle::from)
            .ok_or_else(|| DirectoryError::GroupNotFound {
                system: SYSTEM.to_string(),
                group: group.to_string(),
            })?;
        debug!(group, id = %id, "resolved group");
        if let Ok(mut cache) = self.group_ids.lock() {
            cache.insert(group.to_string(), id.clone());
        }
        Ok(id)
    }

    fn cached_group(&self, group: &str) -> Option<RecordHandle> {
        self.group_ids.lock().ok()?.get(group).cloned()
    }

    fn patch_group(
        &self,
        ctx: &RunContext,
        handle: &RecordHandle,
        group: &str,
        template: &str,
    ) -> Result<(), DirectoryError> {
        let group_id = self.resolve_group(ctx, group)?;
        let body = self
            .renderer
            .render(template, &PayloadContext::for_user_id(handle.as_str()))?;
        let operation = format!("group patch ({group})");
        let request = HttpRequest::new(
            operation.as_str(),
            Method::Patch,
            self.url(&format!("/admin/v1/Groups/{group_id}")),
        )
        .auth(Self::bearer(ctx)?)
        .json(body);
        self.http.send(&request)?.accept(&operation, &[200, 204])?;
        Ok(())
    }
}

impl DirectoryAdapter for IdentityProviderAdapter {
    fn system(&self) -> &str {
        SYSTEM
    }

    fn find_by_key(&self, ctx: &RunContext, key: &str) -> Result<Option<RecordHandle>, DirectoryError> {
        let request = HttpRequest::new("user lookup", Method::Get, self.url("/admin/v1/Users"))
            .query("filter", format!("userName eq \"{key}\""))
            .auth(Self::bearer(ctx)?);
        let response = self
            .http
            .send_idempotent(&request)
            .and_then(|r| r.accept(&request.operation, &[200]))
            .map_err(|e| DirectoryError::lookup(SYSTEM, key, e))?;
        Ok(response.string_at("/Resources/0/id").map(RecordHandle::from))
    }

    fn create(&self, ctx: &RunContext, person: &Person) -> Result<CreateOutcome, DirectoryError> {
        let body = self
            .renderer
            .render(CREATE_USER, &PayloadContext::for_person(person))?;
        let request = HttpRequest::new("user create", Method::Post, self.url("/admin/v1/Users"))
            .auth(Self::bearer(ctx)?)
            .json(body);
        let response = self.http.send(&request)?;
        match response.status {
            200 | 201 => response
                .string_at("/id")
                .map(|id| CreateOutcome::Created(RecordHandle::from(id)))
                .ok_or_else(|| DirectoryError::decode(&request.operation, "created user has no id")),
            409 => {
                info!(person = %person.key(), "user already exists in identity provider");
                Ok(CreateOutcome::AlreadyPresent(
                    response.string_at("/id").map(RecordHandle::from),
                ))
            }
            _ => Err(response.into_error(&request.operation)),
        }
    }

    /// Profile fields are owned by the feed; only group membership is managed.
    fn update(&self, _ctx: &RunContext, handle: &RecordHandle, person: &Person) -> Result<(), DirectoryError> {
        debug!(person = %person.key(), id = %handle, "identity provider record left unchanged");
        Ok(())
    }

    fn delete(&self, ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError> {
        let request = HttpRequest::new(
            "user delete",
            Method::Delete,
            self.url(&format!("/admin/v1/Users/{handle}")),
        )
        .query("forceDelete", "true")
        .auth(Self::bearer(ctx)?);
        self.http
            .send_idempotent(&request)?
            .accept(&request.operation, &[200, 204, 404])?;
        Ok(())
    }
}

impl GroupDirectory for IdentityProviderAdapter {
    fn acquire_token(&self) -> Result<BearerToken, DirectoryError> {
        let request = HttpRequest::new("token request", Method::Post, self.url("/oauth2/v1/token"))
            .auth(Auth::Basic {
                username: self.client_id.clone(),
                password: self.client_secret.expose().to_string(),
            })
            .form(vec![
                ("grant_type".to_string(), "client_credentials".to_string()),
                ("scope".to_string(), self.scope.clone()),
            ]);
        let response = self
            .http
            .send_idempotent(&request)
            .map_err(|e| DirectoryError::Auth(e.to_string()))?;
        if !response.is_success() {
            return Err(DirectoryError::Auth(response.into_error(&request.operation).to_string()));
        }
        response
            .string_at("/access_token")
            .map(BearerToken::new)
            .ok_or_else(|| DirectoryError::Auth("token response has no access_token".to_string()))
    }

    fn add_to_group(&self, ctx: &RunContext, handle: &RecordHandle, group: &str) -> Result<(), DirectoryError> {
        self.patch_group(ctx, handle, group, ADD_TO_GROUP)
    }

    fn remove_from_group(&self, ctx: &RunContext, handle: &RecordHandle, group: &str) -> Result<(), DirectoryError> {
        self.patch_group(ctx, handle, group, REMOVE_FROM_GROUP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config() -> IdentityProviderConfig {
        let json = serde_json::json!({
            "base_url": "http://idp.local",
            "client_id": "rollcall",
            "client_secret": "shh",
            "manager_groups": "Managers, Everyone ,",
            "user_groups": "Everyone"
        });
        serde_json::from_value(json).expect("config")
    }

    #[rstest]
    #[case(0, vec!["Everyone"])]
    #[case(1, vec!["Managers", "Everyone"])]
    #[case(12, vec!["Managers", "Everyone"])]
    fn groups_follow_direct_report_count(#[case] directs: u32, #[case] expected: Vec<&str>) {
        let selection = GroupSelection::for_role(Role::from_direct_reports(directs), &config());
        assert_eq!(selection.names(), expected.as_slice());
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert!(GroupSelection::parse(" , ,").is_empty());
    }

    #[test]
    fn adapter_builds_from_default_templates() {
        let http = HttpClient::new(
            std::time::Duration::from_secs(1),
            crate::retry::RetryPolicy::none(),
        );
        let adapter = IdentityProviderAdapter::from_config(&config(), http).expect("adapter");
        assert_eq!(adapter.system(), "identity provider");
    }
}
