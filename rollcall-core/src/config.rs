//! Typed YAML configuration.
//!
//! # Layout
//!
//! ```yaml
//! organization: { email_domain: example.com }
//! roster: { url: https://feed.example.com/people, username: svc, password: "[vault]RosterPassword:roster-pw" }
//! identity_provider:
//!   base_url: https://idp.example.com
//!   client_id: rollcall
//!   client_secret: "[vault]IdcsClientSecret:idcs-secret"
//!   manager_groups: "Managers, Everyone"
//!   user_groups: "Everyone"
//! apps:
//!   - { name: ecal, endpoint: https://apps.example.com/ecal/Users, username: svc, password: pw,
//!       user_role_code: IC, manager_role_code: MGR }
//! content_share: { base_url: https://share.example.com, username: svc, password: pw, folder_id: F123 }
//! ```
//!
//! Secret-bearing fields are [`Secret`]s and are resolved explicitly by
//! [`Config::resolve_secrets`].

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::secret::{Secret, SecretResolver};

// ---------------------------------------------------------------------------
// Default payload templates (tera syntax)
// ---------------------------------------------------------------------------

pub const DEFAULT_IDP_CREATE_USER_TEMPLATE: &str = r#"{"schemas":["urn:ietf:params:scim:schemas:core:2.0:User"],"userName":{{ email | json_encode() }},"name":{"givenName":{{ first_name | json_encode() }},"familyName":{{ last_name | json_encode() }}},"emails":[{"value":{{ email | json_encode() }},"type":"work","primary":true}]}"#;

pub const DEFAULT_IDP_ADD_TO_GROUP_TEMPLATE: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"add","path":"members","value":[{"value":{{ user_id | json_encode() }},"type":"User"}]}]}"#;

pub const DEFAULT_IDP_REMOVE_FROM_GROUP_TEMPLATE: &str = r#"{"schemas":["urn:ietf:params:scim:api:messages:2.0:PatchOp"],"Operations":[{"op":"remove","path":"members[value eq \"{{ user_id }}\"]"}]}"#;

pub const DEFAULT_APP_CREATE_TEMPLATE: &str = r#"{"userEmail":{{ email | json_encode() }},"firstName":{{ first_name | json_encode() }},"lastName":{{ last_name | json_encode() }},"manager":{{ manager | json_encode() }},"role":{{ role | json_encode() }},"lineOfBusiness":{{ line_of_business | json_encode() }}}"#;

pub const DEFAULT_APP_UPDATE_TEMPLATE: &str = r#"{"firstName":{{ first_name | json_encode() }},"lastName":{{ last_name | json_encode() }},"manager":{{ manager | json_encode() }},"role":{{ role | json_encode() }},"lineOfBusiness":{{ line_of_business | json_encode() }}}"#;

pub const DEFAULT_SHARE_TEMPLATE: &str =
    r#"{"userID":{{ user_id | json_encode() }},"role":"downloader"}"#;

pub const DEFAULT_UNSHARE_TEMPLATE: &str = r#"{"userID":{{ user_id | json_encode() }}}"#;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Root of the rollcall configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub organization: OrganizationConfig,
    pub roster: RosterConfig,
    pub identity_provider: IdentityProviderConfig,
    #[serde(default)]
    pub apps: Vec<AppConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_share: Option<ContentShareConfig>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub clean: CleanConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Domain appended to normalized manager references.
    pub email_domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Secret,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Comma-delimited group names for people with direct reports.
    #[serde(default)]
    pub manager_groups: String,
    /// Comma-delimited group names for individual contributors.
    #[serde(default)]
    pub user_groups: String,
    #[serde(default = "default_idp_create_user_template")]
    pub create_user_template: String,
    #[serde(default = "default_idp_add_to_group_template")]
    pub add_to_group_template: String,
    #[serde(default = "default_idp_remove_from_group_template")]
    pub remove_from_group_template: String,
    /// Re-acquire the bearer token after this many processed persons.
    #[serde(default = "default_token_refresh_every")]
    pub token_refresh_every: usize,
}

/// One business-application user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Membership tag and log label, e.g. `ecal`.
    pub name: String,
    /// Collection endpoint, e.g. `https://apps.example.com/ic/builder/.../Users`.
    pub endpoint: String,
    pub username: String,
    pub password: Secret,
    pub user_role_code: String,
    pub manager_role_code: String,
    #[serde(default = "default_app_create_template")]
    pub create_template: String,
    #[serde(default = "default_app_update_template")]
    pub update_template: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentShareConfig {
    /// Membership tag that opts a person into content sharing.
    #[serde(default = "default_content_share_tag")]
    pub tag: String,
    pub base_url: String,
    pub username: String,
    pub password: Secret,
    /// Root folder the downloader share is granted on.
    pub folder_id: String,
    #[serde(default = "default_share_template")]
    pub share_template: String,
    #[serde(default = "default_unshare_template")]
    pub unshare_template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Tags applied to roster records that carry none.
    #[serde(default)]
    pub memberships: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanConfig {
    /// App whose listing is diffed; defaults to the first configured app.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    /// Regexes for accounts that are never offered for removal. They are
    /// matched against the lower-cased, trimmed email.
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            app: None,
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Ids that are never created, updated or removed.
    #[serde(default)]
    pub protected_ids: Vec<String>,
    /// Stop each phase after this many persons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Stop picking up new persons once the run has lasted this long.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            protected_ids: Vec::new(),
            limit: None,
            deadline_secs: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = single attempt).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_scope() -> String {
    "urn:opc:idm:__myscopes__".to_string()
}
fn default_idp_create_user_template() -> String {
    DEFAULT_IDP_CREATE_USER_TEMPLATE.to_string()
}
fn default_idp_add_to_group_template() -> String {
    DEFAULT_IDP_ADD_TO_GROUP_TEMPLATE.to_string()
}
fn default_idp_remove_from_group_template() -> String {
    DEFAULT_IDP_REMOVE_FROM_GROUP_TEMPLATE.to_string()
}
fn default_token_refresh_every() -> usize {
    50
}
fn default_app_create_template() -> String {
    DEFAULT_APP_CREATE_TEMPLATE.to_string()
}
fn default_app_update_template() -> String {
    DEFAULT_APP_UPDATE_TEMPLATE.to_string()
}
fn default_page_size() -> usize {
    200
}
fn default_content_share_tag() -> String {
    "content-share".to_string()
}
fn default_share_template() -> String {
    DEFAULT_SHARE_TEMPLATE.to_string()
}
fn default_unshare_template() -> String {
    DEFAULT_UNSHARE_TEMPLATE.to_string()
}
fn default_exclude_patterns() -> Vec<String> {
    vec!["^cto-test".to_string()]
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    10_000
}

// ---------------------------------------------------------------------------
// Load / validate / resolve
// ---------------------------------------------------------------------------

impl Config {
    /// Load and validate a config file. Secret markers are left unresolved.
    ///
    /// Returns `CoreError::ConfigNotFound` if absent,
    /// `CoreError::Parse` (with path + line context) if malformed YAML.
    pub fn load_at(path: &Path) -> Result<Config, CoreError> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let config: Config = serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.organization.email_domain.trim().is_empty() {
            return Err(CoreError::Invalid(
                "organization.email_domain must not be empty".to_string(),
            ));
        }
        if self.identity_provider.token_refresh_every == 0 {
            return Err(CoreError::Invalid(
                "identity_provider.token_refresh_every must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for app in &self.apps {
            if app.name.trim().is_empty() {
                return Err(CoreError::Invalid("apps[].name must not be empty".to_string()));
            }
            if !seen.insert(app.name.as_str()) {
                return Err(CoreError::Invalid(format!("duplicate app name '{}'", app.name)));
            }
        }

        if let Some(share) = &self.content_share {
            if seen.contains(share.tag.as_str()) {
                return Err(CoreError::Invalid(format!(
                    "content_share.tag '{}' collides with an app name",
                    share.tag
                )));
            }
        }

        if let Some(name) = &self.clean.app {
            if !seen.contains(name.as_str()) {
                return Err(CoreError::Invalid(format!(
                    "clean.app '{name}' is not a configured app"
                )));
            }
        }
        Ok(())
    }

    /// Resolve every secret-bearing field through `resolver`.
    pub fn resolve_secrets(mut self, resolver: &dyn SecretResolver) -> Result<Config, CoreError> {
        if let Some(password) = &self.roster.password {
            self.roster.password = Some(password.resolve("roster.password", resolver)?);
        }
        self.identity_provider.client_secret = self
            .identity_provider
            .client_secret
            .resolve("identity_provider.client_secret", resolver)?;
        for app in &mut self.apps {
            let field = format!("apps.{}.password", app.name);
            app.password = app.password.resolve(&field, resolver)?;
        }
        if let Some(share) = &mut self.content_share {
            share.password = share.password.resolve("content_share.password", resolver)?;
        }
        Ok(self)
    }
}
