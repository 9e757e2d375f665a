//! Shared fixtures for the wiremock-backed adapter tests.
//!
//! The adapters are blocking, so every call runs on a `spawn_blocking`
//! thread while the mock server lives on the tokio runtime.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;

use rollcall_core::config::{AppConfig, ContentShareConfig, IdentityProviderConfig, RosterConfig};
use rollcall_directory::{BearerToken, HttpClient, RetryPolicy, RunContext};

pub const TOKEN: &str = "test-token-123";

/// Retries enabled, no sleeping.
pub fn http() -> HttpClient {
    HttpClient::new(
        Duration::from_secs(5),
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        },
    )
}

pub fn ctx() -> RunContext {
    RunContext::anonymous().with_token(BearerToken::new(TOKEN))
}

pub fn idp_config(uri: &str) -> IdentityProviderConfig {
    serde_json::from_value(json!({
        "base_url": uri,
        "client_id": "rollcall",
        "client_secret": "shh",
        "manager_groups": "Managers,Everyone",
        "user_groups": "Everyone"
    }))
    .expect("idp config")
}

pub fn app_config(uri: &str) -> AppConfig {
    serde_json::from_value(json!({
        "name": "ecal",
        "endpoint": format!("{uri}/ecal/Users"),
        "username": "svc",
        "password": "pw",
        "user_role_code": "IC",
        "manager_role_code": "MGR",
        "page_size": 2
    }))
    .expect("app config")
}

pub fn share_config(uri: &str) -> ContentShareConfig {
    serde_json::from_value(json!({
        "base_url": uri,
        "username": "svc",
        "password": "pw",
        "folder_id": "F123"
    }))
    .expect("share config")
}

pub fn roster_config(uri: &str) -> RosterConfig {
    serde_json::from_value(json!({
        "url": format!("{uri}/people"),
        "username": "feed",
        "password": "pw"
    }))
    .expect("roster config")
}

/// `Basic base64("svc:pw")`.
pub const SVC_BASIC: &str = "Basic c3ZjOnB3";

pub async fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.expect("blocking task")
}
