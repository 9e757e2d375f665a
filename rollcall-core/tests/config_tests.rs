//! Config loading, error-message and secret-resolution integration tests.

use assert_fs::prelude::*;
use rollcall_core::{Config, CoreError, FileSecretResolver};

const CONFIG_WITH_MARKERS: &str = r#"
organization: { email_domain: example.com }
roster:
  url: "http://feed.local/people"
  username: feed-reader
  password: "[vault]RosterPassword:roster-pw"
identity_provider:
  base_url: "http://idp.local"
  client_id: rollcall
  client_secret: "[vault]IdcsClientSecret:idcs-secret"
apps:
  - name: ecal
    endpoint: "http://apps.local/ecal/Users"
    username: svc
    password: "[vault]VbcsPassword:vbcs-pw"
    user_role_code: IC
    manager_role_code: MGR
content_share:
  base_url: "http://share.local"
  username: svc
  password: literal-share-pw
  folder_id: F0001
run:
  protected_ids: ["boss@example.com"]
  limit: 10
"#;

#[test]
fn load_missing_config_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let err = Config::load_at(&dir.path().join("rollcall.yaml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("rollcall.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("rollcall.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = Config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("rollcall.yaml"));
}

#[test]
fn load_rejects_structurally_invalid_config() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("rollcall.yaml");
    file.write_str(&CONFIG_WITH_MARKERS.replace("email_domain: example.com", "email_domain: \"\""))
        .expect("write");

    let err = Config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, CoreError::Invalid(_)), "got: {err}");
}

#[test]
fn secrets_resolve_through_file_resolver() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("rollcall.yaml");
    file.write_str(CONFIG_WITH_MARKERS).expect("write");
    let secrets = dir.child("secrets");
    secrets.create_dir_all().expect("mkdir");
    secrets.child("roster-pw").write_str("feed-pw\n").expect("write");
    secrets.child("idcs-secret").write_str("client-secret").expect("write");
    secrets.child("vbcs-pw").write_str("app-pw").expect("write");

    let config = Config::load_at(file.path())
        .expect("load")
        .resolve_secrets(&FileSecretResolver::new(secrets.path()))
        .expect("resolve");

    assert_eq!(
        config.roster.password.as_ref().map(|s| s.expose()),
        Some("feed-pw")
    );
    assert_eq!(config.identity_provider.client_secret.expose(), "client-secret");
    assert_eq!(config.apps[0].password.expose(), "app-pw");
    let share = config.content_share.expect("content share");
    assert_eq!(share.password.expose(), "literal-share-pw");
    assert_eq!(share.tag, "content-share");
    assert_eq!(config.run.limit, Some(10));
}

#[test]
fn missing_secret_names_the_field() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("rollcall.yaml");
    file.write_str(CONFIG_WITH_MARKERS).expect("write");
    let empty = dir.child("empty");
    empty.create_dir_all().expect("mkdir");

    let err = Config::load_at(file.path())
        .expect("load")
        .resolve_secrets(&FileSecretResolver::new(empty.path()))
        .unwrap_err();
    assert!(err.to_string().contains("roster-pw"), "got: {err}");
}
