mod helpers;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rollcall_core::{Person, RecordHandle};
use rollcall_directory::{AppDirectory, BusinessAppAdapter, CreateOutcome, DirectoryAdapter};

use helpers::{app_config, blocking, ctx, http, SVC_BASIC};

fn adapter(uri: &str) -> BusinessAppAdapter {
    BusinessAppAdapter::from_config(&app_config(uri), http()).expect("adapter")
}

#[tokio::test]
async fn lookup_queries_by_email_with_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ecal/Users"))
        .and(query_param("q", "userEmail='jane@example.com'"))
        .and(header("authorization", SVC_BASIC))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": 17, "userEmail": "jane@example.com" }], "hasMore": false
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let found = blocking(move || adapter(&uri).find_by_key(&ctx(), "jane@example.com")).await;
    assert_eq!(found.unwrap(), Some(RecordHandle::from("17")));
}

#[tokio::test]
async fn lookup_escapes_quotes_in_the_email() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ecal/Users"))
        .and(query_param("q", "userEmail='o''brien@example.com'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "X1", "userEmail": "o'brien@example.com" }], "hasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let found = blocking(move || adapter(&uri).find_by_key(&ctx(), "o'brien@example.com")).await;
    assert_eq!(found.unwrap(), Some(RecordHandle::from("X1")));
}

#[tokio::test]
async fn create_sends_manager_role_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ecal/Users"))
        .and(body_string_contains("\"role\":\"MGR\""))
        .and(body_string_contains("\"manager\":\"boss@example.com\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 99 })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let person = Person {
        direct_report_count: 4,
        manager_ref: "boss@example.com".to_string(),
        ..Person::minimal("jane@example.com")
    };
    let outcome = blocking(move || adapter(&uri).create(&ctx(), &person)).await;
    assert_eq!(outcome.unwrap(), CreateOutcome::Created(RecordHandle::from("99")));
}

#[tokio::test]
async fn conflicts_on_create_and_update_are_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ecal/Users"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/ecal/Users/17"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let uri = server.uri();
    let (created, updated) = blocking(move || {
        let app = adapter(&uri);
        let person = Person::minimal("jane@example.com");
        (
            app.create(&ctx(), &person),
            app.update(&ctx(), &RecordHandle::from("17"), &person),
        )
    })
    .await;
    assert_eq!(created.unwrap(), CreateOutcome::AlreadyPresent(None));
    updated.expect("conflicting update is success");
}

#[tokio::test]
async fn update_patches_every_field() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/ecal/Users/17"))
        .and(body_string_contains("\"firstName\":\"Jane\""))
        .and(body_string_contains("\"role\":\"IC\""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let person = Person {
        first_name: "Jane".to_string(),
        ..Person::minimal("jane@example.com")
    };
    blocking(move || adapter(&uri).update(&ctx(), &RecordHandle::from("17"), &person))
        .await
        .expect("update");
}

#[tokio::test]
async fn delete_of_absent_record_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/ecal/Users/17"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let uri = server.uri();
    blocking(move || adapter(&uri).delete(&ctx(), &RecordHandle::from("17")))
        .await
        .expect("idempotent delete");
}

#[tokio::test]
async fn listing_follows_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ecal/Users"))
        .and(query_param("fields", "userEmail"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "userEmail": "a@x.com" }, { "userEmail": "b@x.com" }],
            "hasMore": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ecal/Users"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "userEmail": "stray@x.com" }],
            "hasMore": false
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let keys = blocking(move || adapter(&uri).list_keys(&ctx())).await.expect("listing");
    assert_eq!(keys, vec!["a@x.com", "b@x.com", "stray@x.com"]);
}
