//! Loading mocks from declarative route files.

use rift_fetch_mock::{ConfigError, FetchMock, FetchMockError, RequestInit, RouteError};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn route_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const ROUTES: &str = r#"
config:
  sendAsJson: true
  matchPartialBody: true
routes:
  - name: user
    url: "express:/users/:id"
    method: GET
    params:
      id: "1"
    response:
      status: 200
      body:
        id: 1
        name: Ada
  - url: "begin:http://api.example.com/orders"
    method: POST
    body:
      sku: abc
    response:
      status: 201
      headers:
        location: /orders/9
  - url: /once
    repeat: 1
    response: once
  - url: /slow
    delayMs: 20
    response: 204
fallback:
  status: 404
  body: not found
"#;

#[tokio::test]
async fn test_route_file_end_to_end() {
    let file = route_file(".yaml", ROUTES);
    let mock = FetchMock::from_route_file(file.path()).unwrap();
    assert!(mock.config().match_partial_body);
    assert_eq!(mock.routes().len(), 4);

    let response = mock.fetch("/users/1", None).unwrap().await.unwrap();
    assert_eq!(response.status(), 200);
    let user: serde_json::Value = response.json().await.unwrap();
    assert_eq!(user, json!({"id": 1, "name": "Ada"}));

    let response = mock.fetch("/users/2", None).unwrap().await.unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(response.text().await.unwrap(), "not found");

    let order = RequestInit::new()
        .method("POST")
        .json(&json!({"sku": "abc", "quantity": 2}));
    let response = mock
        .fetch("http://api.example.com/orders", Some(order))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    assert_eq!(response.header("location"), Some("/orders/9"));

    assert_eq!(
        mock.fetch("/once", None).unwrap().await.unwrap().status(),
        200
    );
    assert_eq!(
        mock.fetch("/once", None).unwrap().await.unwrap().status(),
        404
    );

    let response = mock.fetch("/slow", None).unwrap().await.unwrap();
    assert_eq!(response.status(), 204);

    assert!(mock.done());
    assert!(mock.called("user", None));
}

#[tokio::test]
async fn test_load_routes_into_existing_instance() {
    let file = route_file(
        ".json",
        r#"{"routes": [{"url": "/json", "response": {"ok": true}}]}"#,
    );
    let mock = FetchMock::default();
    mock.route("/other", 200, ()).unwrap();
    mock.load_routes(file.path()).unwrap();

    let response = mock.fetch("/json", None).unwrap().await.unwrap();
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.text().await.unwrap(), r#"{"ok":true}"#);

    let err = mock.fetch("/missing", None).err().unwrap();
    assert!(matches!(err, FetchMockError::Unmatched { .. }));
}

#[test]
fn test_duplicate_routes_in_file_are_rejected() {
    let file = route_file(
        ".yml",
        r#"
routes:
  - url: /a
    response: 200
  - url: /a
    response: 201
"#,
    );
    let err = FetchMock::from_route_file(file.path()).err().unwrap();
    assert!(matches!(
        err,
        ConfigError::Route {
            index: 1,
            source: RouteError::DuplicateRoute { .. }
        }
    ));
}

#[test]
fn test_route_without_response_is_rejected() {
    let file = route_file(".yaml", "routes:\n  - url: /a\n");
    let err = FetchMock::from_route_file(file.path()).err().unwrap();
    assert!(matches!(
        err,
        ConfigError::Route {
            index: 0,
            source: RouteError::MissingResponse
        }
    ));
}

#[test]
fn test_malformed_file() {
    let file = route_file(".yaml", "routes: [not: valid: yaml");
    let err = FetchMock::from_route_file(file.path()).err().unwrap();
    assert!(matches!(err, ConfigError::Yaml(_)));
}
