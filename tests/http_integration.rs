//! HTTP client and resource tests against a wiremock Vault.
//!
//! Run with:
//!   cargo test --test http_integration

#![cfg(feature = "http")]

use serde_json::json;
use std::collections::BTreeMap;
use vaultres::clients::http::HttpClient;
use vaultres::{Provider, ProviderConfig, ProviderError, Value, VaultClient};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ProviderConfig {
    ProviderConfig::new(server.uri()).with_token("s.test-token")
}

#[tokio::test]
async fn test_read_sends_token_and_namespace() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/auth/approle/role/web"))
        .and(header("X-Vault-Token", "s.test-token"))
        .and(header("X-Vault-Namespace", "team-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "8d3c5f0e",
            "lease_id": "",
            "renewable": false,
            "lease_duration": 0,
            "warnings": null,
            "data": {"policies": ["web"], "token_ttl": 60}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&config(&server).with_namespace("team-a")).unwrap();
    let secret = client.read("auth/approle/role/web").await.unwrap().unwrap();

    assert_eq!(secret.data["token_ttl"], 60);
    assert_eq!(secret.data["policies"], json!(["web"]));
}

#[tokio::test]
async fn test_read_missing_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/auth/approle/role/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&config(&server)).unwrap();
    assert!(client.read("auth/approle/role/gone").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/sys/audit/file"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&config(&server)).unwrap();
    let err = client.delete("sys/audit/file").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_error_body_is_decoded() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/sys/audit/file"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": ["path already in use at file/"]
        })))
        .mount(&server)
        .await;

    let client = HttpClient::new(&config(&server)).unwrap();
    let err = client
        .write("sys/audit/file", &json!({"type": "file"}))
        .await
        .unwrap_err();

    match &err {
        ProviderError::Api { status, errors } => {
            assert_eq!(*status, 400);
            assert_eq!(errors, &vec!["path already in use at file/".to_string()]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(
        err.to_string(),
        "Error making API request. Code: 400. Errors: path already in use at file/"
    );
}

#[tokio::test]
async fn test_error_without_json_body_keeps_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/sys/audit"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/auth"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpClient::new(&config(&server)).unwrap();

    let err = client.read("sys/audit").await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::Api { status: 502, ref errors } if errors == &vec!["upstream unavailable".to_string()]
    ));

    let err = client.read("sys/auth").await.unwrap_err();
    assert!(matches!(err, ProviderError::Api { status: 503, ref errors } if errors.is_empty()));
}

#[tokio::test]
async fn test_list_uses_list_method() {
    let server = MockServer::start().await;

    Mock::given(method("LIST"))
        .and(path("/v1/auth/approle/role"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"keys": ["ci", "web"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&config(&server)).unwrap();
    let secret = client.list("auth/approle/role").await.unwrap().unwrap();
    assert_eq!(secret.data["keys"], json!(["ci", "web"]));
}

#[tokio::test]
async fn test_empty_write_response_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/sys/auth/approle/tune"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = HttpClient::new(&config(&server)).unwrap();
    let resp = client
        .write("sys/auth/approle/tune", &json!({"max_lease_ttl": "1h"}))
        .await
        .unwrap();
    assert!(resp.is_none());
}

#[tokio::test]
async fn test_approle_role_create_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/auth/approle/role/web"))
        .and(body_json(json!({
            "policies": ["web"],
            "bound_cidr_list": "10.0.0.0/8",
            "bind_secret_id": true,
            "token_ttl": 300
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/auth/approle/role/web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "policies": ["web"],
                "bound_cidr_list": ["10.0.0.0/8"],
                "bind_secret_id": true,
                "secret_id_num_uses": 0,
                "secret_id_ttl": 0,
                "token_num_uses": 0,
                "token_ttl": 300,
                "token_max_ttl": 0,
                "period": 0
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/auth/approle/role/web/role-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"role_id": "2f0d8a3c-6a44-4c5e-9f9d-0d2b1c8f6e71"}
        })))
        .mount(&server)
        .await;

    let provider = Provider::new(config(&server)).unwrap();
    let role = provider.resource("vault_approle_auth_backend_role").unwrap();

    let mut raw = BTreeMap::new();
    raw.insert("role_name".to_string(), Value::from("web"));
    raw.insert("policies".to_string(), Value::strings(["web"]));
    raw.insert("bound_cidr_list".to_string(), Value::strings(["10.0.0.0/8"]));
    raw.insert("token_ttl".to_string(), Value::from(300i64));

    let mut data = role.schema().plan(raw, None).unwrap();
    role.create(&mut data, provider.client()).await.unwrap();

    assert_eq!(data.id(), Some("auth/approle/role/web"));
    assert_eq!(data.get_str("role_id"), "2f0d8a3c-6a44-4c5e-9f9d-0d2b1c8f6e71");
    assert_eq!(data.get_strings("bound_cidr_list"), vec!["10.0.0.0/8"]);
    assert_eq!(data.get_int("token_ttl"), 300);
}

#[tokio::test]
async fn test_auth_backend_import_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/sys/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token/": {"type": "token", "description": "token based credentials", "accessor": "auth_token_1", "local": false},
            "approle/": {"type": "approle", "description": "", "accessor": "auth_approle_2", "local": false},
            "request_id": "1f4d"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/sys/auth/approle/tune"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "default_lease_ttl": 2764800,
            "max_lease_ttl": 2764800,
            "listing_visibility": "",
            "passthrough_request_headers": ["X-Request-Id"]
        })))
        .mount(&server)
        .await;

    let provider = Provider::new(config(&server)).unwrap();
    let data = provider.import("vault_auth_backend", "approle").await.unwrap();

    assert_eq!(data.get_str("type"), "approle");
    assert_eq!(data.get_str("accessor"), "auth_approle_2");

    let tune = data.get("tune").and_then(Value::as_list).unwrap();
    let block = tune[0].as_map().unwrap();
    assert_eq!(block["default_lease_ttl"], Value::from("768h"));
    assert_eq!(block["passthrough_request_headers"], Value::strings(["X-Request-Id"]));
    assert!(!block.contains_key("audit_non_hmac_request_keys"));
}
