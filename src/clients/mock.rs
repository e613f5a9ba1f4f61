//! Mock client for testing.
//!
//! This client keeps a complete in-memory model of the paths the resources
//! touch, with error injection for testing failure handling.

use crate::client::{Secret, VaultClient};
use crate::tune::MountConfigOutput;
use crate::{duration, ProviderError, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A request the mock client received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// "read", "write", "delete" or "list"
    pub operation: &'static str,
    pub path: String,
    /// Body of a write
    pub body: Option<JsonValue>,
}

#[derive(Default)]
struct MockState {
    secrets: BTreeMap<String, Map<String, JsonValue>>,
    audits: BTreeMap<String, JsonValue>,
    auths: BTreeMap<String, JsonValue>,
    tunes: BTreeMap<String, MountConfigOutput>,
    requests: Vec<RecordedRequest>,
}

/// Mock client for testing.
///
/// Generic paths behave like a key-value store where writes merge into the
/// existing object. `sys/audit` and `sys/auth` are modeled as mount
/// tables, `sys/auth/<path>/tune` as per-mount tuning, and writing an
/// AppRole role generates its RoleID the way the server does.
///
/// # Example
///
/// ```
/// use vaultres::clients::mock::MockClient;
/// use vaultres::{ProviderError, VaultClient};
///
/// #[tokio::main]
/// async fn main() -> vaultres::Result<()> {
///     let mut client = MockClient::new();
///
///     // Pre-populate with test data
///     client
///         .set_secret("auth/approle/role/web", serde_json::json!({"policies": ["web"]}))
///         .await;
///     assert!(client.read("auth/approle/role/web").await?.is_some());
///
///     // Test error conditions
///     client.read_error = Some(ProviderError::Api { status: 403, errors: vec![] });
///     assert!(client.read("auth/approle/role/web").await.is_err());
///
///     Ok(())
/// }
/// ```
pub struct MockClient {
    state: Arc<RwLock<MockState>>,

    /// Error to return from `read()`
    pub read_error: Option<ProviderError>,
    /// Error to return from `write()`
    pub write_error: Option<ProviderError>,
    /// Error to return from `delete()`
    pub delete_error: Option<ProviderError>,
    /// Error to return from `list()`
    pub list_error: Option<ProviderError>,
}

impl MockClient {
    /// Creates a new mock client with empty storage.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            read_error: None,
            write_error: None,
            delete_error: None,
            list_error: None,
        }
    }

    /// Pre-populates a generic path with a JSON object.
    ///
    /// Useful for setting up test fixtures.
    pub async fn set_secret(&self, path: impl Into<String>, data: JsonValue) {
        let mut state = self.state.write().await;
        state.secrets.insert(path.into(), into_object(data));
    }

    /// Returns what is stored at a generic path.
    pub async fn secret(&self, path: &str) -> Option<Map<String, JsonValue>> {
        let state = self.state.read().await;
        state.secrets.get(path).cloned()
    }

    /// All requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        let state = self.state.read().await;
        state.requests.clone()
    }

    /// Writes received so far for one path.
    pub async fn writes_to(&self, path: &str) -> Vec<JsonValue> {
        let state = self.state.read().await;
        state
            .requests
            .iter()
            .filter(|r| r.operation == "write" && r.path == path)
            .filter_map(|r| r.body.clone())
            .collect()
    }

    async fn record(&self, operation: &'static str, path: &str, body: Option<&JsonValue>) {
        let mut state = self.state.write().await;
        state.requests.push(RecordedRequest {
            operation,
            path: path.to_string(),
            body: body.cloned(),
        });
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuilds an injected error so it can be returned more than once.
fn replay(err: &ProviderError) -> ProviderError {
    match err {
        ProviderError::Api { status, errors } => ProviderError::Api {
            status: *status,
            errors: errors.clone(),
        },
        ProviderError::NotFound(what) => ProviderError::NotFound(what.clone()),
        other => ProviderError::Other(anyhow::anyhow!("{}", other)),
    }
}

fn not_found(path: &str) -> ProviderError {
    ProviderError::Api {
        status: 404,
        errors: vec![format!("no entry at {}", path)],
    }
}

fn bad_request(message: impl Into<String>) -> ProviderError {
    ProviderError::Api {
        status: 400,
        errors: vec![message.into()],
    }
}

fn into_object(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(map) => map,
        _ => Map::new(),
    }
}

/// `auth/<mount>/role/<name>`, without a sub-path.
fn is_approle_role_path(path: &str) -> bool {
    let parts: Vec<&str> = path.split('/').collect();
    parts.len() == 4 && parts[0] == "auth" && parts[2] == "role"
}

/// Applies a tune request body to stored tuning, the way the server does.
fn apply_tune(tune: &mut MountConfigOutput, body: &Map<String, JsonValue>) -> Result<()> {
    let strings = |v: &JsonValue| -> Vec<String> {
        v.as_array()
            .map(|items| items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    };

    for (key, value) in body {
        match key.as_str() {
            "default_lease_ttl" | "max_lease_ttl" => {
                let text = value.as_str().unwrap_or_default();
                let secs = duration::parse(key, text)
                    .map_err(|e| bad_request(e.to_string()))?
                    .as_secs();
                if key == "default_lease_ttl" {
                    tune.default_lease_ttl = secs;
                } else {
                    tune.max_lease_ttl = secs;
                }
            }
            "audit_non_hmac_request_keys" => tune.audit_non_hmac_request_keys = Some(strings(value)),
            "audit_non_hmac_response_keys" => {
                tune.audit_non_hmac_response_keys = Some(strings(value))
            }
            "passthrough_request_headers" => tune.passthrough_request_headers = Some(strings(value)),
            "listing_visibility" => {
                tune.listing_visibility = value.as_str().unwrap_or_default().to_string()
            }
            _ => {}
        }
    }
    Ok(())
}

#[async_trait]
impl VaultClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn read(&self, path: &str) -> Result<Option<Secret>> {
        self.record("read", path, None).await;
        if let Some(ref err) = self.read_error {
            return Err(replay(err));
        }

        let state = self.state.read().await;
        if path == "sys/audit" {
            return Ok(Some(Secret::new(state.audits.clone().into_iter().collect())));
        }
        if path == "sys/auth" {
            return Ok(Some(Secret::new(state.auths.clone().into_iter().collect())));
        }
        if let Some(mount) = path.strip_prefix("sys/auth/").and_then(|p| p.strip_suffix("/tune")) {
            return Ok(state
                .tunes
                .get(&format!("{}/", mount))
                .map(|tune| Secret::new(into_object(json!(tune)))));
        }

        Ok(state.secrets.get(path).cloned().map(Secret::new))
    }

    async fn write(&self, path: &str, data: &JsonValue) -> Result<Option<Secret>> {
        self.record("write", path, Some(data)).await;
        if let Some(ref err) = self.write_error {
            return Err(replay(err));
        }

        let body = into_object(data.clone());
        let mut state = self.state.write().await;

        if let Some(mount) = path.strip_prefix("sys/audit/") {
            let key = format!("{}/", mount.trim_matches('/'));
            if state.audits.contains_key(&key) {
                return Err(bad_request(format!("path already in use at {}", key)));
            }
            let entry = json!({
                "type": body.get("type").cloned().unwrap_or(JsonValue::Null),
                "description": body.get("description").cloned().unwrap_or(json!("")),
                "options": body.get("options").cloned().unwrap_or(JsonValue::Null),
                "local": body.get("local").cloned().unwrap_or(json!(false)),
                "path": key,
            });
            state.audits.insert(key, entry);
            return Ok(None);
        }

        if let Some(mount) = path.strip_prefix("sys/auth/").and_then(|p| p.strip_suffix("/tune")) {
            let key = format!("{}/", mount.trim_matches('/'));
            let MockState { auths, tunes, .. } = &mut *state;
            let entry = auths
                .get_mut(&key)
                .ok_or_else(|| bad_request(format!("no auth mount at {}", key)))?;
            if let Some(description) = body.get("description") {
                entry["description"] = description.clone();
            }
            apply_tune(tunes.entry(key).or_default(), &body)?;
            return Ok(None);
        }

        if let Some(mount) = path.strip_prefix("sys/auth/") {
            let key = format!("{}/", mount.trim_matches('/'));
            if state.auths.contains_key(&key) {
                return Err(bad_request(format!("path is already in use at {}", key)));
            }
            let auth_type = body.get("type").and_then(JsonValue::as_str).unwrap_or_default();
            let accessor = format!("auth_{}_{}", auth_type, &uuid::Uuid::new_v4().simple().to_string()[..8]);
            let entry = json!({
                "type": auth_type,
                "description": body.get("description").cloned().unwrap_or(json!("")),
                "local": body.get("local").cloned().unwrap_or(json!(false)),
                "accessor": accessor,
            });
            let mut tune = MountConfigOutput::default();
            if let Some(JsonValue::Object(config)) = body.get("config") {
                apply_tune(&mut tune, config)?;
            }
            state.auths.insert(key.clone(), entry);
            state.tunes.insert(key, tune);
            return Ok(None);
        }

        state
            .secrets
            .entry(path.to_string())
            .or_default()
            .extend(body);

        if is_approle_role_path(path) {
            state
                .secrets
                .entry(format!("{}/role-id", path))
                .or_insert_with(|| into_object(json!({"role_id": uuid::Uuid::new_v4().to_string()})));
        }

        Ok(None)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.record("delete", path, None).await;
        if let Some(ref err) = self.delete_error {
            return Err(replay(err));
        }

        let mut state = self.state.write().await;

        if let Some(mount) = path.strip_prefix("sys/audit/") {
            let key = format!("{}/", mount.trim_matches('/'));
            return state.audits.remove(&key).map(|_| ()).ok_or_else(|| not_found(path));
        }

        if let Some(mount) = path.strip_prefix("sys/auth/") {
            let key = format!("{}/", mount.trim_matches('/'));
            state.tunes.remove(&key);
            return state.auths.remove(&key).map(|_| ()).ok_or_else(|| not_found(path));
        }

        state.secrets.remove(path).ok_or_else(|| not_found(path))?;
        if is_approle_role_path(path) {
            state.secrets.remove(&format!("{}/role-id", path));
        }
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Option<Secret>> {
        self.record("list", path, None).await;
        if let Some(ref err) = self.list_error {
            return Err(replay(err));
        }

        let prefix = format!("{}/", path.trim_end_matches('/'));
        let state = self.state.read().await;

        let mut keys: Vec<String> = state
            .secrets
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(|rest| match rest.split_once('/') {
                Some((first, _)) => format!("{}/", first),
                None => rest.to_string(),
            })
            .collect();
        keys.dedup();

        if keys.is_empty() {
            return Ok(None);
        }
        Ok(Some(Secret::new(into_object(json!({ "keys": keys })))))
    }
}
