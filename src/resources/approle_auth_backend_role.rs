//! AppRole auth backend role resource.
//!
//! Manages `auth/<backend>/role/<role_name>` and the role's RoleID at
//! `auth/<backend>/role/<role_name>/role-id`. The resource id is the role
//! path.

use crate::schema::{Attribute, AttributeType, ResourceData, Schema, Value};
use crate::validation::{validate_cidr_list, validate_path_segment, validate_single_segment};
use crate::{ProviderError, Resource, Result, VaultClient};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value as JsonValue};
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const TYPE_NAME: &str = "vault_approle_auth_backend_role";

static BACKEND_FROM_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^auth/(.+)/role/.+$").expect("backend pattern compiles"));

static ROLE_NAME_FROM_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^auth/.+/role/(.+)$").expect("role pattern compiles"));

/// Integer attributes sent to and read from the role endpoint as is.
const NUMERIC_FIELDS: &[&str] = &[
    "secret_id_num_uses",
    "secret_id_ttl",
    "token_num_uses",
    "token_ttl",
    "token_max_ttl",
    "period",
];

fn trim_slashes(s: &str) -> String {
    s.trim_matches('/').to_string()
}

/// Builds the API path of a role.
///
/// # Example
///
/// ```
/// use vaultres::resources::approle_auth_backend_role::role_path;
///
/// assert_eq!(role_path("/approle/", "web"), "auth/approle/role/web");
/// ```
pub fn role_path(backend: &str, role: &str) -> String {
    format!("auth/{}/role/{}", backend.trim_matches('/'), role.trim_matches('/'))
}

fn capture(re: &Regex, path: &str, what: &str) -> Result<String> {
    let invalid = |reason: String| ProviderError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    let caps = re
        .captures(path)
        .ok_or_else(|| invalid(format!("no {} found", what)))?;
    if caps.len() != 2 {
        return Err(invalid(format!(
            "unexpected number of matches ({}) for {}",
            caps.len(),
            what
        )));
    }
    Ok(caps[1].to_string())
}

/// Extracts the backend from a role path.
pub fn backend_from_path(path: &str) -> Result<String> {
    capture(&BACKEND_FROM_PATH, path, "backend")
}

/// Extracts the role name from a role path.
pub fn role_name_from_path(path: &str) -> Result<String> {
    capture(&ROLE_NAME_FROM_PATH, path, "role")
}

/// Reads an integer field of a role response.
///
/// An absent field reads as zero; anything but an integer is an error.
fn json_int(data: &Map<String, JsonValue>, field: &str) -> Result<i64> {
    let decode_err = |value: &JsonValue| ProviderError::Decode {
        field: field.to_string(),
        value: value.to_string(),
    };
    match data.get(field) {
        None | Some(JsonValue::Null) => Ok(0),
        Some(value @ JsonValue::Number(n)) => n.as_i64().ok_or_else(|| decode_err(value)),
        Some(other) => Err(decode_err(other)),
    }
}

fn json_strings(value: Option<&JsonValue>) -> Vec<String> {
    value
        .and_then(JsonValue::as_array)
        .map(|items| items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

/// AppRole auth backend role.
pub struct AppRoleAuthBackendRoleResource {
    schema: Schema,
}

impl AppRoleAuthBackendRoleResource {
    pub fn new() -> Self {
        let schema = Schema::new(vec![
            Attribute::new("role_name", AttributeType::String)
                .required()
                .force_new()
                .validate(validate_single_segment)
                .description("Name of the role."),
            Attribute::new("role_id", AttributeType::String)
                .optional()
                .computed()
                .description("The RoleID of the role. Autogenerated if not set."),
            Attribute::new("bind_secret_id", AttributeType::Bool)
                .optional()
                .default_value(true)
                .description(
                    "Whether or not to require secret_id to be present when logging in using this AppRole.",
                ),
            Attribute::new("bound_cidr_list", AttributeType::Set)
                .optional()
                .validate(validate_cidr_list)
                .description("List of CIDR blocks that can log in using the AppRole."),
            Attribute::new("policies", AttributeType::Set)
                .optional()
                .description("Policies to be set on tokens issued using this AppRole."),
            Attribute::new("secret_id_num_uses", AttributeType::Int)
                .optional()
                .description(
                    "Number of times which a particular SecretID can be used to fetch a token from this AppRole, after which the SecretID will expire. Leaving this unset or setting it to 0 will allow unlimited uses.",
                ),
            Attribute::new("secret_id_ttl", AttributeType::Int)
                .optional()
                .description("Number of seconds a SecretID remains valid for."),
            Attribute::new("token_num_uses", AttributeType::Int)
                .optional()
                .description(
                    "Number of times issued tokens can be used. Setting this to 0 or leaving it unset means unlimited uses.",
                ),
            Attribute::new("token_ttl", AttributeType::Int)
                .optional()
                .description(
                    "Default number of seconds to set as the TTL for issued tokens and at renewal time.",
                ),
            Attribute::new("token_max_ttl", AttributeType::Int)
                .optional()
                .description("Number of seconds after which issued tokens can no longer be renewed."),
            Attribute::new("period", AttributeType::Int)
                .optional()
                .description(
                    "Number of seconds to set the TTL to for issued tokens upon renewal. Makes the token a periodic token, which will never expire as long as it is renewed before the TTL each period.",
                ),
            Attribute::new("backend", AttributeType::String)
                .optional()
                .force_new()
                .default_value("approle")
                .normalize(trim_slashes)
                .validate(validate_path_segment)
                .description("Unique name of the auth backend to configure."),
        ]);
        Self { schema }
    }

    async fn write_role_id(
        &self,
        path: &str,
        role_id: &str,
        operation: &str,
        client: &dyn VaultClient,
    ) -> Result<()> {
        debug!(path = %path, "writing AppRole auth backend role RoleID");
        client
            .write(&format!("{}/role-id", path), &json!({ "role_id": role_id }))
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, operation, format!("{}/role-id", path), e))?;
        debug!(path = %path, "wrote AppRole auth backend role RoleID");
        Ok(())
    }
}

impl Default for AppRoleAuthBackendRoleResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resource for AppRoleAuthBackendRoleResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn create(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let path = role_path(data.get_str("backend"), data.get_str("role_name"));

        debug!(path = %path, "writing AppRole auth backend role");
        let mut payload = Map::new();
        let policies = data.get_strings("policies");
        if !policies.is_empty() {
            payload.insert("policies".to_string(), json!(policies));
        }
        let cidrs = data.get_strings("bound_cidr_list");
        if !cidrs.is_empty() {
            payload.insert("bound_cidr_list".to_string(), json!(cidrs.join(",")));
        }
        if let Some(bind) = data.get_ok_exists("bind_secret_id").and_then(Value::as_bool) {
            payload.insert("bind_secret_id".to_string(), json!(bind));
        }
        for field in NUMERIC_FIELDS {
            if let Some(v) = data.get_ok(field).and_then(Value::as_int) {
                payload.insert(field.to_string(), json!(v));
            }
        }

        client
            .write(&path, &JsonValue::Object(payload))
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "create", &path, e))?;
        data.set_id(&path);
        debug!(path = %path, "wrote AppRole auth backend role");

        if let Some(role_id) = data.get_ok("role_id").and_then(Value::as_str).map(str::to_string) {
            self.write_role_id(&path, &role_id, "create", client).await?;
        }

        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let path = data.id_or_empty().to_string();
        let backend = backend_from_path(&path)?;
        let role = role_name_from_path(&path)?;

        debug!(path = %path, "reading AppRole auth backend role");
        let resp = client
            .read(&path)
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "read", &path, e))?;
        debug!(path = %path, "read AppRole auth backend role");

        let Some(resp) = resp else {
            warn!(path = %path, "AppRole auth backend role not found, removing from state");
            data.clear_id();
            return Ok(());
        };

        let policies = json_strings(resp.data.get("policies"));

        // Servers before 0.10 return the CIDR list comma-joined.
        let cidrs: Vec<String> = match resp.data.get("bound_cidr_list") {
            Some(JsonValue::String(joined)) if !joined.is_empty() => {
                joined.split(',').map(str::to_string).collect()
            }
            other => json_strings(other),
        };

        let mut numbers = Vec::with_capacity(NUMERIC_FIELDS.len());
        for field in NUMERIC_FIELDS {
            numbers.push((*field, json_int(&resp.data, field)?));
        }

        data.set("backend", backend);
        data.set("role_name", role);
        data.set("policies", Value::string_set(policies));
        data.set("bound_cidr_list", Value::string_set(cidrs));
        for (field, value) in numbers {
            data.set(field, value);
        }
        if let Some(bind) = resp.data.get("bind_secret_id").and_then(JsonValue::as_bool) {
            data.set("bind_secret_id", bind);
        }

        debug!(path = %path, "reading AppRole auth backend role RoleID");
        let role_id_path = format!("{}/role-id", path);
        let resp = client
            .read(&role_id_path)
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "read", &role_id_path, e))?;
        debug!(path = %path, "read AppRole auth backend role RoleID");
        if let Some(role_id) = resp.as_ref().and_then(|r| r.str_field("role_id")) {
            data.set("role_id", role_id);
        }

        Ok(())
    }

    async fn update(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let path = data.id_or_empty().to_string();

        debug!(path = %path, "updating AppRole auth backend role");
        let mut payload = Map::new();
        payload.insert("policies".to_string(), json!(data.get_strings("policies")));
        payload.insert(
            "bound_cidr_list".to_string(),
            json!(data.get_strings("bound_cidr_list").join(",")),
        );
        payload.insert("bind_secret_id".to_string(), json!(data.get_bool("bind_secret_id")));
        for field in NUMERIC_FIELDS {
            payload.insert(field.to_string(), json!(data.get_int(field)));
        }

        client
            .write(&path, &JsonValue::Object(payload))
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "update", &path, e))?;
        debug!(path = %path, "updated AppRole auth backend role");

        if data.has_change("role_id") {
            let role_id = data.get_str("role_id").to_string();
            self.write_role_id(&path, &role_id, "update", client).await?;
        }

        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let path = data.id_or_empty().to_string();

        debug!(path = %path, "deleting AppRole auth backend role");
        match client.delete(&path).await {
            Ok(()) => debug!(path = %path, "deleted AppRole auth backend role"),
            Err(e) if e.is_not_found() => {
                debug!(path = %path, "AppRole auth backend role not found, removing from state");
            }
            Err(e) => return Err(ProviderError::resource_op(TYPE_NAME, "delete", &path, e)),
        }

        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &ResourceData, client: &dyn VaultClient) -> Result<bool> {
        let path = data.id_or_empty();

        debug!(path = %path, "checking if AppRole auth backend role exists");
        let resp = client
            .read(path)
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "exists", path, e))?;
        debug!(path = %path, "checked if AppRole auth backend role exists");

        Ok(resp.is_some())
    }
}

/// Registers the resource with the factory.
pub fn register() {
    crate::factory::register_resource(TYPE_NAME, || Box::new(AppRoleAuthBackendRoleResource::new()));
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::clients::mock::MockClient;
    use std::collections::BTreeMap;

    fn config(pairs: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn plan(pairs: Vec<(&str, Value)>) -> ResourceData {
        AppRoleAuthBackendRoleResource::new()
            .schema()
            .plan(config(pairs), None)
            .unwrap()
    }

    #[test]
    fn test_role_path() {
        assert_eq!(role_path("approle", "web"), "auth/approle/role/web");
        assert_eq!(role_path("/team/approle/", "/web/"), "auth/team/approle/role/web");
    }

    #[test]
    fn test_path_parsing() {
        let path = "auth/team/approle/role/web";
        assert_eq!(backend_from_path(path).unwrap(), "team/approle");
        assert_eq!(role_name_from_path(path).unwrap(), "web");

        let err = backend_from_path("sys/audit/file").unwrap_err();
        assert!(err.to_string().contains("no backend found"));
        let err = role_name_from_path("auth/approle/web").unwrap_err();
        assert!(err.to_string().contains("no role found"));
    }

    #[test]
    fn test_json_int() {
        let data = json!({"a": 60, "b": "60", "c": null, "d": 1.5})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(json_int(&data, "a").unwrap(), 60);
        assert_eq!(json_int(&data, "c").unwrap(), 0);
        assert_eq!(json_int(&data, "missing").unwrap(), 0);
        assert!(json_int(&data, "b").is_err());
        assert!(json_int(&data, "d").is_err());
    }

    #[tokio::test]
    async fn test_create_writes_only_set_fields() {
        let client = MockClient::new();
        let resource = AppRoleAuthBackendRoleResource::new();
        let mut data = plan(vec![
            ("role_name", "web".into()),
            ("policies", Value::strings(["web", "default"])),
            ("bound_cidr_list", Value::strings(["10.0.0.0/8", "192.168.0.0/16"])),
            ("token_ttl", 300i64.into()),
            ("bind_secret_id", false.into()),
        ]);

        resource.create(&mut data, &client).await.unwrap();

        assert_eq!(data.id(), Some("auth/approle/role/web"));
        let writes = client.writes_to("auth/approle/role/web").await;
        assert_eq!(
            writes,
            vec![json!({
                "policies": ["default", "web"],
                "bound_cidr_list": "10.0.0.0/8,192.168.0.0/16",
                "bind_secret_id": false,
                "token_ttl": 300
            })]
        );

        assert_eq!(data.get_int("token_ttl"), 300);
        assert_eq!(data.get_int("period"), 0);
        assert!(!data.get_bool("bind_secret_id"));
        assert_eq!(data.get_strings("bound_cidr_list"), vec!["10.0.0.0/8", "192.168.0.0/16"]);
        assert!(!data.get_str("role_id").is_empty());
        assert!(client.writes_to("auth/approle/role/web/role-id").await.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_role_id() {
        let client = MockClient::new();
        let resource = AppRoleAuthBackendRoleResource::new();
        let mut data = plan(vec![
            ("role_name", "ci".into()),
            ("backend", "/machines/".into()),
            ("role_id", "fixed-role-id".into()),
        ]);

        resource.create(&mut data, &client).await.unwrap();

        assert_eq!(data.id(), Some("auth/machines/role/ci"));
        assert_eq!(data.get_str("backend"), "machines");
        assert_eq!(data.get_str("role_id"), "fixed-role-id");
        assert_eq!(
            client.writes_to("auth/machines/role/ci/role-id").await,
            vec![json!({"role_id": "fixed-role-id"})]
        );
    }

    #[tokio::test]
    async fn test_read_legacy_cidr_string() {
        let client = MockClient::new();
        client
            .set_secret(
                "auth/approle/role/legacy",
                json!({
                    "policies": ["a"],
                    "bound_cidr_list": "10.1.0.0/16,10.2.0.0/16",
                    "bind_secret_id": true,
                    "secret_id_ttl": 600,
                    "period": 0
                }),
            )
            .await;

        let resource = AppRoleAuthBackendRoleResource::new();
        let mut data = resource.import("auth/approle/role/legacy").unwrap();
        resource.read(&mut data, &client).await.unwrap();

        assert_eq!(data.get_str("role_name"), "legacy");
        assert_eq!(data.get_str("backend"), "approle");
        assert_eq!(data.get_strings("bound_cidr_list"), vec!["10.1.0.0/16", "10.2.0.0/16"]);
        assert_eq!(data.get_int("secret_id_ttl"), 600);
        assert!(data.get_bool("bind_secret_id"));
        assert!(data.get("role_id").is_none());
    }

    #[tokio::test]
    async fn test_read_rejects_non_numeric_ttl() {
        let client = MockClient::new();
        client
            .set_secret("auth/approle/role/bad", json!({"policies": [], "token_ttl": "1h"}))
            .await;

        let resource = AppRoleAuthBackendRoleResource::new();
        let mut data = ResourceData::with_id("auth/approle/role/bad");
        let err = resource.read(&mut data, &client).await.unwrap_err();
        assert_eq!(err.to_string(), "expected token_ttl \"1h\" to be a number, isn't");
    }

    #[tokio::test]
    async fn test_read_missing_clears_id() {
        let client = MockClient::new();
        let resource = AppRoleAuthBackendRoleResource::new();
        let mut data = ResourceData::with_id("auth/approle/role/gone");

        resource.read(&mut data, &client).await.unwrap();
        assert!(data.id().is_none());
    }

    #[tokio::test]
    async fn test_read_invalid_id() {
        let client = MockClient::new();
        let resource = AppRoleAuthBackendRoleResource::new();
        let mut data = ResourceData::with_id("approle/web");

        let err = resource.read(&mut data, &client).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidPath { .. }));
        assert!(client.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_writes_all_fields_and_changed_role_id() {
        let client = MockClient::new();
        let resource = AppRoleAuthBackendRoleResource::new();
        let mut state = plan(vec![("role_name", "web".into()), ("token_ttl", 300i64.into())]);
        resource.create(&mut state, &client).await.unwrap();

        let mut planned = resource
            .schema()
            .plan(
                config(vec![
                    ("role_name", "web".into()),
                    ("policies", Value::strings(["ops"])),
                    ("role_id", "rotated".into()),
                ]),
                Some(&state),
            )
            .unwrap();
        assert!(planned.has_change("role_id"));

        resource.update(&mut planned, &client).await.unwrap();

        let writes = client.writes_to("auth/approle/role/web").await;
        assert_eq!(
            writes.last().unwrap(),
            &json!({
                "policies": ["ops"],
                "bound_cidr_list": "",
                "bind_secret_id": true,
                "secret_id_num_uses": 0,
                "secret_id_ttl": 0,
                "token_num_uses": 0,
                "token_ttl": 0,
                "token_max_ttl": 0,
                "period": 0
            })
        );
        assert_eq!(planned.get_str("role_id"), "rotated");
        assert_eq!(planned.get_int("token_ttl"), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_role_id_when_unchanged() {
        let client = MockClient::new();
        let resource = AppRoleAuthBackendRoleResource::new();
        let mut state = plan(vec![("role_name", "web".into())]);
        resource.create(&mut state, &client).await.unwrap();
        let generated = state.get_str("role_id").to_string();

        let mut planned = resource
            .schema()
            .plan(config(vec![("role_name", "web".into()), ("period", 60i64.into())]), Some(&state))
            .unwrap();
        resource.update(&mut planned, &client).await.unwrap();

        assert!(client.writes_to("auth/approle/role/web/role-id").await.is_empty());
        assert_eq!(planned.get_str("role_id"), generated);
        assert_eq!(planned.get_int("period"), 60);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let client = MockClient::new();
        let resource = AppRoleAuthBackendRoleResource::new();
        let mut data = plan(vec![("role_name", "web".into())]);
        resource.create(&mut data, &client).await.unwrap();

        let mut again = data.clone();
        resource.delete(&mut data, &client).await.unwrap();
        assert!(data.id().is_none());
        assert!(!resource.exists(&again, &client).await.unwrap());

        resource.delete(&mut again, &client).await.unwrap();
        assert!(again.id().is_none());
    }

    #[tokio::test]
    async fn test_delete_propagates_failures() {
        let mut client = MockClient::new();
        client.delete_error = Some(ProviderError::Api {
            status: 500,
            errors: vec!["internal error".to_string()],
        });

        let resource = AppRoleAuthBackendRoleResource::new();
        let mut data = ResourceData::with_id("auth/approle/role/web");
        let err = resource.delete(&mut data, &client).await.unwrap_err();

        assert!(!err.is_not_found());
        assert!(err.to_string().contains(TYPE_NAME));
        assert_eq!(data.id(), Some("auth/approle/role/web"));
    }

    #[tokio::test]
    async fn test_exists_propagates_read_errors() {
        let mut client = MockClient::new();
        client.read_error = Some(ProviderError::Api { status: 403, errors: vec![] });

        let resource = AppRoleAuthBackendRoleResource::new();
        let data = ResourceData::with_id("auth/approle/role/web");
        assert!(resource.exists(&data, &client).await.is_err());
    }

    #[test]
    fn test_schema_validation() {
        let schema = AppRoleAuthBackendRoleResource::new().schema().clone();
        let err = schema
            .plan(
                config(vec![
                    ("role_name", "web".into()),
                    ("bound_cidr_list", Value::strings(["not-a-cidr"])),
                ]),
                None,
            )
            .unwrap_err();
        assert!(err.to_string().contains("bound_cidr_list"));

        let err = schema
            .plan(config(vec![("role_name", "x/role/y".into())]), None)
            .unwrap_err();
        assert!(err.to_string().contains("role_name"));

        let data = schema.plan(config(vec![("role_name", "web".into())]), None).unwrap();
        assert!(data.get_bool("bind_secret_id"));
        assert_eq!(data.get_str("backend"), "approle");
    }
}
