//! Client trait for the path-addressed Vault API.
//!
//! This module defines the [`VaultClient`] trait that every transport must
//! satisfy, and the [`Secret`] envelope the API wraps responses in.

use crate::{ProviderError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

/// Response envelope returned by the Vault API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Secret {
    /// Payload of the response
    pub data: Map<String, JsonValue>,

    /// Warnings attached by the server
    pub warnings: Vec<String>,

    pub lease_id: String,

    pub lease_duration: u64,

    pub renewable: bool,
}

/// Keys of the envelope itself, as opposed to payload keys.
const ENVELOPE_KEYS: &[&str] = &[
    "request_id",
    "lease_id",
    "lease_duration",
    "renewable",
    "data",
    "wrap_info",
    "warnings",
    "auth",
    "mount_type",
];

impl Secret {
    /// Wraps a payload map.
    pub fn new(data: Map<String, JsonValue>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Decodes a response body.
    ///
    /// Older `sys/*` listing endpoints return their entries at the top level
    /// instead of under `data`; in that case the non-envelope top-level keys
    /// become the payload. Null envelope fields read as their defaults.
    pub fn from_body(body: JsonValue) -> Result<Self> {
        let JsonValue::Object(mut map) = body else {
            return Err(ProviderError::Other(anyhow::anyhow!(
                "expected a JSON object in response body"
            )));
        };

        let mut secret = Secret {
            warnings: map
                .get("warnings")
                .and_then(JsonValue::as_array)
                .map(|w| w.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
            lease_id: map
                .get("lease_id")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string(),
            lease_duration: map
                .get("lease_duration")
                .and_then(JsonValue::as_u64)
                .unwrap_or_default(),
            renewable: map
                .get("renewable")
                .and_then(JsonValue::as_bool)
                .unwrap_or_default(),
            ..Secret::default()
        };

        match map.remove("data") {
            Some(JsonValue::Object(data)) => secret.data = data,
            _ => {
                secret.data = map
                    .into_iter()
                    .filter(|(key, _)| !ENVELOPE_KEYS.contains(&key.as_str()))
                    .collect();
            }
        }
        Ok(secret)
    }

    /// A payload field as a string slice.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(JsonValue::as_str)
    }
}

/// A transport for the Vault HTTP API.
///
/// Paths are relative to `/v1/` and never start with a slash. All
/// implementations must be `Send + Sync` so one client can be shared by
/// every resource.
///
/// # Implementations
///
/// - [`HttpClient`](crate::clients::http::HttpClient): reqwest over HTTPS
/// - [`MockClient`](crate::clients::mock::MockClient): in-memory, with error
///   injection
#[async_trait]
pub trait VaultClient: Send + Sync {
    /// Returns the client name (e.g., "http", "mock").
    fn name(&self) -> &str;

    /// Reads a path.
    ///
    /// Returns `Ok(None)` when nothing exists at the path.
    async fn read(&self, path: &str) -> Result<Option<Secret>>;

    /// Writes `data` (a JSON object) to a path.
    ///
    /// Returns the response envelope when the server sends one.
    async fn write(&self, path: &str, data: &JsonValue) -> Result<Option<Secret>>;

    /// Deletes a path.
    ///
    /// # Errors
    ///
    /// A missing path is reported as an error for which
    /// [`ProviderError::is_not_found`](crate::ProviderError::is_not_found)
    /// is true, so callers can tell "already absent" from a failure.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Lists keys under a path.
    ///
    /// Returns `Ok(None)` when nothing exists at the path.
    async fn list(&self, path: &str) -> Result<Option<Secret>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_body_with_data() {
        let secret = Secret::from_body(json!({
            "request_id": "abc",
            "lease_duration": 0,
            "renewable": false,
            "data": {"role_id": "1234"},
            "warnings": ["deprecated field"],
            "wrap_info": null
        }))
        .unwrap();

        assert_eq!(secret.str_field("role_id"), Some("1234"));
        assert_eq!(secret.warnings, vec!["deprecated field".to_string()]);
    }

    #[test]
    fn test_from_body_without_data() {
        let secret = Secret::from_body(json!({
            "request_id": "abc",
            "file/": {"type": "file", "description": "", "options": {"file_path": "/tmp/a"}},
            "syslog/": {"type": "syslog"}
        }))
        .unwrap();

        assert_eq!(secret.data.len(), 2);
        assert!(secret.data.contains_key("file/"));
        assert!(!secret.data.contains_key("request_id"));
    }

    #[test]
    fn test_from_body_tolerates_null_envelope_fields() {
        let secret = Secret::from_body(json!({
            "data": {"policies": ["default"]},
            "warnings": null,
            "lease_id": null
        }))
        .unwrap();

        assert!(secret.warnings.is_empty());
        assert!(secret.lease_id.is_empty());
        assert!(secret.data.contains_key("policies"));
    }

    #[test]
    fn test_from_body_rejects_non_object() {
        assert!(Secret::from_body(json!(["a", "b"])).is_err());
    }
}
