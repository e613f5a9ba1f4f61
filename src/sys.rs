//! Typed access to the `sys/` endpoints the resources use.
//!
//! These wrap a [`VaultClient`] the way the KV and PKI helpers of a client
//! library do: they only know paths and payload shapes.

use crate::client::VaultClient;
use crate::tune::{MountConfigInput, MountConfigOutput};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// An entry of the `sys/audit` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDevice {
    #[serde(rename = "type", default)]
    pub device_type: String,

    #[serde(default)]
    pub description: String,

    /// `None` when the server returned no options
    #[serde(default)]
    pub options: Option<HashMap<String, String>>,

    #[serde(default)]
    pub local: bool,

    #[serde(default)]
    pub path: String,
}

/// An entry of the `sys/auth` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthMount {
    #[serde(rename = "type", default)]
    pub mount_type: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub accessor: String,

    #[serde(default)]
    pub local: bool,
}

/// Options for enabling an audit device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnableAuditOptions {
    pub device_type: String,
    pub description: String,
    pub options: HashMap<String, String>,
    pub local: bool,
}

/// Options for enabling an auth method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnableAuthOptions {
    pub mount_type: String,
    pub description: String,
    pub local: bool,
    pub config: MountConfigInput,
}

/// Normalizes a mount path to the form the tables are keyed by.
///
/// # Example
///
/// ```
/// assert_eq!(vaultres::sys::table_key("/approle"), "approle/");
/// assert_eq!(vaultres::sys::table_key("file/"), "file/");
/// ```
pub fn table_key(path: &str) -> String {
    format!("{}/", path.trim_matches('/'))
}

fn trimmed(path: &str) -> &str {
    path.trim_matches('/')
}

/// Decodes a mount table, skipping entries that are not objects.
fn decode_table<T: for<'de> Deserialize<'de>>(
    data: serde_json::Map<String, JsonValue>,
) -> Result<BTreeMap<String, T>> {
    let mut table = BTreeMap::new();
    for (key, value) in data {
        if !value.is_object() {
            continue;
        }
        table.insert(key, serde_json::from_value(value)?);
    }
    Ok(table)
}

/// `sys/` operations over a client.
pub struct Sys<'a> {
    client: &'a dyn VaultClient,
}

impl<'a> Sys<'a> {
    pub fn new(client: &'a dyn VaultClient) -> Self {
        Self { client }
    }

    /// Registers an audit device at `path`.
    pub async fn enable_audit(&self, path: &str, opts: &EnableAuditOptions) -> Result<()> {
        let body = json!({
            "type": opts.device_type,
            "description": opts.description,
            "options": opts.options,
            "local": opts.local,
        });
        debug!(path = %path, device_type = %opts.device_type, "enabling audit device");
        self.client
            .write(&format!("sys/audit/{}", trimmed(path)), &body)
            .await?;
        Ok(())
    }

    /// Removes the audit device at `path`.
    pub async fn disable_audit(&self, path: &str) -> Result<()> {
        self.client
            .delete(&format!("sys/audit/{}", trimmed(path)))
            .await
    }

    /// Lists audit devices, keyed by path with a trailing slash.
    pub async fn list_audit(&self) -> Result<BTreeMap<String, AuditDevice>> {
        match self.client.read("sys/audit").await? {
            Some(secret) => decode_table(secret.data),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Enables an auth method at `path`.
    pub async fn enable_auth(&self, path: &str, opts: &EnableAuthOptions) -> Result<()> {
        let body = json!({
            "type": opts.mount_type,
            "description": opts.description,
            "local": opts.local,
            "config": opts.config,
        });
        debug!(path = %path, mount_type = %opts.mount_type, "enabling auth method");
        self.client
            .write(&format!("sys/auth/{}", trimmed(path)), &body)
            .await?;
        Ok(())
    }

    /// Disables the auth method at `path`.
    pub async fn disable_auth(&self, path: &str) -> Result<()> {
        self.client
            .delete(&format!("sys/auth/{}", trimmed(path)))
            .await
    }

    /// Lists auth methods, keyed by path with a trailing slash.
    pub async fn list_auth(&self) -> Result<BTreeMap<String, AuthMount>> {
        match self.client.read("sys/auth").await? {
            Some(secret) => decode_table(secret.data),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Tunes the auth mount at `path`.
    pub async fn tune_auth(&self, path: &str, config: &MountConfigInput) -> Result<()> {
        let body = serde_json::to_value(config)?;
        self.client
            .write(&format!("sys/auth/{}/tune", trimmed(path)), &body)
            .await?;
        Ok(())
    }

    /// Reads the tuning of the auth mount at `path`.
    ///
    /// Returns the zero value when the server sends nothing.
    pub async fn auth_config(&self, path: &str) -> Result<MountConfigOutput> {
        match self
            .client
            .read(&format!("sys/auth/{}/tune", trimmed(path)))
            .await?
        {
            Some(secret) => Ok(serde_json::from_value(JsonValue::Object(secret.data))?),
            None => Ok(MountConfigOutput::default()),
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::clients::mock::MockClient;

    #[tokio::test]
    async fn test_audit_roundtrip() {
        let client = MockClient::new();
        let sys = Sys::new(&client);

        let mut options = HashMap::new();
        options.insert("file_path".to_string(), "/var/log/audit.log".to_string());
        sys.enable_audit(
            "/file/",
            &EnableAuditOptions {
                device_type: "file".to_string(),
                description: "main log".to_string(),
                options,
                local: true,
            },
        )
        .await
        .unwrap();

        let audits = sys.list_audit().await.unwrap();
        let device = audits.get("file/").unwrap();
        assert_eq!(device.device_type, "file");
        assert_eq!(device.description, "main log");
        assert!(device.local);
        assert_eq!(
            device.options.as_ref().and_then(|o| o.get("file_path")).map(String::as_str),
            Some("/var/log/audit.log")
        );

        sys.disable_audit("file").await.unwrap();
        assert!(sys.list_audit().await.unwrap().is_empty());
    }

    #[test]
    fn test_decode_table_skips_non_object_entries() {
        let secret = serde_json::json!({
            "approle/": {"type": "approle", "accessor": "auth_approle_1"},
            "request_id": "abc"
        });
        let table: BTreeMap<String, AuthMount> =
            decode_table(secret.as_object().cloned().unwrap()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table["approle/"].accessor, "auth_approle_1");
    }

    #[tokio::test]
    async fn test_auth_tune_roundtrip() {
        let client = MockClient::new();
        let sys = Sys::new(&client);

        sys.enable_auth(
            "approle",
            &EnableAuthOptions {
                mount_type: "approle".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        sys.tune_auth(
            "approle",
            &MountConfigInput {
                default_lease_ttl: "10m".to_string(),
                passthrough_request_headers: Some(vec!["X-Custom".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let config = sys.auth_config("approle").await.unwrap();
        assert_eq!(config.default_lease_ttl, 600);
        assert_eq!(config.passthrough_request_headers, Some(vec!["X-Custom".to_string()]));

        let mounts = sys.list_auth().await.unwrap();
        assert_eq!(mounts["approle/"].mount_type, "approle");
        assert!(mounts["approle/"].accessor.starts_with("auth_approle_"));
    }

    #[test]
    fn test_table_key() {
        assert_eq!(table_key("approle"), "approle/");
        assert_eq!(table_key("/team/approle/"), "team/approle/");
    }
}
