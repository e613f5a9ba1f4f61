//! Provider configuration.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

fn default_address() -> String {
    "https://127.0.0.1:8200".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Configuration for connecting to the Vault API.
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```
/// use vaultres::ProviderConfig;
///
/// let config = ProviderConfig::new("https://vault.internal:8200")
///     .with_token("s.xxxxxxxx")
///     .with_namespace("team-a")
///     .with_option("max_idle_connections", "4");
///
/// assert_eq!(config.namespace.as_deref(), Some("team-a"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Server address, without the `/v1` suffix
    #[serde(default = "default_address")]
    pub address: String,

    /// Token sent as `X-Vault-Token`
    #[serde(default)]
    pub token: Option<String>,

    /// Namespace sent as `X-Vault-Namespace`
    #[serde(default)]
    pub namespace: Option<String>,

    /// Per-request timeout in seconds (default: 60)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Accept any TLS certificate
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Client-specific options
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            token: None,
            namespace: None,
            timeout_secs: default_timeout_secs(),
            skip_tls_verify: false,
            options: HashMap::new(),
        }
    }
}

impl ProviderConfig {
    /// Creates a configuration for the given server address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Builds a configuration from the standard environment variables.
    ///
    /// - `VAULT_ADDR`: server address
    /// - `VAULT_TOKEN`: token
    /// - `VAULT_NAMESPACE`: namespace
    /// - `VAULT_SKIP_VERIFY`: `1` or `true` disables certificate checks
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(address) = lookup("VAULT_ADDR").filter(|v| !v.is_empty()) {
            config.address = address;
        }
        config.token = lookup("VAULT_TOKEN").filter(|v| !v.is_empty());
        config.namespace = lookup("VAULT_NAMESPACE").filter(|v| !v.is_empty());
        config.skip_tls_verify = lookup("VAULT_SKIP_VERIFY")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);
        config
    }

    /// Reads a JSON configuration file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Sets the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Disables TLS certificate verification.
    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    /// Adds a client-specific option.
    ///
    /// Options understood by the HTTP client:
    /// - `max_idle_connections`: idle connections kept per host (default 4)
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Gets a client-specific option value.
    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
