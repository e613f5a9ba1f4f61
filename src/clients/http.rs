//! HTTP client for the Vault API.

use crate::client::{Secret, VaultClient};
use crate::{ProviderConfig, ProviderError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

/// Error body returned by the API on failure.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// Vault API client over reqwest.
///
/// Sends the configured token and namespace with every request. Performs
/// no retries and no login; the token must already be valid.
pub struct HttpClient {
    http: Client,
    address: String,
    token: Option<String>,
    namespace: Option<String>,
}

impl HttpClient {
    /// Creates a client from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying client cannot be
    /// built (e.g. TLS backend initialization fails).
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let max_idle = config
            .get_option("max_idle_connections")
            .and_then(|v| v.parse().ok())
            .unwrap_or(4);

        let http = ClientBuilder::new()
            .timeout(config.timeout())
            .pool_max_idle_per_host(max_idle)
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()?;

        let client = Self {
            http,
            address: config.address.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            namespace: config.namespace.clone(),
        };

        info!(address = %client.address, "configured Vault HTTP client");

        Ok(client)
    }

    /// Get the base address.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path.trim_start_matches('/'))
    }

    /// Execute a single request.
    ///
    /// Returns `Ok(None)` for empty success responses and, when
    /// `missing_ok` is set, for 404s.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&JsonValue>,
        missing_ok: bool,
    ) -> Result<Option<Secret>> {
        let url = self.url(path);
        debug!(method = %method, path = %path, "sending Vault request");

        let mut request = self.http.request(method, &url);
        if let Some(ref token) = self.token {
            request = request.header("X-Vault-Token", token);
        }
        if let Some(ref namespace) = self.namespace {
            request = request.header("X-Vault-Namespace", namespace);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND && missing_ok {
            return Ok(None);
        }

        if !status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!(
                        path = %path,
                        status = status.as_u16(),
                        error = %e,
                        "failed to read error response body"
                    );
                    String::new()
                }
            };
            let errors = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.errors)
                .unwrap_or_else(|_| {
                    if text.is_empty() {
                        Vec::new()
                    } else {
                        vec![text]
                    }
                });
            return Err(ProviderError::Api {
                status: status.as_u16(),
                errors,
            });
        }

        let bytes = response.bytes().await?;
        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok(None);
        }

        let body: JsonValue = serde_json::from_slice(&bytes)?;
        Ok(Some(Secret::from_body(body)?))
    }
}

#[async_trait]
impl VaultClient for HttpClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn read(&self, path: &str) -> Result<Option<Secret>> {
        self.request(Method::GET, path, None, true).await
    }

    async fn write(&self, path: &str, data: &JsonValue) -> Result<Option<Secret>> {
        self.request(Method::PUT, path, Some(data), false).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.request(Method::DELETE, path, None, false).await?;
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Option<Secret>> {
        let method = Method::from_bytes(b"LIST")
            .map_err(|e| ProviderError::Other(anyhow::anyhow!("invalid method: {}", e)))?;
        self.request(method, path, None, true).await
    }
}
