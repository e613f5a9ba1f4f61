//! Provider: configuration, a shared client and the resource registry.

use crate::client::VaultClient;
use crate::config::ProviderConfig;
use crate::schema::ResourceData;
use crate::{factory, ProviderError, Resource, Result};
use std::sync::Arc;
use tracing::debug;

/// Entry point for the configuration layer.
///
/// Holds the client every resource operation goes through. Cloning is cheap
/// and shares the client.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vaultres::clients::mock::MockClient;
/// use vaultres::{Provider, ProviderConfig};
///
/// let provider = Provider::with_client(ProviderConfig::default(), Arc::new(MockClient::new()));
/// assert!(provider.resource_types().contains(&"vault_audit".to_string()));
/// ```
#[derive(Clone)]
pub struct Provider {
    config: ProviderConfig,
    client: Arc<dyn VaultClient>,
}

impl Provider {
    /// Creates a provider talking HTTP to `config.address`.
    #[cfg(feature = "http")]
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = crate::clients::http::HttpClient::new(&config)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Creates a provider over an existing client.
    pub fn with_client(config: ProviderConfig, client: Arc<dyn VaultClient>) -> Self {
        crate::init();
        Self { config, client }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn client(&self) -> &dyn VaultClient {
        self.client.as_ref()
    }

    /// Returns the resource registered under `type_name`.
    pub fn resource(&self, type_name: &str) -> Result<Box<dyn Resource>> {
        factory::new_resource(type_name)
    }

    /// Names of all registered resource types, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        factory::resource_types()
    }

    /// Imports an existing object and reads its state.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the object does not exist.
    pub async fn import(&self, type_name: &str, id: &str) -> Result<ResourceData> {
        let resource = self.resource(type_name)?;
        let mut data = resource.import(id)?;

        debug!(resource = %type_name, id = %id, "importing");
        resource.read(&mut data, self.client()).await?;

        if data.id().is_none() {
            return Err(ProviderError::NotFound(format!("{} {}", type_name, id)));
        }
        Ok(data)
    }
}
