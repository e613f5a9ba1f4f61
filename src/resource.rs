//! Resource trait definition.
//!
//! This module defines the core [`Resource`] trait that every managed object
//! type implements. The configuration engine drives a resource through its
//! lifecycle by calling these operations with the planned
//! [`ResourceData`] and a shared [`VaultClient`].

use crate::schema::{ResourceData, Schema};
use crate::{ProviderError, Result, VaultClient};
use async_trait::async_trait;

/// A resource type managed through the Vault API.
///
/// All implementations must be `Send + Sync` to support concurrent access
/// across async tasks.
///
/// # Implementations
///
/// - `vault_approle_auth_backend_role`: AppRole roles
/// - `vault_audit`: audit devices
/// - `vault_auth_backend`: auth methods and their tuning
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use vaultres::clients::mock::MockClient;
/// use vaultres::schema::Value;
/// use vaultres::{factory, Resource};
///
/// #[tokio::main]
/// async fn main() -> vaultres::Result<()> {
///     vaultres::init();
///     let client = MockClient::new();
///     let audit = factory::new_resource("vault_audit")?;
///
///     let mut config = BTreeMap::new();
///     config.insert("path".to_string(), Value::from("file"));
///     config.insert("type".to_string(), Value::from("file"));
///
///     let mut data = audit.schema().plan(config, None)?;
///     audit.create(&mut data, &client).await?;
///
///     assert_eq!(data.id(), Some("file"));
///     assert!(audit.exists(&data, &client).await?);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Resource: Send + Sync {
    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns the resource type name (e.g., "vault_audit").
    fn type_name(&self) -> &str;

    /// Returns the attribute schema.
    fn schema(&self) -> &Schema;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Creates the remote object from planned data and sets the id.
    ///
    /// On success `data` holds the state read back from the server.
    async fn create(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()>;

    /// Refreshes `data` from the server.
    ///
    /// When the object no longer exists the id is cleared and `Ok(())` is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidPath`]: the id cannot be parsed
    /// - API errors other than "not found"
    async fn read(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()>;

    /// Applies changed attributes to the existing remote object.
    ///
    /// The default implementation returns
    /// [`ProviderError::NotSupported`]; resources whose attributes all force
    /// replacement do not override it.
    async fn update(&self, data: &mut ResourceData, _client: &dyn VaultClient) -> Result<()> {
        Err(ProviderError::resource_op(
            self.type_name(),
            "update",
            data.id_or_empty(),
            ProviderError::NotSupported(format!(
                "{} cannot be updated in place",
                self.type_name()
            )),
        ))
    }

    /// Deletes the remote object.
    ///
    /// Deleting an object that is already gone succeeds.
    async fn delete(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()>;

    /// Checks whether the remote object still exists.
    async fn exists(&self, data: &ResourceData, client: &dyn VaultClient) -> Result<bool>;

    // ========================================================================
    // Import
    // ========================================================================

    /// Builds state for an existing object from its id.
    ///
    /// The default is a passthrough: the id is used as is and the following
    /// read fills in the attributes.
    fn import(&self, id: &str) -> Result<ResourceData> {
        if id.is_empty() {
            return Err(ProviderError::InvalidPath {
                path: id.to_string(),
                reason: "import id cannot be empty".to_string(),
            });
        }
        Ok(ResourceData::with_id(id))
    }
}
