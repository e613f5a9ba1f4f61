//! Registry mapping resource type names to constructors.
//!
//! The configuration layer addresses resources by their type name
//! (`vault_audit`, ...). Each resource module contributes a constructor
//! through its `register()` function; [`crate::init`] runs them all once.

use crate::{ProviderError, Resource, Result};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

/// Builds a fresh resource instance.
pub type ResourceConstructor = fn() -> Box<dyn Resource>;

type Registry = RwLock<HashMap<String, ResourceConstructor>>;

static RESOURCES: OnceLock<Registry> = OnceLock::new();

fn resources() -> &'static Registry {
    RESOURCES.get_or_init(Registry::default)
}

/// Makes `type_name` resolvable through [`new_resource`].
///
/// Registering a name twice replaces the earlier constructor.
///
/// # Example
///
/// ```
/// use vaultres::factory::{new_resource, register_resource};
/// use vaultres::resources::audit::AuditResource;
///
/// register_resource("vault_audit_alias", || Box::new(AuditResource::new()));
///
/// let audit = new_resource("vault_audit_alias")?;
/// assert_eq!(audit.type_name(), "vault_audit");
/// # Ok::<(), vaultres::ProviderError>(())
/// ```
pub fn register_resource(type_name: &str, constructor: ResourceConstructor) {
    resources()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(type_name.to_string(), constructor);
}

/// Instantiates the resource registered as `type_name`.
///
/// # Errors
///
/// [`ProviderError::NotSupported`] when nothing is registered under the
/// name. Built-in resources only resolve after [`crate::init`].
pub fn new_resource(type_name: &str) -> Result<Box<dyn Resource>> {
    let constructor = resources()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(type_name)
        .copied()
        .ok_or_else(|| {
            ProviderError::NotSupported(format!("unknown resource type: {}", type_name))
        })?;

    Ok(constructor())
}

/// Registered type names in lexical order.
pub fn resource_types() -> Vec<String> {
    let mut names: Vec<String> = resources()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}
