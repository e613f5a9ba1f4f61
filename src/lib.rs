//! vaultres - Vault objects as declarative resources.
//!
//! vaultres implements the resource side of a declarative configuration
//! provider for HashiCorp Vault. Each resource type maps a set of typed
//! attributes onto Vault API calls and supports create, read, update,
//! delete, exists and import.
//!
//! # Features
//!
//! - **Typed schemas**: attributes are validated and normalized before any
//!   request is made
//! - **Async/Await**: built on tokio, resources share one [`VaultClient`]
//! - **Mount tuning**: the [`tune`] module converts a mount's `tune` block
//!   to and from the API's request and response shapes
//! - **Error Context**: rich error types with full context and chaining
//! - **Feature Flags**: the HTTP client and the in-memory mock are optional
//!
//! # Quick Start
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use vaultres::{Provider, ProviderConfig, Value};
//!
//! #[tokio::main]
//! async fn main() -> vaultres::Result<()> {
//!     let provider = Provider::new(ProviderConfig::from_env())?;
//!     let role = provider.resource("vault_approle_auth_backend_role")?;
//!
//!     let mut config = BTreeMap::new();
//!     config.insert("role_name".to_string(), Value::from("web"));
//!     config.insert("policies".to_string(), Value::strings(["web"]));
//!
//!     let mut data = role.schema().plan(config, None)?;
//!     role.create(&mut data, provider.client()).await?;
//!     println!("role id: {}", data.get_str("role_id"));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Resources
//!
//! | Resource | API paths |
//! |----------|-----------|
//! | `vault_approle_auth_backend_role` | `auth/<backend>/role/<name>`, `.../role-id` |
//! | `vault_audit` | `sys/audit`, `sys/audit/<path>` |
//! | `vault_auth_backend` | `sys/auth`, `sys/auth/<path>`, `sys/auth/<path>/tune` |
//!
//! # Feature Flags
//!
//! | Feature | Default | Provides |
//! |---------|---------|----------|
//! | `http` | yes | [`clients::http::HttpClient`] over reqwest |
//! | `mock` | yes | [`clients::mock::MockClient`], in memory |

pub mod client;
pub mod clients;
pub mod config;
pub mod duration;
pub mod error;
pub mod factory;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod sys;
pub mod tune;
pub mod validation;

pub use client::{Secret, VaultClient};
pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use provider::Provider;
pub use resource::Resource;
pub use schema::{ResourceData, Schema, Value};

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the vaultres library.
///
/// This registers all built-in resources with the factory. [`Provider`]
/// calls it, so explicit calls are only needed when using [`factory`]
/// directly. It is idempotent.
pub fn init() {
    INIT.call_once(resources::register_all);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_initialization() {
        init();
        init();

        let types = factory::resource_types();
        assert!(types.contains(&"vault_auth_backend".to_string()));
    }

    #[test]
    fn test_factory_builds_registered_resources() {
        init();

        let audit = factory::new_resource("vault_audit").unwrap();
        assert_eq!(audit.type_name(), "vault_audit");
        assert!(audit.schema().attribute("options").is_some());

        assert!(factory::new_resource("vault_mount").is_err());
    }
}
