//! Auth method mount resource.
//!
//! Mounts an auth method under `sys/auth/<path>` and keeps its tuning in a
//! `tune` block. The resource id is the mount path without slashes.

use crate::schema::{Attribute, AttributeType, ResourceData, Schema, Value};
use crate::sys::{table_key, EnableAuthOptions, Sys};
use crate::tune::{
    expand, flatten, MountConfigInput, DEFAULT_LEASE_TTL, LISTING_VISIBILITY, MAX_LEASE_TTL,
};
use crate::validation::{validate_path_segment, validate_tune};
use crate::{duration, ProviderError, Resource, Result, VaultClient};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const TYPE_NAME: &str = "vault_auth_backend";

fn trim_slashes(s: &str) -> String {
    s.trim_matches('/').to_string()
}

/// Auth method mounted under `sys/auth`.
pub struct AuthBackendResource {
    schema: Schema,
}

impl AuthBackendResource {
    pub fn new() -> Self {
        let schema = Schema::new(vec![
            Attribute::new("type", AttributeType::String)
                .required()
                .force_new()
                .description("Name of the auth backend"),
            Attribute::new("path", AttributeType::String)
                .optional()
                .computed()
                .force_new()
                .normalize(trim_slashes)
                .validate(validate_path_segment)
                .description("path to mount the backend. This defaults to the type."),
            Attribute::new("description", AttributeType::String)
                .optional()
                .description("The description of the auth backend"),
            Attribute::new("local", AttributeType::Bool)
                .optional()
                .force_new()
                .description(
                    "Specifies if the auth method is local only. Local auth methods are not replicated nor (if a secondary) removed by replication.",
                ),
            Attribute::new("accessor", AttributeType::String)
                .computed()
                .description("The accessor of the auth backend"),
            Attribute::new("tune", AttributeType::List)
                .optional()
                .computed()
                .validate(validate_tune)
                .suppress_diff(same_tune),
        ]);
        Self { schema }
    }
}

impl Default for AuthBackendResource {
    fn default() -> Self {
        Self::new()
    }
}

fn tune_blocks(data: &ResourceData) -> &[Value] {
    data.get("tune").and_then(Value::as_list).unwrap_or(&[])
}

fn first_block(value: &Value) -> Option<&BTreeMap<String, Value>> {
    value.as_list().and_then(<[Value]>::first).and_then(Value::as_map)
}

/// True when every key of the configured block means the same as in the
/// stored one.
///
/// The stored block is what the server reports and always carries the TTLs
/// and `listing_visibility`; keys the configuration leaves out are ignored.
/// TTLs compare as durations, so `"2h"` matches a stored `"120m"`.
fn same_tune(planned: &Value, prior: &Value) -> bool {
    let Some(planned) = first_block(planned) else {
        return true;
    };
    let empty = BTreeMap::new();
    let prior = first_block(prior).unwrap_or(&empty);

    planned
        .iter()
        .all(|(key, value)| same_tune_value(key, value, prior.get(key)))
}

fn same_tune_value(key: &str, planned: &Value, prior: Option<&Value>) -> bool {
    match key {
        DEFAULT_LEASE_TTL | MAX_LEASE_TTL => {
            // an empty TTL is not sent, so the server keeps its value
            let text = planned.as_str().unwrap_or_default();
            if text.is_empty() {
                return true;
            }
            let stored = prior.and_then(Value::as_str).unwrap_or("0s");
            match (duration::parse(key, text), duration::parse(key, stored)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
        }
        LISTING_VISIBILITY => {
            let text = planned.as_str().unwrap_or_default();
            text.is_empty() || Some(text) == prior.and_then(Value::as_str)
        }
        _ => planned.to_strings() == prior.map(Value::to_strings).unwrap_or_default(),
    }
}

#[async_trait]
impl Resource for AuthBackendResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn create(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let mount_type = data.get_str("type").to_string();
        let path = match data.get_str("path") {
            "" => mount_type.clone(),
            path => path.to_string(),
        };

        let opts = EnableAuthOptions {
            mount_type,
            description: data.get_str("description").to_string(),
            local: data.get_bool("local"),
            config: expand(tune_blocks(data)),
        };

        debug!(path = %path, "writing auth backend");
        Sys::new(client)
            .enable_auth(&path, &opts)
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "create", &path, e))?;
        debug!(path = %path, "wrote auth backend");

        data.set_id(path);
        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let path = data.id_or_empty().to_string();
        let sys = Sys::new(client);

        debug!(path = %path, "reading auth backend");
        let mounts = sys
            .list_auth()
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "read", &path, e))?;

        let Some(mount) = mounts.get(&table_key(&path)) else {
            warn!(path = %path, "auth backend not found, removing from state");
            data.clear_id();
            return Ok(());
        };

        let tune = sys
            .auth_config(&path)
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "read", &path, e))?;
        debug!(path = %path, "read auth backend");

        data.set("type", mount.mount_type.as_str());
        data.set("path", trim_slashes(&path));
        data.set("description", mount.description.as_str());
        data.set("local", mount.local);
        data.set("accessor", mount.accessor.as_str());
        data.set("tune", Value::List(vec![Value::Map(flatten(&tune))]));

        Ok(())
    }

    async fn update(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let path = data.id_or_empty().to_string();

        let description_changed = data.has_change("description");
        let tune_changed = data.has_change("tune");

        if description_changed || tune_changed {
            let mut config = if tune_changed {
                expand(tune_blocks(data))
            } else {
                MountConfigInput::default()
            };
            if description_changed {
                config.description = Some(data.get_str("description").to_string());
            }

            debug!(path = %path, "tuning auth backend");
            Sys::new(client)
                .tune_auth(&path, &config)
                .await
                .map_err(|e| ProviderError::resource_op(TYPE_NAME, "update", &path, e))?;
            debug!(path = %path, "tuned auth backend");
        }

        self.read(data, client).await
    }

    async fn delete(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let path = data.id_or_empty().to_string();

        debug!(path = %path, "deleting auth backend");
        match Sys::new(client).disable_auth(&path).await {
            Ok(()) => debug!(path = %path, "deleted auth backend"),
            Err(e) if e.is_not_found() => {
                debug!(path = %path, "auth backend not found, removing from state");
            }
            Err(e) => return Err(ProviderError::resource_op(TYPE_NAME, "delete", &path, e)),
        }

        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &ResourceData, client: &dyn VaultClient) -> Result<bool> {
        let path = data.id_or_empty();

        debug!(path = %path, "checking auth backend exists");
        let mounts = Sys::new(client)
            .list_auth()
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "exists", path, e))?;
        debug!(path = %path, "checked auth backend exists");

        Ok(mounts.contains_key(&table_key(path)))
    }
}

/// Registers the resource with the factory.
pub fn register() {
    crate::factory::register_resource(TYPE_NAME, || Box::new(AuthBackendResource::new()));
}
