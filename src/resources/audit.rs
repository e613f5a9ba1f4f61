//! Audit device resource.
//!
//! Every attribute forces replacement, so there is no in-place update. The
//! resource id is the device path as configured.

use crate::schema::{Attribute, AttributeType, ResourceData, Schema, Value};
use crate::sys::{table_key, EnableAuditOptions, Sys};
use crate::validation::validate_path_segment;
use crate::{ProviderError, Resource, Result, VaultClient};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

pub const TYPE_NAME: &str = "vault_audit";

/// Audit device registered under `sys/audit`.
pub struct AuditResource {
    schema: Schema,
}

impl AuditResource {
    pub fn new() -> Self {
        let schema = Schema::new(vec![
            Attribute::new("path", AttributeType::String)
                .required()
                .force_new()
                .validate(validate_path_segment)
                .description("Path in which to enable the audit device"),
            Attribute::new("type", AttributeType::String)
                .required()
                .force_new()
                .description("Type of the audit device, such as 'file'"),
            Attribute::new("description", AttributeType::String)
                .optional()
                .force_new()
                .description("Human-friendly description of the audit device"),
            Attribute::new("options", AttributeType::Map)
                .optional()
                .force_new()
                .description("Configuration options to pass to the audit device itself"),
            Attribute::new("local", AttributeType::Bool)
                .optional()
                .force_new()
                .default_value(false)
                .description(
                    "Specifies if the audit device is a local only. Local audit devices are not replicated nor (if a secondary) removed by replication.",
                ),
        ]);
        Self { schema }
    }
}

impl Default for AuditResource {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts the `options` attribute into the string map the API takes.
fn string_options(value: Option<&Value>) -> Result<HashMap<String, String>> {
    let Some(value) = value else {
        return Ok(HashMap::new());
    };
    let map = value
        .as_map()
        .ok_or_else(|| ProviderError::invalid("options", "options should be a string -> string map"))?;

    map.iter()
        .map(|(k, v)| match v.as_str() {
            Some(s) => Ok((k.clone(), s.to_string())),
            None => Err(ProviderError::invalid(
                "options",
                "options should be a string -> string map",
            )),
        })
        .collect()
}

#[async_trait]
impl Resource for AuditResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn create(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let path = data.get_str("path").to_string();
        let opts = EnableAuditOptions {
            device_type: data.get_str("type").to_string(),
            description: data.get_str("description").to_string(),
            options: string_options(data.get_ok_exists("options"))
                .map_err(|e| ProviderError::resource_op(TYPE_NAME, "create", &path, e))?,
            local: data.get_bool("local"),
        };

        debug!(path = %path, "enabling audit backend");
        Sys::new(client)
            .enable_audit(&path, &opts)
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "create", &path, e))?;
        debug!(path = %path, "enabled audit backend");

        data.set_id(&path);
        self.read(data, client).await
    }

    async fn read(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let path = data.id_or_empty().to_string();

        debug!(path = %path, "reading audit backend");
        let audits = Sys::new(client)
            .list_audit()
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "read", &path, e))?;
        debug!(path = %path, "read audit backend");

        let Some(device) = audits.get(&table_key(&path)) else {
            warn!(path = %path, "audit backend not found, removing from state");
            data.clear_id();
            return Ok(());
        };

        data.set("path", path.as_str());
        data.set("type", device.device_type.as_str());
        data.set("description", device.description.as_str());
        data.set("local", device.local);
        if let Some(options) = device.options.as_ref().filter(|o| !o.is_empty()) {
            let options: BTreeMap<String, Value> = options
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            data.set("options", options);
        }

        Ok(())
    }

    async fn delete(&self, data: &mut ResourceData, client: &dyn VaultClient) -> Result<()> {
        let path = data.id_or_empty().to_string();

        debug!(path = %path, "disabling audit backend");
        match Sys::new(client).disable_audit(&path).await {
            Ok(()) => debug!(path = %path, "disabled audit backend"),
            Err(e) if e.is_not_found() => {
                debug!(path = %path, "audit backend not found, removing from state");
            }
            Err(e) => return Err(ProviderError::resource_op(TYPE_NAME, "delete", &path, e)),
        }

        data.clear_id();
        Ok(())
    }

    async fn exists(&self, data: &ResourceData, client: &dyn VaultClient) -> Result<bool> {
        let path = data.id_or_empty();

        debug!(path = %path, "checking audit backend exists");
        let audits = Sys::new(client)
            .list_audit()
            .await
            .map_err(|e| ProviderError::resource_op(TYPE_NAME, "exists", path, e))?;
        debug!(path = %path, "checked audit backend exists");

        Ok(audits.contains_key(&table_key(path)))
    }
}

/// Registers the resource with the factory.
pub fn register() {
    crate::factory::register_resource(TYPE_NAME, || Box::new(AuditResource::new()));
}
