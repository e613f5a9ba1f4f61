//! Mount tuning: the `tune` block of a mount and its API request/response.
//!
//! The configuration layer stores the block as a list holding at most one
//! map. [`expand`] turns that into a [`MountConfigInput`] for the tune
//! endpoint; [`flatten`] turns a [`MountConfigOutput`] read back from the
//! server into the map stored in state. The two are not byte-level
//! inverses: requests carry duration strings, responses carry seconds.

use crate::duration::format_seconds;
use crate::schema::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_LEASE_TTL: &str = "default_lease_ttl";
pub const MAX_LEASE_TTL: &str = "max_lease_ttl";
pub const AUDIT_NON_HMAC_REQUEST_KEYS: &str = "audit_non_hmac_request_keys";
pub const AUDIT_NON_HMAC_RESPONSE_KEYS: &str = "audit_non_hmac_response_keys";
pub const LISTING_VISIBILITY: &str = "listing_visibility";
pub const PASSTHROUGH_REQUEST_HEADERS: &str = "passthrough_request_headers";

/// Body of a mount tune request.
///
/// Empty fields are left out of the request so the server keeps its
/// current setting for them. `description` is sent whenever it is `Some`,
/// so `Some("")` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfigInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_lease_ttl: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub max_lease_ttl: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_non_hmac_request_keys: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_non_hmac_response_keys: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub listing_visibility: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passthrough_request_headers: Option<Vec<String>>,
}

impl MountConfigInput {
    /// True when the request would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Mount tuning as returned by the server. TTLs are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfigOutput {
    #[serde(default)]
    pub default_lease_ttl: u64,

    #[serde(default)]
    pub max_lease_ttl: u64,

    #[serde(default)]
    pub audit_non_hmac_request_keys: Option<Vec<String>>,

    #[serde(default)]
    pub audit_non_hmac_response_keys: Option<Vec<String>>,

    #[serde(default)]
    pub listing_visibility: String,

    #[serde(default)]
    pub passthrough_request_headers: Option<Vec<String>>,
}

/// Builds a tune request from the stored `tune` block.
///
/// `flattened` holds zero or one map. Keys that are absent leave the field
/// at its zero value; list keys that are absent stay `None`. Values of the
/// wrong type are ignored, the schema has already rejected them.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use vaultres::schema::Value;
/// use vaultres::tune::{expand, MountConfigInput};
///
/// let mut block = BTreeMap::new();
/// block.insert("max_lease_ttl".to_string(), Value::from("20m"));
///
/// let input = expand(&[Value::Map(block)]);
/// assert_eq!(input.max_lease_ttl, "20m");
/// assert_eq!(input.audit_non_hmac_request_keys, None);
///
/// assert_eq!(expand(&[]), MountConfigInput::default());
/// ```
pub fn expand(flattened: &[Value]) -> MountConfigInput {
    let mut input = MountConfigInput::default();
    let Some(block) = flattened.first().and_then(Value::as_map) else {
        return input;
    };

    let string = |key: &str| {
        block
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };
    let strings = |key: &str| block.get(key).map(Value::to_strings);

    input.default_lease_ttl = string(DEFAULT_LEASE_TTL);
    input.max_lease_ttl = string(MAX_LEASE_TTL);
    input.audit_non_hmac_request_keys = strings(AUDIT_NON_HMAC_REQUEST_KEYS);
    input.audit_non_hmac_response_keys = strings(AUDIT_NON_HMAC_RESPONSE_KEYS);
    input.listing_visibility = string(LISTING_VISIBILITY);
    input.passthrough_request_headers = strings(PASSTHROUGH_REQUEST_HEADERS);
    input
}

/// Builds the stored `tune` map from the server's tuning.
///
/// TTLs become short duration strings. List fields appear only when
/// non-empty, in server order. `listing_visibility` is always present, even
/// when empty.
pub fn flatten(output: &MountConfigOutput) -> BTreeMap<String, Value> {
    let mut m = BTreeMap::new();
    m.insert(
        DEFAULT_LEASE_TTL.to_string(),
        Value::String(format_seconds(output.default_lease_ttl)),
    );
    m.insert(
        MAX_LEASE_TTL.to_string(),
        Value::String(format_seconds(output.max_lease_ttl)),
    );

    let lists = [
        (AUDIT_NON_HMAC_REQUEST_KEYS, &output.audit_non_hmac_request_keys),
        (AUDIT_NON_HMAC_RESPONSE_KEYS, &output.audit_non_hmac_response_keys),
        (PASSTHROUGH_REQUEST_HEADERS, &output.passthrough_request_headers),
    ];
    for (key, items) in lists {
        if let Some(items) = items.as_ref().filter(|items| !items.is_empty()) {
            m.insert(key.to_string(), Value::strings(items.iter().cloned()));
        }
    }

    m.insert(
        LISTING_VISIBILITY.to_string(),
        Value::String(output.listing_visibility.clone()),
    );
    m
}
