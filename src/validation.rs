//! Validators for attribute values.
//!
//! Each function has the [`Validator`](crate::schema::Validator) signature so
//! it can be attached to an attribute with `.validate(...)`.

use crate::schema::Value;
use crate::{duration, ProviderError, Result};
use std::net::IpAddr;

/// Maximum allowed length for a single path segment.
const MAX_SEGMENT_LENGTH: usize = 255;

/// Accepted values of `listing_visibility`.
pub const LISTING_VISIBILITY_VALUES: &[&str] = &["", "unauth", "hidden"];

/// Validates a value used as (part of) an API path.
///
/// Rejects:
/// - Empty names (after trimming slashes)
/// - Excessive length (>255 characters)
/// - Whitespace and control characters
/// - `.` and `..` segments
///
/// # Example
///
/// ```
/// use vaultres::schema::Value;
/// use vaultres::validation::validate_path_segment;
///
/// assert!(validate_path_segment("role_name", &Value::from("web-app")).is_ok());
/// assert!(validate_path_segment("backend", &Value::from("team/approle")).is_ok());
///
/// assert!(validate_path_segment("role_name", &Value::from("")).is_err());
/// assert!(validate_path_segment("role_name", &Value::from("a b")).is_err());
/// assert!(validate_path_segment("backend", &Value::from("../sys")).is_err());
/// ```
pub fn validate_path_segment(attribute: &str, value: &Value) -> Result<()> {
    let Some(name) = value.as_str() else {
        return Err(ProviderError::invalid(attribute, "expected a string"));
    };
    let name = name.trim_matches('/');

    if name.is_empty() {
        return Err(ProviderError::invalid(attribute, "cannot be empty"));
    }

    if name.len() > MAX_SEGMENT_LENGTH {
        return Err(ProviderError::invalid(
            attribute,
            format!("exceeds maximum length of {} characters", MAX_SEGMENT_LENGTH),
        ));
    }

    if name.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(ProviderError::invalid(
            attribute,
            "contains whitespace or control characters",
        ));
    }

    if name.split('/').any(|part| part == "." || part == ".." || part.is_empty()) {
        return Err(ProviderError::invalid(attribute, "contains an empty or relative segment"));
    }

    Ok(())
}

/// Validates a name that must stay a single path segment.
///
/// Applies [`validate_path_segment`] and additionally rejects `/` between
/// the surrounding slashes, so the name cannot reach into sub-paths.
///
/// # Example
///
/// ```
/// use vaultres::schema::Value;
/// use vaultres::validation::validate_single_segment;
///
/// assert!(validate_single_segment("role_name", &Value::from("web")).is_ok());
/// assert!(validate_single_segment("role_name", &Value::from("x/role/y")).is_err());
/// ```
pub fn validate_single_segment(attribute: &str, value: &Value) -> Result<()> {
    validate_path_segment(attribute, value)?;

    let name = value.as_str().unwrap_or_default().trim_matches('/');
    if name.contains('/') {
        return Err(ProviderError::invalid(attribute, "cannot contain '/'"));
    }

    Ok(())
}

/// Validates that every element of a list or set is a CIDR block.
///
/// A bare address is accepted as a host route.
pub fn validate_cidr_list(attribute: &str, value: &Value) -> Result<()> {
    let Some(items) = value.as_list() else {
        return Err(ProviderError::invalid(attribute, "expected a list of CIDR blocks"));
    };

    for item in items {
        let Some(block) = item.as_str() else {
            return Err(ProviderError::invalid(attribute, "expected string elements"));
        };
        parse_cidr(block)
            .ok_or_else(|| ProviderError::invalid(attribute, format!("{:?} is not a CIDR block", block)))?;
    }
    Ok(())
}

fn parse_cidr(block: &str) -> Option<(IpAddr, u8)> {
    let (addr, prefix) = match block.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (block, None),
    };
    let addr: IpAddr = addr.parse().ok()?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    let prefix = match prefix {
        Some(p) => p.parse::<u8>().ok().filter(|p| *p <= max)?,
        None => max,
    };
    Some((addr, prefix))
}

/// Validates the `tune` block of a mount.
///
/// The block is a list with at most one map. TTLs must parse as durations,
/// `listing_visibility` must be one of [`LISTING_VISIBILITY_VALUES`] and list
/// keys must hold strings.
pub fn validate_tune(attribute: &str, value: &Value) -> Result<()> {
    use crate::tune::*;

    let Some(blocks) = value.as_list() else {
        return Err(ProviderError::invalid(attribute, "expected a list"));
    };
    if blocks.len() > 1 {
        return Err(ProviderError::invalid(attribute, "at most one block is allowed"));
    }
    let Some(block) = blocks.first() else {
        return Ok(());
    };
    let Some(block) = block.as_map() else {
        return Err(ProviderError::invalid(attribute, "expected a map"));
    };

    for (key, v) in block {
        let field = format!("{}.{}", attribute, key);
        match key.as_str() {
            DEFAULT_LEASE_TTL | MAX_LEASE_TTL => {
                let text = v
                    .as_str()
                    .ok_or_else(|| ProviderError::invalid(&field, "expected a duration string"))?;
                if !text.is_empty() {
                    duration::parse(&field, text)?;
                }
            }
            LISTING_VISIBILITY => {
                let text = v.as_str().unwrap_or("\u{0}");
                if !LISTING_VISIBILITY_VALUES.contains(&text) {
                    return Err(ProviderError::invalid(
                        &field,
                        format!("must be one of {:?}", LISTING_VISIBILITY_VALUES),
                    ));
                }
            }
            AUDIT_NON_HMAC_REQUEST_KEYS | AUDIT_NON_HMAC_RESPONSE_KEYS
            | PASSTHROUGH_REQUEST_HEADERS => {
                let all_strings = v
                    .as_list()
                    .map(|items| items.iter().all(|i| i.as_str().is_some()))
                    .unwrap_or(false);
                if !all_strings {
                    return Err(ProviderError::invalid(&field, "expected a list of strings"));
                }
            }
            other => return Err(ProviderError::UnknownAttribute(format!("{}.{}", attribute, other))),
        }
    }
    Ok(())
}
