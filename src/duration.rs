//! Duration strings as the Vault API speaks them.
//!
//! Tune requests take strings like `"10m"` or `"768h"`, tune responses
//! return whole seconds. [`format_seconds`] goes from the second form to
//! the first; [`parse`] checks and decodes the first.

use crate::{ProviderError, Result};
use std::time::Duration;

/// Formats whole seconds as a short duration string.
///
/// Units are hours, minutes and seconds. Trailing zero units are dropped,
/// inner zero units are kept.
///
/// # Example
///
/// ```
/// use vaultres::duration::format_seconds;
///
/// assert_eq!(format_seconds(600), "10m");
/// assert_eq!(format_seconds(3600), "1h");
/// assert_eq!(format_seconds(3601), "1h0m1s");
/// ```
pub fn format_seconds(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let long = if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    };

    let mut short = long.as_str();
    if short.ends_with("m0s") {
        short = &short[..short.len() - 2];
    }
    if short.ends_with("h0m") {
        short = &short[..short.len() - 2];
    }
    short.to_string()
}

/// Parses a duration string such as `"10m"`, `"1h30m"` or `"45s"`.
///
/// A bare integer is taken as seconds, matching what the server accepts.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidAttribute`] naming `attribute` when the
/// string is not a duration.
pub fn parse(attribute: &str, value: &str) -> Result<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(value)
        .map_err(|e| ProviderError::invalid(attribute, format!("{:?} is not a duration: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0), "0s");
        assert_eq!(format_seconds(45), "45s");
        assert_eq!(format_seconds(90), "1m30s");
        assert_eq!(format_seconds(600), "10m");
        assert_eq!(format_seconds(1200), "20m");
        assert_eq!(format_seconds(3600), "1h");
        assert_eq!(format_seconds(3660), "1h1m");
        assert_eq!(format_seconds(3601), "1h0m1s");
        assert_eq!(format_seconds(2_764_800), "768h");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse("ttl", "10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse("ttl", "1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse("ttl", "3600").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse("ttl", "768h").unwrap(), Duration::from_secs(2_764_800));
    }

    #[test]
    fn test_parse_invalid() {
        let err = parse("max_lease_ttl", "forever").unwrap_err();
        assert!(err.to_string().contains("max_lease_ttl"));
    }

    #[test]
    fn test_format_then_parse_is_consistent() {
        for secs in [0, 59, 600, 3601, 86400] {
            let text = format_seconds(secs);
            assert_eq!(parse("ttl", &text).unwrap(), Duration::from_secs(secs));
        }
    }
}
