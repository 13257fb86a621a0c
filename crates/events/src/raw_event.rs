//! Wire-level event shape accepted by `POST /api/v1/ingest` (spec.md §6/§4.8).

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use errly_core::{ErrlyError, Level};

/// One event as submitted by a client, before normalization.
///
/// `timestamp` accepts any of: RFC3339, RFC3339 with fractional seconds,
/// ISO-8601 without a timezone (treated as UTC), or ISO-8601 with
/// microseconds (SPEC_FULL.md §4.8). A missing or unparseable timestamp is
/// `None` pre-validation / a decode error respectively — the handler maps
/// the latter to `400 BAD_REQUEST`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub message: String,
    pub environment: String,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub release_version: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_ip: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub extra: HashMap<String, JsonValue>,
}

/// Request body of `POST /api/v1/ingest`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestRequest {
    pub events: Vec<RawEventWire>,
}

/// Wraps `RawEvent` so a malformed timestamp on a single event produces a
/// field-level error rather than aborting the whole-body deserialization
/// with no context (axum's `Json` extractor otherwise reports only a byte
/// offset).
pub type RawEventWire = RawEvent;

pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 100;

impl RawEvent {
    /// Validate the fields the handler must check before calling the
    /// service (spec.md §4.8: non-empty `message`/`environment`).
    pub fn validate(&self) -> Result<(), ErrlyError> {
        if self.message.trim().is_empty() {
            return Err(ErrlyError::client_format("message must not be empty"));
        }
        if self.environment.trim().is_empty() {
            return Err(ErrlyError::client_format("environment must not be empty"));
        }
        Ok(())
    }
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s).map(Some).map_err(DeError::custom),
    }
}

/// Parse a timestamp accepting every shape spec.md §4.8 lists.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    Err(format!("unrecognized timestamp format: '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        assert!(parse_timestamp("2024-01-01T00:00:00Z").is_ok());
    }

    #[test]
    fn parses_rfc3339_with_fractional_seconds() {
        assert!(parse_timestamp("2024-01-01T00:00:00.123Z").is_ok());
    }

    #[test]
    fn parses_iso8601_without_timezone_as_utc() {
        assert!(parse_timestamp("2024-01-01T00:00:00").is_ok());
    }

    #[test]
    fn parses_iso8601_with_microseconds() {
        assert!(parse_timestamp("2024-01-01T00:00:00.123456").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("not-a-date").is_err());
    }

    #[test]
    fn rejects_empty_message() {
        let ev = RawEvent {
            message: "  ".to_string(),
            environment: "prod".to_string(),
            level: None,
            timestamp: None,
            stack_trace: None,
            release_version: None,
            user_id: None,
            user_email: None,
            user_ip: None,
            browser: None,
            os: None,
            url: None,
            tags: HashMap::new(),
            extra: HashMap::new(),
        };
        assert!(ev.validate().is_err());
    }
}
