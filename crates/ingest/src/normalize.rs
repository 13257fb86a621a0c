//! Step 1 of spec.md §4.7: turn a client-submitted `RawEvent` into a
//! persisted-shape `ErrorEvent`, computing its fingerprint along the way.

use chrono::Utc;

use errly_core::{EventId, Level, ProjectId};
use errly_events::{fingerprint, ErrorEvent, FingerprintInput, RawEvent};

/// Normalize one raw event into its stored form.
///
/// - `timestamp` defaults to server-receive time if the client didn't send
///   one (spec.md §4.8).
/// - `level` defaults to `Error` if absent (spec.md §3).
/// - `id` is always freshly assigned here (v4, spec.md §3) — the client
///   never controls it.
pub fn normalize(project_id: ProjectId, raw: RawEvent, received_at: chrono::DateTime<Utc>) -> ErrorEvent {
    let level = raw.level.unwrap_or(Level::Error);
    let timestamp = raw.timestamp.unwrap_or(received_at);

    let fp = fingerprint(FingerprintInput {
        project_id,
        message: &raw.message,
        environment: &raw.environment,
        level,
        stack_trace: raw.stack_trace.as_deref(),
    });

    ErrorEvent {
        id: EventId::new(),
        project_id,
        timestamp,
        message: raw.message,
        stack_trace: raw.stack_trace,
        environment: raw.environment,
        release_version: raw.release_version,
        user_id: raw.user_id,
        user_email: raw.user_email,
        user_ip: raw.user_ip,
        browser: raw.browser,
        os: raw.os,
        url: raw.url,
        tags: raw.tags,
        extra: raw.extra,
        fingerprint: fp,
        level,
        created_at: received_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn raw(message: &str) -> RawEvent {
        RawEvent {
            message: message.to_string(),
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
        }
    }

    #[test]
    fn defaults_level_to_error() {
        let event = normalize(ProjectId::new(), raw("boom"), Utc::now());
        assert_eq!(event.level, Level::Error);
    }

    #[test]
    fn missing_timestamp_falls_back_to_received_at() {
        let received_at = Utc::now();
        let event = normalize(ProjectId::new(), raw("boom"), received_at);
        assert_eq!(event.timestamp, received_at);
    }

    #[test]
    fn two_identical_events_get_the_same_fingerprint() {
        let project_id = ProjectId::new();
        let now = Utc::now();
        let a = normalize(project_id, raw("boom"), now);
        let b = normalize(project_id, raw("boom"), now);
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.id, b.id);
    }
}
