//! Deterministic content fingerprinting (spec.md §4.1, component C1).
//!
//! A fingerprint groups recurrences of "the same defect" into one issue.
//! It must be:
//!
//! - **Deterministic**: same logical inputs → same output, across processes
//!   and versions, with no randomness and no clock.
//! - **Selective**: `project_id`, `message`, `environment`, `level`, and a
//!   normalized `stack_trace` participate; everything else (timestamp, user
//!   identity, IP, `extra`, `url`) must not.
//!
//! spec.md §9 Open Question 2 explicitly declines to freeze the stack-trace
//! normalization grammar at the design layer and asks implementers to do so
//! here. The grammar chosen: split on newlines into frames, strip tokens
//! that look like raw memory addresses (`0x[0-9a-f]+`), collapse the
//! resulting whitespace, and rejoin with `\n`. This keeps "file + function +
//! line" information (which is almost always textual in client-submitted
//! stack traces) while dropping the one class of incidental entropy a
//! client-supplied trace reliably contains.

use sha2::{Digest, Sha256};

use errly_core::{Level, ProjectId};

const FIELD_SEPARATOR: u8 = 0x1F;
const FINGERPRINT_HEX_LEN: usize = 32;

/// The subset of an error event that participates in its fingerprint.
///
/// Constructed by the caller (normally `IngestService`) from a normalized
/// `ErrorEvent`; kept as its own type so the pure function below has no
/// temptation to read a field it shouldn't (e.g. `user_id`).
#[derive(Debug, Clone, Copy)]
pub struct FingerprintInput<'a> {
    pub project_id: ProjectId,
    pub message: &'a str,
    pub environment: &'a str,
    pub level: Level,
    pub stack_trace: Option<&'a str>,
}

/// Compute the stable fingerprint for an event.
///
/// Pure and total: never fails, never touches the clock, never allocates
/// randomness. See the module doc for the exact byte representation.
pub fn fingerprint(input: FingerprintInput<'_>) -> String {
    let mut hasher = Sha256::new();

    hasher.update(input.project_id.as_uuid().as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(input.message.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(input.environment.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(input.level.as_str().as_bytes());
    hasher.update([FIELD_SEPARATOR]);

    if let Some(trace) = input.stack_trace {
        hasher.update(normalize_stack_trace(trace).as_bytes());
    }

    let digest = hasher.finalize();
    hex::encode(&digest[..FINGERPRINT_HEX_LEN / 2])
}

/// Normalize a raw, client-submitted stack trace into its fingerprint-stable
/// form: one cleaned frame per line, memory addresses stripped.
pub fn normalize_stack_trace(raw: &str) -> String {
    raw.lines()
        .map(normalize_frame)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalize a single stack frame: drop `0x...` memory-address tokens —
/// including a wrapping `(...)` pair with nothing else inside it, the shape
/// most runtimes render addresses in — and collapse the whitespace left
/// behind. Stripping only the token and not its parens would leave an empty
/// `()` artifact that differs from a frame with no address at all, breaking
/// the "embedding an address is a no-op" guarantee.
fn normalize_frame(frame: &str) -> String {
    let chars: Vec<char> = frame.chars().collect();
    let mut out = String::with_capacity(frame.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '(' {
            if let Some(end) = parenthesized_hex_address_end(&chars, i) {
                i = end + 1;
                continue;
            }
        }
        if chars[i] == '0' && chars.get(i + 1) == Some(&'x') {
            if let Some(len) = hex_address_len(&chars[i..]) {
                i += len;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// If `chars[open]` is `'('` opening a group whose entire contents are a
/// single `0x...` address, return the index of the closing `')'`.
fn parenthesized_hex_address_end(chars: &[char], open: usize) -> Option<usize> {
    let inner_start = open + 1;
    if chars.get(inner_start) != Some(&'0') || chars.get(inner_start + 1) != Some(&'x') {
        return None;
    }
    let len = hex_address_len(&chars[inner_start..])?;
    let close = inner_start + len;
    (chars.get(close) == Some(&')')).then_some(close)
}

/// If `chars` starts with a `0x`-prefixed run of at least one hex digit,
/// return how many characters that token occupies (including the `0x`).
fn hex_address_len(chars: &[char]) -> Option<usize> {
    let digits = chars[2..].iter().take_while(|c| c.is_ascii_hexdigit()).count();
    (digits > 0).then_some(digits + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(
        project_id: ProjectId,
        message: &'a str,
        environment: &'a str,
        level: Level,
        stack_trace: Option<&'a str>,
    ) -> FingerprintInput<'a> {
        FingerprintInput {
            project_id,
            message,
            environment,
            level,
            stack_trace,
        }
    }

    #[test]
    fn same_logical_fields_collide() {
        let p = ProjectId::new();
        let a = input(p, "boom", "prod", Level::Error, Some("at foo.rs:10"));
        let b = input(p, "boom", "prod", Level::Error, Some("at foo.rs:10"));
        assert_eq!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn different_message_does_not_collide() {
        let p = ProjectId::new();
        let a = input(p, "boom", "prod", Level::Error, None);
        let b = input(p, "bang", "prod", Level::Error, None);
        assert_ne!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn different_project_does_not_collide() {
        let a = input(ProjectId::new(), "boom", "prod", Level::Error, None);
        let b = input(ProjectId::new(), "boom", "prod", Level::Error, None);
        assert_ne!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn different_level_does_not_collide() {
        let p = ProjectId::new();
        let a = input(p, "boom", "prod", Level::Error, None);
        let b = input(p, "boom", "prod", Level::Warning, None);
        assert_ne!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn memory_addresses_are_ignored() {
        let p = ProjectId::new();
        let a = input(
            p,
            "boom",
            "prod",
            Level::Error,
            Some("at foo.rs:10 (0x7ffeeb1a2c40)"),
        );
        let b = input(
            p,
            "boom",
            "prod",
            Level::Error,
            Some("at foo.rs:10 (0x00000001013a8f20)"),
        );
        assert_eq!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn stack_trace_differences_do_change_fingerprint() {
        let p = ProjectId::new();
        let a = input(p, "boom", "prod", Level::Error, Some("at foo.rs:10"));
        let b = input(p, "boom", "prod", Level::Error, Some("at foo.rs:11"));
        assert_ne!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn fingerprint_is_deterministic_across_calls() {
        let p = ProjectId::new();
        let a = input(p, "boom", "prod", Level::Error, Some("at foo.rs:10"));
        assert_eq!(fingerprint(a), fingerprint(a));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property (spec.md §8 #3): fingerprinting the same event twice
        /// always collides, for any message/environment/stack trace text.
        #[test]
        fn same_input_always_collides(
            message in ".{0,200}",
            environment in "[a-z]{1,20}",
            stack_trace in proptest::option::of(".{0,200}"),
        ) {
            let p = ProjectId::new();
            let a = FingerprintInput {
                project_id: p,
                message: &message,
                environment: &environment,
                level: Level::Error,
                stack_trace: stack_trace.as_deref(),
            };
            prop_assert_eq!(fingerprint(a), fingerprint(a));
        }

        /// Property (spec.md §8 #3): memory addresses embedded anywhere in
        /// a stack trace never change the fingerprint, for any surrounding
        /// text and any valid hex address.
        #[test]
        fn embedding_a_memory_address_is_a_no_op(
            frame in "[a-zA-Z_/.]{1,40}:[0-9]{1,5}",
            address in "[0-9a-f]{6,16}",
        ) {
            let p = ProjectId::new();
            let bare = input_of(p, &frame);
            let with_address = format!("{frame} (0x{address})");
            let decorated = input_of(p, &with_address);
            prop_assert_eq!(fingerprint(bare), fingerprint(decorated));
        }
    }

    fn input_of<'a>(project_id: ProjectId, stack_trace: &'a str) -> FingerprintInput<'a> {
        FingerprintInput {
            project_id,
            message: "boom",
            environment: "prod",
            level: Level::Error,
            stack_trace: Some(stack_trace),
        }
    }
}
