//! API key token format: parsing, validation, and hashing (spec.md §4.2).
//!
//! A raw token has the shape `errly_<4 lowercase alnum>_<64 hex>` — the
//! short segment exists purely so a leaked token is visually identifiable
//! in logs/diffs without revealing anything about the secret half. Only
//! the SHA-256 hash of the full token is ever persisted; the raw token is
//! shown to the client exactly once, at creation time.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;

const TOKEN_PATTERN: &str = r"^errly_[a-z0-9]{4}_[a-f0-9]{64}$";
const KEY_PREFIX_LEN: usize = 12;

static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token does not match the expected errly_<id>_<secret> format")]
    MalformedFormat,
}

/// Validate that `raw` has the exact shape a client-issued token must have.
///
/// This is a format check only — it says nothing about whether the token
/// is known, unexpired, or scoped for anything. Callers still need
/// `KeyRegistry::get_by_hash` to answer that (errly-infra).
pub fn validate_format(raw: &str) -> Result<(), TokenValidationError> {
    if TOKEN_REGEX.is_match(raw) {
        Ok(())
    } else {
        Err(TokenValidationError::MalformedFormat)
    }
}

/// SHA-256 hash of a raw token, hex-encoded. This is what `KeyRegistry`
/// indexes on and what gets stored — the raw token is never persisted.
pub fn hash_token(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    hex::encode(digest)
}

/// The non-secret prefix of a raw token, safe to store and display
/// alongside a key's metadata (e.g. in a dashboard's key list).
pub fn key_prefix(raw: &str) -> String {
    raw.chars().take(KEY_PREFIX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token() -> String {
        format!("errly_ab12_{}", "a".repeat(64))
    }

    #[test]
    fn accepts_well_formed_token() {
        assert!(validate_format(&sample_token()).is_ok());
    }

    #[test]
    fn rejects_wrong_prefix() {
        let bad = sample_token().replacen("errly_", "sntry_", 1);
        assert!(validate_format(&bad).is_err());
    }

    #[test]
    fn rejects_short_secret() {
        let bad = "errly_ab12_deadbeef".to_string();
        assert!(validate_format(&bad).is_err());
    }

    #[test]
    fn rejects_uppercase_secret() {
        let bad = format!("errly_ab12_{}", "A".repeat(64));
        assert!(validate_format(&bad).is_err());
    }

    #[test]
    fn hash_is_deterministic() {
        let token = sample_token();
        assert_eq!(hash_token(&token), hash_token(&token));
    }

    #[test]
    fn different_tokens_hash_differently() {
        let a = sample_token();
        let b = format!("errly_cd34_{}", "b".repeat(64));
        assert_ne!(hash_token(&a), hash_token(&b));
    }

    #[test]
    fn key_prefix_is_first_twelve_chars() {
        let token = sample_token();
        assert_eq!(key_prefix(&token), "errly_ab12_a");
        assert_eq!(key_prefix(&token).len(), KEY_PREFIX_LEN);
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

        /// Property (spec.md §8 #1): `validate_format` agrees with the
        /// `errly_<4 lowercase alnum>_<64 hex>` shape for any candidate
        /// string built from that exact alphabet.
        #[test]
        fn well_formed_candidates_always_validate(
            id in "[a-z0-9]{4}",
            secret in "[a-f0-9]{64}",
        ) {
            let token = format!("errly_{id}_{secret}");
            prop_assert!(validate_format(&token).is_ok());
        }

        /// Property (spec.md §8 #1, negative case): a token with an
        /// uppercase character anywhere in the secret half never validates.
        #[test]
        fn any_uppercase_in_secret_is_rejected(
            id in "[a-z0-9]{4}",
            prefix_len in 0usize..64,
        ) {
            let mut secret: Vec<char> = "a".repeat(64).chars().collect();
            secret[prefix_len] = 'A';
            let token = format!("errly_{id}_{}", secret.into_iter().collect::<String>());
            prop_assert!(validate_format(&token).is_err());
        }

        /// Property (spec.md §8 #2): hashing is a deterministic, pure
        /// function of its input bytes.
        #[test]
        fn hash_token_is_stable_for_arbitrary_input(s in ".*") {
            prop_assert_eq!(hash_token(&s), hash_token(&s));
        }
    }
}
