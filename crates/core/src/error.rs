//! Error taxonomy for the ingestion/auth core.
//!
//! A single tagged enum covers every failure kind in spec.md §7
//! (`ClientFormat | Auth | Quota | Ingest | Backend`), each carrying a
//! stable symbolic code so the HTTP layer can pattern-match to a status and
//! envelope without re-deriving the mapping.

use thiserror::Error;

/// Result type used across the core (auth, rate-limiting, ingestion).
pub type ErrlyResult<T> = Result<T, ErrlyError>;

/// Core error kind. `code()` is the stable symbolic code from spec.md §6/§7
/// (`{"error": <message>, "code": <code>}`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrlyError {
    /// Malformed request: bad header, bad token shape, bad JSON body.
    #[error("{message}")]
    ClientFormat { code: &'static str, message: String },

    /// Authentication/authorization failure (unknown key, expired, wrong scope).
    #[error("{message}")]
    Auth { code: &'static str, message: String },

    /// Rate limit exceeded.
    #[error("{message}")]
    Quota {
        code: &'static str,
        message: String,
        limit: u32,
        window_secs: u32,
        reset_time: i64,
        retry_after_secs: i64,
    },

    /// The ingestion pipeline aborted a batch (event insert or issue upsert failed).
    #[error("{message}")]
    Ingest { code: &'static str, message: String },

    /// A backing store is unreachable or returned an unexpected error.
    #[error("{message}")]
    Backend { code: &'static str, message: String },
}

impl ErrlyError {
    pub fn code(&self) -> &'static str {
        match self {
            ErrlyError::ClientFormat { code, .. } => code,
            ErrlyError::Auth { code, .. } => code,
            ErrlyError::Quota { code, .. } => code,
            ErrlyError::Ingest { code, .. } => code,
            ErrlyError::Backend { code, .. } => code,
        }
    }

    pub fn client_format(message: impl Into<String>) -> Self {
        Self::ClientFormat {
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }

    pub fn client_format_coded(code: &'static str, message: impl Into<String>) -> Self {
        Self::ClientFormat {
            code,
            message: message.into(),
        }
    }

    pub fn auth(code: &'static str, message: impl Into<String>) -> Self {
        Self::Auth {
            code,
            message: message.into(),
        }
    }

    pub fn ingest_failed(message: impl Into<String>) -> Self {
        Self::Ingest {
            code: "INGEST_FAILED",
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Backend {
            code: "INTERNAL_ERROR",
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Backend {
            code: "SERVICE_UNAVAILABLE",
            message: message.into(),
        }
    }
}
