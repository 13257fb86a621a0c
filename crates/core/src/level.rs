//! Event severity level.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::ErrlyError;

/// Severity of an error event (spec.md §3).
///
/// Participates in the fingerprint (spec.md §4.1): two events at different
/// levels are never the same issue.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    Info,
    Debug,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }
}

impl core::fmt::Display for Level {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ErrlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Level::Error),
            "warning" => Ok(Level::Warning),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            other => Err(ErrlyError::client_format(format!(
                "invalid level '{other}': expected one of error, warning, info, debug"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for level in [Level::Error, Level::Warning, Level::Info, Level::Debug] {
            let s = level.to_string();
            assert_eq!(Level::from_str(&s).unwrap(), level);
        }
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(Level::from_str("critical").is_err());
    }
}
