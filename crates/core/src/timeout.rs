// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock wait timeouts
//!
//! The database takes whole seconds, with `-1` meaning wait until the
//! connection ends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How long the database should wait for a lock
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeout", into = "RawTimeout")]
pub enum LockTimeout {
    /// Wait forever (until the connection ends)
    #[default]
    Infinite,
    /// Wait up to the given number of seconds
    Seconds(u32),
}

impl LockTimeout {
    /// Do not wait at all
    pub const NO_WAIT: LockTimeout = LockTimeout::Seconds(0);

    /// Value bound into the lock query
    pub fn as_query_seconds(&self) -> i64 {
        match self {
            LockTimeout::Infinite => -1,
            LockTimeout::Seconds(secs) => i64::from(*secs),
        }
    }

    /// Interpret a query-level timeout; negative values mean infinite
    pub fn from_query_seconds(secs: i64) -> Self {
        if secs < 0 {
            LockTimeout::Infinite
        } else {
            LockTimeout::Seconds(u32::try_from(secs).unwrap_or(u32::MAX))
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            LockTimeout::Infinite => None,
            LockTimeout::Seconds(secs) => Some(Duration::from_secs(u64::from(*secs))),
        }
    }
}

impl fmt::Display for LockTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockTimeout::Infinite => f.write_str("infinite"),
            LockTimeout::Seconds(secs) => write!(f, "{}s", secs),
        }
    }
}

/// Error parsing a timeout from configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid lock timeout '{value}': {reason}")]
pub struct InvalidTimeout {
    pub value: String,
    pub reason: String,
}

impl std::str::FromStr for LockTimeout {
    type Err = InvalidTimeout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("infinite") {
            return Ok(LockTimeout::Infinite);
        }
        if let Ok(secs) = trimmed.parse::<i64>() {
            return Ok(LockTimeout::from_query_seconds(secs));
        }

        let invalid = |reason: String| InvalidTimeout {
            value: s.to_string(),
            reason,
        };
        let duration = humantime::parse_duration(trimmed).map_err(|e| invalid(e.to_string()))?;
        if duration.subsec_nanos() != 0 {
            return Err(invalid("must be a whole number of seconds".to_string()));
        }
        u32::try_from(duration.as_secs())
            .map(LockTimeout::Seconds)
            .map_err(|_| invalid("too large".to_string()))
    }
}

/// Wire form: integer seconds or a string
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTimeout {
    Seconds(i64),
    Text(String),
}

impl TryFrom<RawTimeout> for LockTimeout {
    type Error = InvalidTimeout;

    fn try_from(raw: RawTimeout) -> Result<Self, Self::Error> {
        match raw {
            RawTimeout::Seconds(secs) => Ok(LockTimeout::from_query_seconds(secs)),
            RawTimeout::Text(text) => text.parse(),
        }
    }
}

impl From<LockTimeout> for RawTimeout {
    fn from(timeout: LockTimeout) -> Self {
        match timeout {
            LockTimeout::Infinite => RawTimeout::Text("infinite".to_string()),
            LockTimeout::Seconds(secs) => RawTimeout::Seconds(i64::from(secs)),
        }
    }
}

#[cfg(test)]
#[path = "timeout_tests.rs"]
mod tests;
