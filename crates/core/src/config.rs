// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock kinds and their configuration
//!
//! A kind names a family of locks (the "class" part of the lock key), the
//! namespace it derives keys in, and its default timeouts. Kinds can be
//! built in code or loaded from a TOML file:
//!
//! ```toml
//! [exclusive.report_export]
//! timeout = "30s"
//!
//! [read_write.catalog]
//! read_timeout = 0
//! write_timeout = "infinite"
//! ```

use crate::timeout::LockTimeout;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration for a family of exclusive locks
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusiveKind {
    /// Name identifying this kind of lock
    pub name: String,
    /// Namespace keys are derived in
    pub namespace: String,
    /// Default wait when `lock()` is called without a timeout
    pub timeout: LockTimeout,
}

impl ExclusiveKind {
    pub const DEFAULT_NAMESPACE: &'static str = "masterExclusive";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Self::DEFAULT_NAMESPACE.to_string(),
            timeout: LockTimeout::Infinite,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_timeout(mut self, timeout: LockTimeout) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Configuration for a family of read/write locks
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadWriteKind {
    pub name: String,
    pub namespace: String,
    pub read_timeout: LockTimeout,
    pub write_timeout: LockTimeout,
}

impl ReadWriteKind {
    pub const DEFAULT_NAMESPACE: &'static str = "masterExtended";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Self::DEFAULT_NAMESPACE.to_string(),
            read_timeout: LockTimeout::NO_WAIT,
            write_timeout: LockTimeout::Infinite,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_read_timeout(mut self, timeout: LockTimeout) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: LockTimeout) -> Self {
        self.write_timeout = timeout;
        self
    }
}

/// Errors loading lock configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExclusive {
    namespace: Option<String>,
    timeout: Option<LockTimeout>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReadWrite {
    namespace: Option<String>,
    read_timeout: Option<LockTimeout>,
    write_timeout: Option<LockTimeout>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLocksConfig {
    #[serde(default)]
    exclusive: BTreeMap<String, RawExclusive>,
    #[serde(default)]
    read_write: BTreeMap<String, RawReadWrite>,
}

/// Lock kinds loaded from configuration, keyed by kind name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocksConfig {
    exclusive: BTreeMap<String, ExclusiveKind>,
    read_write: BTreeMap<String, ReadWriteKind>,
}

impl LocksConfig {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawLocksConfig = toml::from_str(content)?;

        let exclusive = raw
            .exclusive
            .into_iter()
            .map(|(name, entry)| {
                let mut kind = ExclusiveKind::new(name.clone());
                if let Some(namespace) = entry.namespace {
                    kind = kind.with_namespace(namespace);
                }
                if let Some(timeout) = entry.timeout {
                    kind = kind.with_timeout(timeout);
                }
                (name, kind)
            })
            .collect();

        let read_write = raw
            .read_write
            .into_iter()
            .map(|(name, entry)| {
                let mut kind = ReadWriteKind::new(name.clone());
                if let Some(namespace) = entry.namespace {
                    kind = kind.with_namespace(namespace);
                }
                if let Some(timeout) = entry.read_timeout {
                    kind = kind.with_read_timeout(timeout);
                }
                if let Some(timeout) = entry.write_timeout {
                    kind = kind.with_write_timeout(timeout);
                }
                (name, kind)
            })
            .collect();

        Ok(Self {
            exclusive,
            read_write,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!(
            path = %path.display(),
            exclusive = config.exclusive.len(),
            read_write = config.read_write.len(),
            "loaded lock config"
        );
        Ok(config)
    }

    pub fn exclusive(&self, name: &str) -> Option<&ExclusiveKind> {
        self.exclusive.get(name)
    }

    pub fn read_write(&self, name: &str) -> Option<&ReadWriteKind> {
        self.read_write.get(name)
    }

    pub fn exclusive_kinds(&self) -> impl Iterator<Item = &ExclusiveKind> {
        self.exclusive.values()
    }

    pub fn read_write_kinds(&self) -> impl Iterator<Item = &ReadWriteKind> {
        self.read_write.values()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
