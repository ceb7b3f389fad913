// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lock operations

use crate::timeout::LockTimeout;
use std::fmt;
use thiserror::Error;

/// Boxed error returned by query executors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by lock operations
#[derive(Debug, Error)]
pub enum LockError {
    /// No connection provider has been installed
    #[error("no database connection configured: {0}")]
    NotConfigured(String),
    /// `lock()` called while this connection already holds the lock
    #[error("lock is already held by this connection")]
    AlreadyLocked,
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    /// Any database failure that is not a lock-wait timeout, passed through as-is
    #[error("{0}")]
    Query(#[source] BoxError),
}

impl LockError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LockError::Timeout(_))
    }

    /// The timeout details, if this is a timeout
    pub fn as_timeout(&self) -> Option<&TimeoutError> {
        match self {
            LockError::Timeout(t) => Some(t),
            _ => None,
        }
    }
}

/// The database gave up waiting for a lock
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lock {class_name} timeout ({timeout}) exceeded in {}", mode_label(.write_mode))]
pub struct TimeoutError {
    pub class_name: String,
    pub timeout: LockTimeout,
    /// Exclusive/write mode (true) or shared/read mode (false)
    pub write_mode: bool,
}

impl TimeoutError {
    pub fn new(class_name: impl Into<String>, timeout: LockTimeout, write_mode: bool) -> Self {
        Self {
            class_name: class_name.into(),
            timeout,
            write_mode,
        }
    }
}

fn mode_label(write_mode: &bool) -> &'static str {
    if *write_mode {
        "exclusive (write) mode"
    } else {
        "read mode"
    }
}

/// Database vendor that produced a driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    MySql,
    Unknown,
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vendor::MySql => "mysql",
            Vendor::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Error raised by the database driver itself
///
/// Executors report server and connection failures as this type, possibly
/// wrapped by other errors further up the `source()` chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    pub vendor: Vendor,
    /// Vendor error code, when the driver exposes one
    pub code: Option<String>,
    pub message: String,
}

impl DriverError {
    pub fn new(vendor: Vendor, message: impl Into<String>) -> Self {
        Self {
            vendor,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}
