// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! dblock-core: database-arbitrated locks
//!
//! This crate provides:
//! - Deterministic lock keys derived from namespace, kind and parameters
//! - `ExclusiveLock` over the server's named-lock primitive
//! - `ReadWriteLock` over the locking-service read/write primitives
//! - Classification of driver errors into typed lock timeouts
//! - Lock kind configuration loaded from TOML

pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod key;
pub mod timeout;

pub mod exclusive;
pub mod read_write;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

// Re-exports
pub use classify::classify;
pub use config::{ConfigError, ExclusiveKind, LocksConfig, ReadWriteKind};
pub use error::{BoxError, DriverError, LockError, TimeoutError, Vendor};
pub use exclusive::ExclusiveLock;
pub use executor::{sql, ConnectionProvider, ProviderSlot, QueryExecutor, QueryParam, SharedConnection};
pub use key::{derive_key, LockIdentity, LockKey, ScalarParam};
pub use read_write::{LockMode, ReadWriteLock};
pub use timeout::{InvalidTimeout, LockTimeout};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeConnection, FakeDatabase, QueryCall};
