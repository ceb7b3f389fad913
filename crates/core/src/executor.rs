// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query execution and connection resolution
//!
//! Locks never talk to a driver directly. They resolve a [`QueryExecutor`]
//! through a [`ConnectionProvider`] on every operation and run one
//! parameterized query that yields a single scalar.

use crate::error::{BoxError, LockError};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Lock queries (MySQL dialect, named placeholders)
pub mod sql {
    pub const GET_LOCK: &str = "SELECT GET_LOCK(:key, :timeout)";
    pub const RELEASE_LOCK: &str = "SELECT RELEASE_LOCK(:key)";
    pub const IS_USED_LOCK: &str = "SELECT IS_USED_LOCK(:key)";
    pub const CONNECTION_ID: &str = "SELECT CONNECTION_ID()";
    pub const GET_READ_LOCKS: &str = "SELECT service_get_read_locks(:namespace, :key, :timeout)";
    pub const GET_WRITE_LOCKS: &str = "SELECT service_get_write_locks(:namespace, :key, :timeout)";
    pub const RELEASE_LOCKS: &str = "SELECT service_release_locks(:namespace)";
}

/// A bound query parameter; integers bind distinctly from strings
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryParam {
    Int(i64),
    Str(String),
}

impl fmt::Display for QueryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryParam::Int(v) => write!(f, "{}", v),
            QueryParam::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        QueryParam::Int(v)
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        QueryParam::Str(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        QueryParam::Str(v)
    }
}

/// Runs a parameterized query and returns the first column of the first row
pub trait QueryExecutor: Send + Sync {
    /// `params` pairs placeholder names (without the leading `:`) with values.
    /// Returns `None` when there is no row or the value is NULL.
    fn execute(&self, query: &str, params: &[(&str, QueryParam)]) -> Result<Option<String>, BoxError>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for Arc<E> {
    fn execute(&self, query: &str, params: &[(&str, QueryParam)]) -> Result<Option<String>, BoxError> {
        (**self).execute(query, params)
    }
}

/// Resolves the live executor a lock should use
pub trait ConnectionProvider: Send + Sync {
    fn resolve(&self) -> Result<Arc<dyn QueryExecutor>, LockError>;
}

impl<F> ConnectionProvider for F
where
    F: Fn() -> Result<Arc<dyn QueryExecutor>, LockError> + Send + Sync,
{
    fn resolve(&self) -> Result<Arc<dyn QueryExecutor>, LockError> {
        self()
    }
}

/// Provider handing out one already-open connection
#[derive(Clone)]
pub struct SharedConnection {
    executor: Arc<dyn QueryExecutor>,
}

impl SharedConnection {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }
}

impl ConnectionProvider for SharedConnection {
    fn resolve(&self) -> Result<Arc<dyn QueryExecutor>, LockError> {
        Ok(Arc::clone(&self.executor))
    }
}

/// Init-once provider slot
///
/// Locks may be built against the slot before startup wiring installs the
/// real provider. Resolving before `install` fails with
/// [`LockError::NotConfigured`]. Clones share the same slot.
#[derive(Clone, Default)]
pub struct ProviderSlot {
    inner: Arc<OnceLock<Arc<dyn ConnectionProvider>>>,
}

impl ProviderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the provider; fails if one is already installed
    pub fn install(&self, provider: Arc<dyn ConnectionProvider>) -> Result<(), LockError> {
        self.inner
            .set(provider)
            .map_err(|_| LockError::NotConfigured("connection provider already installed".to_string()))
    }

    pub fn is_installed(&self) -> bool {
        self.inner.get().is_some()
    }
}

impl ConnectionProvider for ProviderSlot {
    fn resolve(&self) -> Result<Arc<dyn QueryExecutor>, LockError> {
        match self.inner.get() {
            Some(provider) => provider.resolve(),
            None => Err(LockError::NotConfigured(
                "connection provider must be installed before any lock operation".to_string(),
            )),
        }
    }
}

/// Whether a scalar result means success: a nonzero integer
pub fn is_truthy(result: Option<&str>) -> bool {
    result
        .and_then(|s| s.trim().parse::<i64>().ok())
        .is_some_and(|n| n != 0)
}
