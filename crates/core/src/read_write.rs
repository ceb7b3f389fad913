// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read/write lock over the database locking service
//!
//! Readers share, a writer excludes everyone. All state lives on the server,
//! counted per connection; this object only knows how to ask for it. The
//! derived key serves as both the locking-service namespace and the lock
//! name, so `release()` drops exactly the locks this identity took on the
//! current connection.

use crate::classify::classify;
use crate::config::ReadWriteKind;
use crate::error::{LockError, TimeoutError};
use crate::executor::{is_truthy, sql, ConnectionProvider, QueryExecutor, QueryParam};
use crate::key::{LockIdentity, LockKey, ScalarParam};
use crate::timeout::LockTimeout;
use std::sync::Arc;

/// Lock mode requested from the locking service
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

impl LockMode {
    fn query(self) -> &'static str {
        match self {
            LockMode::Read => sql::GET_READ_LOCKS,
            LockMode::Write => sql::GET_WRITE_LOCKS,
        }
    }

    fn is_write(self) -> bool {
        self == LockMode::Write
    }
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockMode::Read => f.write_str("read"),
            LockMode::Write => f.write_str("write"),
        }
    }
}

/// A shared/exclusive lock identified by kind and parameters
pub struct ReadWriteLock {
    kind: ReadWriteKind,
    identity: LockIdentity,
    provider: Arc<dyn ConnectionProvider>,
}

impl ReadWriteLock {
    pub fn new(
        kind: ReadWriteKind,
        params: Vec<ScalarParam>,
        provider: Arc<dyn ConnectionProvider>,
    ) -> Self {
        let identity = LockIdentity::new(kind.namespace.clone(), kind.name.clone(), params);
        Self {
            kind,
            identity,
            provider,
        }
    }

    pub fn kind(&self) -> &ReadWriteKind {
        &self.kind
    }

    pub fn identity(&self) -> &LockIdentity {
        &self.identity
    }

    pub fn key(&self) -> &LockKey {
        self.identity.key()
    }

    /// Acquire in shared mode; waits while another connection writes
    pub fn lock_read(&self, timeout: Option<LockTimeout>) -> Result<(), LockError> {
        self.acquire(LockMode::Read, timeout.unwrap_or(self.kind.read_timeout))
    }

    /// Acquire in exclusive mode; waits while any other connection reads or
    /// writes
    pub fn lock_write(&self, timeout: Option<LockTimeout>) -> Result<(), LockError> {
        self.acquire(LockMode::Write, timeout.unwrap_or(self.kind.write_timeout))
    }

    /// Release every read and write lock this connection holds for this lock
    pub fn release(&self) -> Result<(), LockError> {
        let executor = self.provider.resolve()?;
        executor
            .execute(
                sql::RELEASE_LOCKS,
                &[("namespace", QueryParam::from(self.key().as_str()))],
            )
            .map_err(LockError::Query)?;

        tracing::info!(lock = %self.kind.name, key = %self.key(), "locks released");
        Ok(())
    }

    fn acquire(&self, mode: LockMode, timeout: LockTimeout) -> Result<(), LockError> {
        tracing::debug!(lock = %self.kind.name, key = %self.key(), %mode, %timeout, "acquiring");

        let executor = self.provider.resolve()?;
        let key = self.key().as_str();
        let result = executor
            .execute(
                mode.query(),
                &[
                    ("namespace", QueryParam::from(key)),
                    ("key", QueryParam::from(key)),
                    ("timeout", QueryParam::Int(timeout.as_query_seconds())),
                ],
            )
            .map_err(|e| classify(e, &self.kind.name, timeout, mode.is_write()))?;

        if !is_truthy(result.as_deref()) {
            tracing::warn!(lock = %self.kind.name, key = %self.key(), %mode, %timeout, "lock wait timed out");
            return Err(TimeoutError::new(self.kind.name.clone(), timeout, mode.is_write()).into());
        }

        tracing::info!(lock = %self.kind.name, key = %self.key(), %mode, "lock acquired");
        Ok(())
    }
}

impl std::fmt::Debug for ReadWriteLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadWriteLock")
            .field("kind", &self.kind.name)
            .field("key", self.key())
            .finish()
    }
}

#[cfg(test)]
#[path = "read_write_tests.rs"]
mod tests;
