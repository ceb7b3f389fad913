// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive lock over a database named lock
//!
//! Ownership of a named lock belongs to a database connection, not to this
//! object. The object keeps a local `held` flag recording that *it* took
//! the lock, and checks server ownership whenever the answer matters. The
//! two can disagree: a dropped connection loses the lock without the flag
//! noticing, and another object on the same connection shares ownership.

use crate::classify::classify;
use crate::config::ExclusiveKind;
use crate::error::{LockError, TimeoutError};
use crate::executor::{is_truthy, sql, ConnectionProvider, QueryExecutor, QueryParam};
use crate::key::{LockIdentity, LockKey, ScalarParam};
use crate::timeout::LockTimeout;
use std::sync::Arc;

/// A globally exclusive lock identified by kind and parameters
pub struct ExclusiveLock {
    kind: ExclusiveKind,
    identity: LockIdentity,
    provider: Arc<dyn ConnectionProvider>,
    held: bool,
}

impl ExclusiveLock {
    /// Build an inert (unlocked) lock; the key is derived here, once
    pub fn new(
        kind: ExclusiveKind,
        params: Vec<ScalarParam>,
        provider: Arc<dyn ConnectionProvider>,
    ) -> Self {
        let identity = LockIdentity::new(kind.namespace.clone(), kind.name.clone(), params);
        Self {
            kind,
            identity,
            provider,
            held: false,
        }
    }

    pub fn kind(&self) -> &ExclusiveKind {
        &self.kind
    }

    pub fn identity(&self) -> &LockIdentity {
        &self.identity
    }

    pub fn key(&self) -> &LockKey {
        self.identity.key()
    }

    /// Acquire the lock, waiting up to `timeout` (or the kind's default)
    ///
    /// Fails with [`LockError::AlreadyLocked`] if this connection already
    /// holds the lock, and with [`LockError::Timeout`] if the wait expires.
    pub fn lock(&mut self, timeout: Option<LockTimeout>) -> Result<(), LockError> {
        if self.is_locked_by_connection()? {
            tracing::warn!(lock = %self.kind.name, key = %self.key(), "lock already held by this connection");
            return Err(LockError::AlreadyLocked);
        }

        let timeout = timeout.unwrap_or(self.kind.timeout);
        tracing::debug!(lock = %self.kind.name, key = %self.key(), %timeout, "acquiring");

        let executor = self.provider.resolve()?;
        let result = executor
            .execute(
                sql::GET_LOCK,
                &[
                    ("key", QueryParam::from(self.key().as_str())),
                    ("timeout", QueryParam::Int(timeout.as_query_seconds())),
                ],
            )
            .map_err(|e| classify(e, &self.kind.name, timeout, true))?;

        self.held = is_truthy(result.as_deref());
        if !self.held {
            tracing::warn!(lock = %self.kind.name, key = %self.key(), %timeout, "lock wait timed out");
            return Err(TimeoutError::new(self.kind.name.clone(), timeout, true).into());
        }

        tracing::info!(lock = %self.kind.name, key = %self.key(), "lock acquired");
        Ok(())
    }

    /// Like [`lock`](Self::lock), but a no-op if this connection already
    /// holds the lock
    pub fn lock_quietly(&mut self, timeout: Option<LockTimeout>) -> Result<(), LockError> {
        if self.is_locked_by_connection()? {
            return Ok(());
        }
        self.lock(timeout)
    }

    /// Whether this object took the lock and the connection still owns it
    pub fn is_locked(&self) -> Result<bool, LockError> {
        Ok(self.held && self.is_locked_by_connection()?)
    }

    /// Whether the current connection owns the lock, regardless of which
    /// object acquired it
    pub fn is_locked_by_connection(&self) -> Result<bool, LockError> {
        let executor = self.provider.resolve()?;
        let owner = executor
            .execute(
                sql::IS_USED_LOCK,
                &[("key", QueryParam::from(self.key().as_str()))],
            )
            .map_err(LockError::Query)?;
        let Some(owner) = owner else {
            return Ok(false);
        };

        let current = executor
            .execute(sql::CONNECTION_ID, &[])
            .map_err(LockError::Query)?;
        Ok(current.as_deref() == Some(owner.as_str()))
    }

    /// Release the lock on this connection regardless of local state
    ///
    /// Returns whether the server actually released a lock. The local flag
    /// is cleared even if the query fails.
    pub fn force_release(&mut self) -> Result<bool, LockError> {
        self.held = false;

        let executor = self.provider.resolve()?;
        let result = executor
            .execute(
                sql::RELEASE_LOCK,
                &[("key", QueryParam::from(self.key().as_str()))],
            )
            .map_err(LockError::Query)?;

        let released = is_truthy(result.as_deref());
        tracing::info!(lock = %self.kind.name, key = %self.key(), released, "lock released");
        Ok(released)
    }

    /// Release the lock only if this object took it and the connection
    /// still owns it
    ///
    /// Otherwise clears the local flag and returns false without touching
    /// the server lock.
    pub fn release_if_locked(&mut self) -> Result<bool, LockError> {
        if !self.held {
            return Ok(false);
        }
        if !self.is_locked_by_connection()? {
            tracing::debug!(lock = %self.kind.name, key = %self.key(), "lock lost by connection");
            self.held = false;
            return Ok(false);
        }
        self.force_release()
    }
}

impl std::fmt::Debug for ExclusiveLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusiveLock")
            .field("kind", &self.kind.name)
            .field("key", self.key())
            .field("held", &self.held)
            .finish()
    }
}

#[cfg(test)]
#[path = "exclusive_tests.rs"]
mod tests;
