// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fake of the database lock primitives for testing
//!
//! Emulates MySQL named locks (`GET_LOCK` and friends) and the locking
//! service read/write UDFs, with real blocking: waiters park on a condvar
//! until the lock frees up or their timeout expires. Like MySQL, a named
//! lock wait that expires returns `0`, while a locking-service wait that
//! expires raises error 3133.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::error::{BoxError, DriverError, Vendor};
use crate::executor::{sql, ConnectionProvider, QueryExecutor, QueryParam, SharedConnection};
use crate::timeout::LockTimeout;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Instant;

/// Recorded query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCall {
    pub query: String,
    pub params: Vec<(String, QueryParam)>,
}

#[derive(Debug)]
struct NamedLock {
    owner: u64,
    count: u32,
}

#[derive(Debug, Default)]
struct ServiceLock {
    readers: HashMap<u64, u32>,
    writer: Option<(u64, u32)>,
}

impl ServiceLock {
    fn is_free(&self) -> bool {
        self.readers.is_empty() && self.writer.is_none()
    }
}

#[derive(Debug, Default)]
struct ServerState {
    next_connection: u64,
    named: HashMap<String, NamedLock>,
    /// namespace -> lock name -> holders
    services: HashMap<String, HashMap<String, ServiceLock>>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<ServerState>,
    changed: Condvar,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Retry `try_acquire` until it succeeds or the timeout expires
    fn acquire_with<F>(&self, timeout: LockTimeout, mut try_acquire: F) -> bool
    where
        F: FnMut(&mut ServerState) -> bool,
    {
        let deadline = timeout.as_duration().map(|d| Instant::now() + d);
        let mut state = self.lock_state();
        loop {
            if try_acquire(&mut *state) {
                return true;
            }
            match deadline {
                None => {
                    state = self.changed.wait(state).unwrap_or_else(|e| e.into_inner());
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    state = self
                        .changed
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(|e| e.into_inner())
                        .0;
                }
            }
        }
    }

    fn release_all(&self, connection: u64) {
        let mut state = self.lock_state();
        state.named.retain(|_, lock| lock.owner != connection);
        for locks in state.services.values_mut() {
            for lock in locks.values_mut() {
                release_service_holder(lock, connection);
            }
            locks.retain(|_, lock| !lock.is_free());
        }
        drop(state);
        self.changed.notify_all();
    }
}

fn release_service_holder(lock: &mut ServiceLock, connection: u64) {
    lock.readers.remove(&connection);
    if matches!(lock.writer, Some((owner, _)) if owner == connection) {
        lock.writer = None;
    }
}

/// Fake database server shared by any number of connections
#[derive(Clone, Default)]
pub struct FakeDatabase {
    shared: Arc<Shared>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new connection with its own connection id
    pub fn connect(&self) -> FakeConnection {
        let id = {
            let mut state = self.shared.lock_state();
            state.next_connection += 1;
            state.next_connection
        };
        FakeConnection {
            id,
            shared: Arc::clone(&self.shared),
            calls: Arc::default(),
            failures: Arc::default(),
            closed: Arc::default(),
        }
    }

    /// Connection id holding a named lock, if any
    pub fn named_lock_owner(&self, key: &str) -> Option<u64> {
        self.shared.lock_state().named.get(key).map(|l| l.owner)
    }

    /// Number of connections holding a read lock
    pub fn reader_count(&self, namespace: &str, key: &str) -> usize {
        self.shared
            .lock_state()
            .services
            .get(namespace)
            .and_then(|locks| locks.get(key))
            .map_or(0, |l| l.readers.len())
    }

    /// Connection id holding the write lock, if any
    pub fn writer(&self, namespace: &str, key: &str) -> Option<u64> {
        self.shared
            .lock_state()
            .services
            .get(namespace)
            .and_then(|locks| locks.get(key))
            .and_then(|l| l.writer.map(|(owner, _)| owner))
    }
}

/// One connection to a [`FakeDatabase`]
#[derive(Clone)]
pub struct FakeConnection {
    id: u64,
    shared: Arc<Shared>,
    calls: Arc<Mutex<Vec<QueryCall>>>,
    failures: Arc<Mutex<VecDeque<BoxError>>>,
    closed: Arc<Mutex<bool>>,
}

impl FakeConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Provider that always resolves to this connection
    pub fn provider(&self) -> Arc<dyn ConnectionProvider> {
        Arc::new(SharedConnection::new(Arc::new(self.clone())))
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<QueryCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of recorded calls of a query
    pub fn call_count(&self, query: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| c.query == query)
            .count()
    }

    /// Make the next query fail with the given error
    pub fn fail_next(&self, error: impl Into<BoxError>) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(error.into());
    }

    /// Drop the connection: every lock it holds is released and further
    /// queries fail
    pub fn disconnect(&self) {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner()) = true;
        self.shared.release_all(self.id);
    }

    fn get_lock(&self, key: &str, timeout: LockTimeout) -> Option<String> {
        let id = self.id;
        let acquired = self.shared.acquire_with(timeout, |state| {
            if let Some(lock) = state.named.get_mut(key) {
                // Reentrant for the owning connection
                if lock.owner != id {
                    return false;
                }
                lock.count += 1;
                return true;
            }
            state.named.insert(key.to_string(), NamedLock { owner: id, count: 1 });
            true
        });
        Some(if acquired { "1" } else { "0" }.to_string())
    }

    fn release_lock(&self, key: &str) -> Option<String> {
        let mut state = self.shared.lock_state();
        let lock = state.named.get_mut(key)?;
        if lock.owner != self.id {
            return Some("0".to_string());
        }
        lock.count -= 1;
        if lock.count == 0 {
            state.named.remove(key);
            drop(state);
            self.shared.changed.notify_all();
        }
        Some("1".to_string())
    }

    fn is_used_lock(&self, key: &str) -> Option<String> {
        self.shared
            .lock_state()
            .named
            .get(key)
            .map(|l| l.owner.to_string())
    }

    fn get_service_lock(
        &self,
        namespace: &str,
        key: &str,
        timeout: LockTimeout,
        write: bool,
    ) -> Result<Option<String>, BoxError> {
        let id = self.id;
        let acquired = self.shared.acquire_with(timeout, |state| {
            let lock = state
                .services
                .entry(namespace.to_string())
                .or_default()
                .entry(key.to_string())
                .or_default();
            let other_writer = matches!(lock.writer, Some((owner, _)) if owner != id);
            if write {
                let other_readers = lock.readers.keys().any(|&r| r != id);
                if other_writer || other_readers {
                    return false;
                }
                let count = lock.writer.map_or(0, |(_, c)| c);
                lock.writer = Some((id, count + 1));
            } else {
                if other_writer {
                    return false;
                }
                *lock.readers.entry(id).or_insert(0) += 1;
            }
            true
        });

        if !acquired {
            let mut state = self.shared.lock_state();
            if let Some(locks) = state.services.get_mut(namespace) {
                locks.retain(|_, lock| !lock.is_free());
            }
            return Err(Box::new(
                DriverError::new(Vendor::MySql, "Service lock wait timeout exceeded.").with_code("3133"),
            ));
        }
        Ok(Some("1".to_string()))
    }

    fn release_service_locks(&self, namespace: &str) -> Option<String> {
        let mut state = self.shared.lock_state();
        if let Some(locks) = state.services.get_mut(namespace) {
            for lock in locks.values_mut() {
                release_service_holder(lock, self.id);
            }
            locks.retain(|_, lock| !lock.is_free());
        }
        drop(state);
        self.shared.changed.notify_all();
        Some("1".to_string())
    }
}

fn param<'a>(params: &'a [(&str, QueryParam)], name: &str) -> Result<&'a QueryParam, BoxError> {
    params
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
        .ok_or_else(|| {
            DriverError::new(Vendor::MySql, format!("missing parameter :{}", name))
                .with_code("2031")
                .into()
        })
}

fn str_param<'a>(params: &'a [(&str, QueryParam)], name: &str) -> Result<&'a str, BoxError> {
    match param(params, name)? {
        QueryParam::Str(s) => Ok(s),
        QueryParam::Int(_) => {
            Err(DriverError::new(Vendor::MySql, format!(":{} must be a string", name)).into())
        }
    }
}

fn timeout_param(params: &[(&str, QueryParam)]) -> Result<LockTimeout, BoxError> {
    match param(params, "timeout")? {
        QueryParam::Int(secs) => Ok(LockTimeout::from_query_seconds(*secs)),
        QueryParam::Str(_) => {
            Err(DriverError::new(Vendor::MySql, ":timeout must be an integer").into())
        }
    }
}

impl QueryExecutor for FakeConnection {
    fn execute(&self, query: &str, params: &[(&str, QueryParam)]) -> Result<Option<String>, BoxError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(QueryCall {
                query: query.to_string(),
                params: params
                    .iter()
                    .map(|(n, v)| (n.to_string(), v.clone()))
                    .collect(),
            });

        if let Some(error) = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
        {
            return Err(error);
        }

        if *self.closed.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(DriverError::new(Vendor::MySql, "MySQL server has gone away")
                .with_code("2006")
                .into());
        }

        match query {
            sql::GET_LOCK => Ok(self.get_lock(str_param(params, "key")?, timeout_param(params)?)),
            sql::RELEASE_LOCK => Ok(self.release_lock(str_param(params, "key")?)),
            sql::IS_USED_LOCK => Ok(self.is_used_lock(str_param(params, "key")?)),
            sql::CONNECTION_ID => Ok(Some(self.id.to_string())),
            sql::GET_READ_LOCKS | sql::GET_WRITE_LOCKS => self.get_service_lock(
                str_param(params, "namespace")?,
                str_param(params, "key")?,
                timeout_param(params)?,
                query == sql::GET_WRITE_LOCKS,
            ),
            sql::RELEASE_LOCKS => Ok(self.release_service_locks(str_param(params, "namespace")?)),
            other => Err(DriverError::new(
                Vendor::MySql,
                format!("You have an error in your SQL syntax near '{}'", other),
            )
            .with_code("1064")
            .into()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
