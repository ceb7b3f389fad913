// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MySQL executor over a single `sqlx` connection
//!
//! Named-lock ownership is scoped to the server connection, so a provider
//! must keep handing out the same connection. `MySqlExecutor` owns one
//! connection plus a current-thread runtime and blocks on every query.
//! Calls made from inside another tokio runtime fail with
//! [`MySqlError::NestedRuntime`].

use crate::placeholders::{rewrite_named, PlaceholderError};
use dblock_core::{BoxError, ConnectionProvider, DriverError, LockError, QueryExecutor, QueryParam, Vendor};
use sqlx::mysql::{MySqlConnection, MySqlDatabaseError, MySqlRow};
use sqlx::{Connection, Row};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::runtime::Runtime;

#[derive(Debug, Error)]
pub enum MySqlError {
    #[error("failed to start query runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to connect: {0}")]
    Connect(#[source] sqlx::Error),
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),
    #[error("unsupported column type {0}")]
    UnsupportedColumn(String),
    #[error("blocking mysql call made from inside a tokio runtime")]
    NestedRuntime,
    /// Client-side failure (I/O, TLS, protocol, configuration); never
    /// carries a server error code
    #[error("mysql client error: {0}")]
    Client(#[source] sqlx::Error),
}

/// Blocking on the private runtime panics inside another runtime
fn ensure_outside_runtime() -> Result<(), MySqlError> {
    match tokio::runtime::Handle::try_current() {
        Ok(_) => Err(MySqlError::NestedRuntime),
        Err(_) => Ok(()),
    }
}

/// Blocking executor owning one MySQL connection
pub struct MySqlExecutor {
    runtime: Runtime,
    conn: Mutex<MySqlConnection>,
}

impl MySqlExecutor {
    pub fn connect(url: &str) -> Result<Self, MySqlError> {
        ensure_outside_runtime()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(MySqlError::Runtime)?;
        let conn = runtime
            .block_on(MySqlConnection::connect(url))
            .map_err(MySqlError::Connect)?;

        tracing::info!("mysql connection established");
        Ok(Self {
            runtime,
            conn: Mutex::new(conn),
        })
    }
}

impl QueryExecutor for MySqlExecutor {
    fn execute(&self, query: &str, params: &[(&str, QueryParam)]) -> Result<Option<String>, BoxError> {
        ensure_outside_runtime()?;
        let (sql, binds) = rewrite_named(query, params).map_err(MySqlError::from)?;

        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let row = self
            .runtime
            .block_on(async {
                let mut q = sqlx::query(&sql);
                for bind in binds {
                    q = match bind {
                        QueryParam::Int(v) => q.bind(v),
                        QueryParam::Str(v) => q.bind(v),
                    };
                }
                q.fetch_optional(&mut *conn).await
            })
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(first_column(&row)?),
            None => Ok(None),
        }
    }
}

/// First column as text; lock functions return signed or unsigned integers
fn first_column(row: &MySqlRow) -> Result<Option<String>, MySqlError> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(0) {
        return Ok(v.map(|v| v.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(0) {
        return Ok(v.map(|v| v.to_string()));
    }
    row.try_get::<Option<String>, _>(0)
        .map_err(|e| MySqlError::UnsupportedColumn(e.to_string()))
}

/// Map a driver failure into the form the classifier inspects
///
/// Only errors reported by the server become a [`DriverError`], tagged with
/// MySQL's numeric error number (falling back to the SQLSTATE). Client-side
/// failures pass through as [`MySqlError::Client`] so they can never be
/// mistaken for a lock-wait timeout.
pub fn query_error(err: sqlx::Error) -> BoxError {
    let driver = match err.as_database_error() {
        Some(db) => {
            let code = db
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(|e| e.number().to_string())
                .or_else(|| db.code().map(|c| c.into_owned()));
            let error = DriverError::new(Vendor::MySql, db.message().to_string());
            match code {
                Some(code) => error.with_code(code),
                None => error,
            }
        }
        None => return Box::new(MySqlError::Client(err)),
    };
    Box::new(driver)
}

/// Provider that connects on first use and reuses that connection
pub struct MySqlProvider {
    url: String,
    executor: Mutex<Option<Arc<dyn QueryExecutor>>>,
    traced: bool,
}

impl MySqlProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            executor: Mutex::new(None),
            traced: false,
        }
    }

    /// Wrap the connection in a [`TracedExecutor`](crate::TracedExecutor)
    pub fn with_tracing(mut self) -> Self {
        self.traced = true;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.executor
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl ConnectionProvider for MySqlProvider {
    fn resolve(&self) -> Result<Arc<dyn QueryExecutor>, LockError> {
        let mut slot = self.executor.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(executor) = slot.as_ref() {
            return Ok(Arc::clone(executor));
        }

        let executor = MySqlExecutor::connect(&self.url).map_err(|e| {
            tracing::error!(error = %e, "mysql connect failed");
            LockError::Query(Box::new(e))
        })?;
        let executor: Arc<dyn QueryExecutor> = if self.traced {
            Arc::new(crate::TracedExecutor::new(executor))
        } else {
            Arc::new(executor)
        };
        *slot = Some(Arc::clone(&executor));
        Ok(executor)
    }
}

#[cfg(test)]
#[path = "mysql_tests.rs"]
mod tests;
