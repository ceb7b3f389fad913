// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced executor wrapper for consistent observability

use crate::placeholders::placeholder_names;
use dblock_core::{BoxError, QueryExecutor, QueryParam};

/// Wrapper that adds tracing to any QueryExecutor
#[derive(Clone)]
pub struct TracedExecutor<E> {
    inner: E,
}

impl<E> TracedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

impl<E: QueryExecutor> QueryExecutor for TracedExecutor<E> {
    fn execute(&self, query: &str, params: &[(&str, QueryParam)]) -> Result<Option<String>, BoxError> {
        let span = tracing::info_span!("db.query", query);
        let _guard = span.enter();

        tracing::debug!(param_count = params.len(), "executing");

        // Precondition: every placeholder has a bound value
        if let Some(name) = placeholder_names(query)
            .into_iter()
            .find(|name| !params.iter().any(|(bound, _)| bound == name))
        {
            tracing::error!(placeholder = name, "unbound placeholder");
            return Err(format!("no value bound for placeholder :{name}").into());
        }

        let start = std::time::Instant::now();
        let result = self.inner.execute(query, params);
        let elapsed = start.elapsed();

        match &result {
            Ok(value) => tracing::debug!(
                result = value.as_deref().unwrap_or("NULL"),
                elapsed_ms = elapsed.as_millis() as u64,
                "query complete"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "query failed"
            ),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
