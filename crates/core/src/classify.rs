// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classification of driver failures into lock timeouts
//!
//! Databases report lock-wait timeouts as ordinary driver errors. The
//! classifier finds the first [`DriverError`] in the `source()` chain and
//! compares it against a fixed signature table. Anything else, including a
//! chain with no driver error at all, is passed through untouched.
//!
//! Structured vendor codes are preferred. Message substrings are only
//! consulted when the driver error carries no code; that fallback is fragile
//! by nature, since any message containing a signature will match.

use crate::error::{BoxError, DriverError, LockError, TimeoutError, Vendor};
use crate::timeout::LockTimeout;
use std::error::Error;

/// Vendor error codes that mean "lock wait timed out"
pub const TIMEOUT_CODES: &[(Vendor, &str)] = &[
    // ER_LOCKING_SERVICE_TIMEOUT
    (Vendor::MySql, "3133"),
];

/// Message fragments matched when no code is available
pub const TIMEOUT_MESSAGES: &[&str] = &["3133", "Service lock wait timeout exceeded"];

/// Find the first driver-level error in the cause chain
pub fn find_driver_error<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a DriverError> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(driver) = err.downcast_ref::<DriverError>() {
            return Some(driver);
        }
        current = err.source();
    }
    None
}

/// Whether a driver error matches a timeout signature
pub fn is_timeout_signature(driver: &DriverError) -> bool {
    match &driver.code {
        Some(code) => TIMEOUT_CODES
            .iter()
            .any(|(vendor, c)| *vendor == driver.vendor && c == code),
        None => TIMEOUT_MESSAGES
            .iter()
            .any(|fragment| driver.message.contains(fragment)),
    }
}

/// Convert a failed lock query into a timeout, or pass the error through
pub fn classify(
    error: BoxError,
    class_name: &str,
    timeout: LockTimeout,
    write_mode: bool,
) -> LockError {
    if let Some(driver) = find_driver_error(&*error).filter(|d| is_timeout_signature(d)) {
        tracing::debug!(
            class_name,
            %timeout,
            write_mode,
            vendor = %driver.vendor,
            code = driver.code.as_deref(),
            error = %driver,
            "driver reported lock wait timeout"
        );
        return LockError::Timeout(TimeoutError::new(class_name, timeout, write_mode));
    }
    LockError::Query(error)
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
