// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Database adapters for dblock locks

#[cfg(feature = "mysql")]
pub mod mysql;
pub mod placeholders;
pub mod traced;

#[cfg(feature = "mysql")]
pub use mysql::{MySqlError, MySqlExecutor, MySqlProvider};
pub use placeholders::{rewrite_named, PlaceholderError};
pub use traced::TracedExecutor;
