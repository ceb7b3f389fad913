// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock key derivation
//!
//! A lock key is the SHA-256 hex digest of `namespace|class|param1|param2|...`.
//! Parameter order is part of the identity. A parameter containing the
//! separator can make two different tuples render the same string; callers
//! choose parameters that avoid it.

use sha2::{Digest, Sha256};
use std::fmt;

const SEPARATOR: &str = "|";

/// A scalar parameter identifying a lock target
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarParam {
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for ScalarParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarParam::Int(v) => write!(f, "{}", v),
            ScalarParam::Uint(v) => write!(f, "{}", v),
            ScalarParam::Float(v) => f.write_str(&render_float(*v)),
            ScalarParam::Str(v) => f.write_str(v),
            // true renders as "1", false as nothing
            ScalarParam::Bool(true) => f.write_str("1"),
            ScalarParam::Bool(false) => Ok(()),
        }
    }
}

impl From<i64> for ScalarParam {
    fn from(v: i64) -> Self {
        ScalarParam::Int(v)
    }
}

impl From<i32> for ScalarParam {
    fn from(v: i32) -> Self {
        ScalarParam::Int(i64::from(v))
    }
}

impl From<u64> for ScalarParam {
    fn from(v: u64) -> Self {
        ScalarParam::Uint(v)
    }
}

impl From<u32> for ScalarParam {
    fn from(v: u32) -> Self {
        ScalarParam::Uint(u64::from(v))
    }
}

impl From<f64> for ScalarParam {
    fn from(v: f64) -> Self {
        ScalarParam::Float(v)
    }
}

impl From<bool> for ScalarParam {
    fn from(v: bool) -> Self {
        ScalarParam::Bool(v)
    }
}

impl From<&str> for ScalarParam {
    fn from(v: &str) -> Self {
        ScalarParam::Str(v.to_string())
    }
}

impl From<String> for ScalarParam {
    fn from(v: String) -> Self {
        ScalarParam::Str(v)
    }
}

/// Significant digits used when a float becomes part of a key
const FLOAT_PRECISION: i32 = 14;

/// Render a float like a `%.14G` conversion: shortest of fixed or
/// scientific notation, trailing zeros dropped, `1.0E+15` style exponents.
/// Integral values render without a fraction, so `1.0` keys like `1`.
fn render_float(v: f64) -> String {
    if v.is_nan() {
        return "NAN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Exponent after rounding to the significant digits
    let sci = format!("{:.*e}", (FLOAT_PRECISION - 1) as usize, v);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= FLOAT_PRECISION {
        let mut mantissa = trim_fraction(mantissa).to_string();
        if !mantissa.contains('.') {
            mantissa.push_str(".0");
        }
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}E{}{}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (FLOAT_PRECISION - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, v)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Derived lock key (64 hex chars)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LockKey(String);

impl LockKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the key for a lock target
pub fn derive_key(namespace: &str, class_name: &str, params: &[ScalarParam]) -> LockKey {
    let mut parts = Vec::with_capacity(params.len() + 2);
    parts.push(namespace.to_string());
    parts.push(class_name.to_string());
    parts.extend(params.iter().map(ToString::to_string));

    let mut hasher = Sha256::new();
    hasher.update(parts.join(SEPARATOR).as_bytes());
    LockKey(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Immutable identity of a lock object, with its key computed once
#[derive(Clone, Debug, PartialEq)]
pub struct LockIdentity {
    namespace: String,
    class_name: String,
    params: Vec<ScalarParam>,
    key: LockKey,
}

impl LockIdentity {
    pub fn new(
        namespace: impl Into<String>,
        class_name: impl Into<String>,
        params: Vec<ScalarParam>,
    ) -> Self {
        let namespace = namespace.into();
        let class_name = class_name.into();
        let key = derive_key(&namespace, &class_name, &params);
        Self {
            namespace,
            class_name,
            params,
            key,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn params(&self) -> &[ScalarParam] {
        &self.params
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
