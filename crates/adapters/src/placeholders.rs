// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named placeholder rewriting
//!
//! Lock queries use `:name` placeholders. Drivers that only understand
//! positional `?` binds get the query rewritten and the values reordered to
//! match. Text inside quotes is copied through untouched.

use dblock_core::QueryParam;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("no value bound for placeholder :{0}")]
    Unbound(String),
}

/// Rewrite `:name` placeholders to `?` and return the values in bind order
pub fn rewrite_named(
    query: &str,
    params: &[(&str, QueryParam)],
) -> Result<(String, Vec<QueryParam>), PlaceholderError> {
    let mut sql = String::with_capacity(query.len());
    let mut binds = Vec::new();

    for token in tokenize(query) {
        match token {
            Token::Text(text) => sql.push_str(text),
            Token::Placeholder(name) => {
                let value = params
                    .iter()
                    .find(|(bound, _)| *bound == name)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| PlaceholderError::Unbound(name.to_string()))?;
                sql.push('?');
                binds.push(value);
            }
        }
    }

    Ok((sql, binds))
}

/// Placeholder names in order of appearance (repeats included)
pub fn placeholder_names(query: &str) -> Vec<&str> {
    tokenize(query)
        .into_iter()
        .filter_map(|token| match token {
            Token::Placeholder(name) => Some(name),
            Token::Text(_) => None,
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn is_name_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn tokenize(query: &str) -> Vec<Token<'_>> {
    let bytes = query.as_bytes();
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut i = 0;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Some(q) => {
                if c == b'\\' {
                    i += 1;
                } else if c == q {
                    quote = None;
                }
                i += 1;
            }
            None if c == b'\'' || c == b'"' || c == b'`' => {
                quote = Some(c);
                i += 1;
            }
            // `::` is a cast in some dialects, never a placeholder
            None if c == b':' && bytes.get(i + 1) == Some(&b':') => i += 2,
            None if c == b':' && bytes.get(i + 1).copied().is_some_and(is_name_start) => {
                if start < i {
                    tokens.push(Token::Text(&query[start..i]));
                }
                let name_start = i + 1;
                let mut end = name_start;
                while end < bytes.len() && is_name_char(bytes[end]) {
                    end += 1;
                }
                tokens.push(Token::Placeholder(&query[name_start..end]));
                i = end;
                start = end;
            }
            None => i += 1,
        }
    }

    if start < bytes.len() {
        tokens.push(Token::Text(&query[start..]));
    }
    tokens
}

#[cfg(test)]
#[path = "placeholders_tests.rs"]
mod tests;
