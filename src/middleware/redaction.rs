// ABOUTME: Redaction and truncation of request data before it reaches the logs
// ABOUTME: Hides credentials in headers and JSON bodies and bounds body summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! PII-safe request logging helpers
//!
//! - HTTP header redaction (`Authorization`, `Cookie`, ...)
//! - JSON body summaries: nesting depth, entries per object or array and
//!   string length are bounded; password and token fields are replaced
//! - Plain-text bodies are cut to [`MAX_BODY_CHARS`]

use serde_json::{Map, Value};

/// Replacement for redacted values
pub const REDACTION_PLACEHOLDER: &str = "[REDACTED]";
/// Upper bound on a logged body, in characters
pub const MAX_BODY_CHARS: usize = 500;
/// Nesting levels kept in a JSON summary
pub const MAX_DEPTH: usize = 3;
/// Entries kept per object or array
pub const MAX_ITEMS: usize = 10;
/// Characters kept per scalar value
pub const MAX_VALUE_CHARS: usize = 200;

const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "proxy-authorization",
];

const SENSITIVE_FIELDS: &[&str] = &[
    "access",
    "refresh",
    "token",
    "access_token",
    "refresh_token",
    "secret",
    "api_key",
];

/// Whether a JSON key holds a credential
#[must_use]
pub fn is_sensitive_field(key: &str) -> bool {
    let key = key.to_lowercase();
    key.contains("password") || SENSITIVE_FIELDS.contains(&key.as_str())
}

/// Redact sensitive HTTP headers
pub fn redact_headers<'a, I>(headers: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    headers
        .into_iter()
        .map(|(name, value)| {
            let redacted = if SENSITIVE_HEADERS.contains(&name.to_lowercase().as_str()) {
                REDACTION_PLACEHOLDER.to_owned()
            } else {
                value.to_owned()
            };
            (name.to_owned(), redacted)
        })
        .collect()
}

/// Loggable summary of a request body
///
/// JSON is summarised with [`summarize_json`]; other text is truncated. The
/// result never exceeds [`MAX_BODY_CHARS`] plus a trailing ellipsis.
#[must_use]
pub fn summarize_body(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let text = match serde_json::from_slice::<Value>(body) {
        Ok(json) => summarize_json(&json, 0).to_string(),
        Err(_) => match std::str::from_utf8(body) {
            Ok(text) => text.to_owned(),
            Err(_) => return Some("<unable to decode>".to_owned()),
        },
    };
    Some(truncate(&text, MAX_BODY_CHARS))
}

/// Bounded, redacted copy of a JSON value
#[must_use]
pub fn summarize_json(value: &Value, depth: usize) -> Value {
    if depth >= MAX_DEPTH {
        return Value::String("...".to_owned());
    }
    match value {
        Value::Object(map) => {
            let mut summary = Map::new();
            for (key, value) in map.iter().take(MAX_ITEMS) {
                let entry = if is_sensitive_field(key) {
                    Value::String(REDACTION_PLACEHOLDER.to_owned())
                } else {
                    summarize_json(value, depth + 1)
                };
                summary.insert(key.clone(), entry);
            }
            if map.len() > MAX_ITEMS {
                summary.insert(
                    "...".to_owned(),
                    Value::String(format!("{} more items", map.len() - MAX_ITEMS)),
                );
            }
            Value::Object(summary)
        }
        Value::Array(items) => {
            let mut summary: Vec<Value> = items
                .iter()
                .take(MAX_ITEMS)
                .map(|item| summarize_json(item, depth + 1))
                .collect();
            if items.len() > MAX_ITEMS {
                summary.push(Value::String(format!(
                    "... {} more items",
                    items.len() - MAX_ITEMS
                )));
            }
            Value::Array(summary)
        }
        Value::String(text) => Value::String(truncate(text, MAX_VALUE_CHARS)),
        other => other.clone(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}
