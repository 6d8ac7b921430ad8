//! Best-effort recovery of truncated JSON captured mid-stream.
//!
//! The model's JSON arrives token by token, so at any instant the buffer is a
//! prefix of a well-formed document: a string may be cut inside an escape
//! sequence, containers may lack their closers, a key may have no value yet.
//! [`parse_partial`] turns such a prefix into a complete [`Value`] when it
//! can, and falls back to an empty object otherwise. It never fails for any
//! input, and it is idempotent on already-complete JSON.
//!
//! The repair rules run as an explicit scanner state machine (normal /
//! in-string / escape-pending) rather than ad hoc slicing, so each rule can
//! be unit tested in isolation from the response classifier.

use regex::Regex;
use serde_json::{Map, Value};

/// Matches a `\uXXXX` escape cut off after 0-3 hex digits.
const PARTIAL_UNICODE_PATTERN: &str = r"\\u[0-9a-fA-F]{0,3}$";

/// Parses a possibly-truncated JSON string, recovering what it can.
///
/// Complete JSON parses unchanged. A truncated prefix is first stripped of
/// mid-escape artifacts, then closed up by [`complete_partial_json`] and
/// re-parsed. If every recovery path fails the result is an empty object;
/// this function never returns an error.
pub fn parse_partial(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Object(Map::new());
    }

    // Fast path, and the idempotency guarantee for complete documents.
    if let Ok(value) = serde_json::from_str(trimmed) {
        return value;
    }

    let stripped = strip_stream_artifacts(trimmed);
    let completed = complete_partial_json(&stripped);
    match serde_json::from_str(&completed) {
        Ok(value) => value,
        Err(_) => Value::Object(Map::new()),
    }
}

/// Removes trailing artifacts of stopping mid-string: an unescaped trailing
/// quote, a lone trailing backslash, or a truncated `\uXXXX` escape.
fn strip_stream_artifacts(text: &str) -> String {
    if text.ends_with('"') && !text.ends_with("\\\"") && !text.ends_with(":\"") {
        return text[..text.len() - 1].to_string();
    }
    if text.ends_with('\\') && !text.ends_with("\\\\") {
        return text[..text.len() - 1].to_string();
    }
    let re = Regex::new(PARTIAL_UNICODE_PATTERN).expect("valid pattern");
    if let Some(found) = re.find(text) {
        return text[..found.start()].to_string();
    }
    text.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InString,
    Escape,
}

/// Appends the minimal suffix that turns a truncated JSON prefix into a
/// parseable document: closes an open string, synthesizes an empty value for
/// a dangling key or trailing colon, and closes unmatched containers in
/// nesting order. Input that needs no completion is returned unchanged.
pub fn complete_partial_json(text: &str) -> String {
    // Only the leading side can be trimmed up front: trailing whitespace may
    // be string content when the buffer stops inside an open literal.
    let trimmed = text.trim_start();
    if trimmed.trim_end().is_empty() || trimmed.trim_end() == "{" {
        return "{}".to_string();
    }

    let mut state = ScanState::Normal;
    // Closers for every container still open, innermost last.
    let mut closers: Vec<char> = Vec::new();
    let mut string_count = 0usize;
    let mut has_colon = false;
    let mut last_structural: Option<char> = None;

    for ch in trimmed.chars() {
        match state {
            ScanState::Escape => state = ScanState::InString,
            ScanState::InString => match ch {
                '\\' => state = ScanState::Escape,
                '"' => state = ScanState::Normal,
                _ => {}
            },
            ScanState::Normal => {
                match ch {
                    '"' => {
                        state = ScanState::InString;
                        string_count += 1;
                    }
                    '{' => closers.push('}'),
                    '[' => closers.push(']'),
                    '}' | ']' => {
                        if closers.last() == Some(&ch) {
                            closers.pop();
                        }
                    }
                    ':' => has_colon = true,
                    _ => {}
                }
                if !ch.is_whitespace() {
                    last_structural = Some(ch);
                }
            }
        }
    }

    let mut suffix = String::new();

    // Close a string cut off mid-way (possibly right after a backslash).
    if state == ScanState::Escape {
        suffix.push('\\');
    }
    if state != ScanState::Normal {
        suffix.push('"');
    }

    // A key with no value yet: `{"key` or `{"key"`. A trailing colon gets
    // an empty string value as well.
    if !has_colon && string_count > 0 && closers.last() == Some(&'}') {
        suffix.push_str(":\"\"");
    } else if last_structural == Some(':') && state == ScanState::Normal {
        suffix.push_str("\"\"");
    }

    while let Some(closer) = closers.pop() {
        suffix.push(closer);
    }

    // Outside a string, trailing whitespace is structural noise.
    let base = if state == ScanState::Normal {
        trimmed.trim_end()
    } else {
        trimmed
    };

    if suffix.is_empty() {
        base.to_string()
    } else {
        let mut completed = base.to_string();
        completed.push_str(&suffix);
        completed
    }
}
