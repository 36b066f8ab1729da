//! Parsed response documents
//!
//! A [`ParsedDocument`] owns its JSON tree privately and only hands out shared
//! references, so nothing downstream (validation, field checks) can mutate it.

use serde_json::Value;

use crate::error::ParseError;
use crate::http::ResponseRecord;

const EXCERPT_CHARS: usize = 200;

/// Read-only JSON tree addressable by dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    root: Value,
}

impl ParsedDocument {
    /// Parse a response body.
    ///
    /// Empty bodies are rejected without invoking the JSON parser.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyBody`] for a zero-length body and
    /// [`ParseError::Malformed`] when the body is not well-formed JSON.
    pub fn parse(record: &ResponseRecord) -> Result<Self, ParseError> {
        Self::from_text(&record.body)
    }

    /// Parse raw text. Same rules as [`ParsedDocument::parse`].
    ///
    /// # Errors
    ///
    /// See [`ParsedDocument::parse`].
    pub fn from_text(text: &str) -> Result<Self, ParseError> {
        if text.is_empty() {
            return Err(ParseError::EmptyBody);
        }
        serde_json::from_str(text)
            .map(|root| Self { root })
            .map_err(|e| ParseError::Malformed {
                message: e.to_string(),
                line: e.line(),
                column: e.column(),
                excerpt: excerpt(text),
            })
    }

    /// Look up a value by dotted path (`data.id`, `data.0.email`).
    ///
    /// Numeric segments index into arrays; on objects they are treated as keys.
    /// An empty path returns the root.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.split('.').try_fold(&self.root, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }
}

/// Char-boundary-safe prefix of a body for error messages.
fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((end, _)) => format!("{}…({} bytes total)", &text[..end], text.len()),
        None => text.to_string(),
    }
}
