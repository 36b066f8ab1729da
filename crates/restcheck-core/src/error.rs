//! Error taxonomy for scenario execution
//!
//! Transport, parse and schema-load errors are fatal to the scenario they occur
//! in. Assertion failures are not errors at all: they are collected in an
//! [`Outcome`](crate::assertion::Outcome) and reported together.

/// Network-level failure while sending a request or reading its response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error for {method} {url}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub method: String,
    pub url: String,
    pub message: String,
}

/// Coarse classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS resolution or TCP/TLS connect failed
    Connect,
    /// The client-level timeout elapsed
    Timeout,
    /// Anything else (malformed request, body read failure, ...)
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "transport"),
        }
    }
}

/// Response body could not be turned into a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("response body is empty; nothing to parse")]
    EmptyBody,
    #[error("response body is not valid JSON (line {line}, column {column}): {message}; body: {excerpt}")]
    Malformed {
        message: String,
        line: usize,
        column: usize,
        excerpt: String,
    },
}

/// Named schema could not be loaded or compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaLoadError {
    #[error("unknown schema '{name}' (searched {searched})")]
    Unknown { name: String, searched: String },
    #[error("cannot read schema '{name}' from {path}: {message}")]
    Io {
        name: String,
        path: String,
        message: String,
    },
    #[error("schema '{name}' is malformed: {message}")]
    Malformed { name: String, message: String },
    #[error("schema '{name}' is not a valid JSON Schema: {message}")]
    Invalid { name: String, message: String },
}

/// One or more checks of a scenario failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{failed} of {total} checks failed")]
pub struct AssertionFailure {
    pub failed: usize,
    pub total: usize,
}

/// Base URL that is not an absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid base URL '{url}': {reason}")]
pub struct InvalidBaseUrl {
    pub url: String,
    pub reason: String,
}

/// Fatal error that ended a scenario early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    SchemaLoad(#[from] SchemaLoadError),
}

impl ScenarioError {
    /// Short machine-friendly label used in reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Parse(_) => "parse",
            Self::SchemaLoad(_) => "schema_load",
        }
    }
}
