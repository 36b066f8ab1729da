//! Request and response model
//!
//! A [`RequestDescriptor`] is built fresh for every call and a
//! [`ResponseRecord`] is produced once per request. Neither is mutated after
//! it has been handed to the executor or returned from it.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::{Position, Url};

use crate::error::InvalidBaseUrl;

/// Supported HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute http(s) URL that endpoints are resolved against. Parsed once, so
/// a malformed base URL is reported before any request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Parse `input`. Query and fragment are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBaseUrl`] if `input` is not an absolute URL with an
    /// `http` or `https` scheme and a host.
    pub fn parse(input: &str) -> Result<Self, InvalidBaseUrl> {
        let invalid = |reason: String| InvalidBaseUrl {
            url: input.to_string(),
            reason,
        };
        let mut url = Url::parse(input.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        url.set_query(None);
        url.set_fragment(None);
        Ok(Self(url))
    }

    /// Rendered form without a trailing `/`, e.g. `https://reqres.in`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str().trim_end_matches('/')
    }

    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl std::str::FromStr for BaseUrl {
    type Err = InvalidBaseUrl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base URL + path + query. Immutable once built.
///
/// The rendered [`url`](Self::url) is exactly what the executor sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    query: Vec<(String, String)>,
}

impl Endpoint {
    /// Append `path` to the base URL's own path.
    #[must_use]
    pub fn new(base: &BaseUrl, path: &str) -> Self {
        let mut url = base.0.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        let path = path.trim_start_matches('/');
        url.set_path(&format!("{prefix}/{path}"));
        Self {
            url,
            query: Vec::new(),
        }
    }

    /// Append one query pair, form-urlencoded.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.url.query_pairs_mut().append_pair(&key, &value);
        self.query.push((key, value));
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Base URL + path, without the query string.
    #[must_use]
    pub fn location(&self) -> String {
        self.url[..Position::AfterPath].to_string()
    }

    /// Full URL including the encoded query string.
    #[must_use]
    pub fn url(&self) -> String {
        self.url.to_string()
    }

    /// Path plus query, e.g. `/api/users?page=2`.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        self.url[Position::BeforePath..].to_string()
    }
}

/// Header list with case-insensitive names. Insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace (case-insensitively) a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name: String = name.into();
        let value: String = value.into();
        if let Some(slot) = self
            .0
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Snapshot form for reports. Names are lowercased.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(n, v)| (n.to_ascii_lowercase(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// Everything needed to send one request. Constructed fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub endpoint: Endpoint,
    pub headers: Headers,
    pub body: Option<String>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: Method, endpoint: Endpoint) -> Self {
        Self {
            method,
            endpoint,
            headers: Headers::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Operation label, e.g. `"GET /api/users"`.
    #[must_use]
    pub fn operation(&self) -> String {
        format!("{} {}", self.method, self.endpoint.path())
    }
}

/// Status, raw body and headers of one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    pub status: u16,
    pub body: String,
    pub headers: Headers,
    /// Wall-clock seconds from send to fully-read body
    pub elapsed: f64,
}

impl ResponseRecord {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Headers::new(),
            elapsed: 0.0,
        }
    }

    /// Body length in bytes. Never parses.
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> BaseUrl {
        BaseUrl::parse(s).unwrap()
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        let e = Endpoint::new(&base("https://reqres.in/"), "api/users");
        assert_eq!(e.url(), "https://reqres.in/api/users");
        assert_eq!(e.path(), "/api/users");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let e = Endpoint::new(&base("http://localhost:8080/v1/"), "/api/users/2");
        assert_eq!(e.url(), "http://localhost:8080/v1/api/users/2");
        assert_eq!(e.path_and_query(), "/v1/api/users/2");
    }

    #[test]
    fn endpoint_query_is_encoded() {
        let e = Endpoint::new(&base("http://localhost:8080"), "/api/users")
            .with_query("page", "2")
            .with_query("q", "a b&c");
        assert_eq!(e.url(), "http://localhost:8080/api/users?page=2&q=a+b%26c");
        assert_eq!(e.path_and_query(), "/api/users?page=2&q=a+b%26c");
        assert_eq!(e.location(), "http://localhost:8080/api/users");
        assert_eq!(e.query().len(), 2);
    }

    #[test]
    fn base_url_renders_without_trailing_slash() {
        assert_eq!(base("https://reqres.in").as_str(), "https://reqres.in");
        assert_eq!(base("http://127.0.0.1:8080/").to_string(), "http://127.0.0.1:8080");
        assert_eq!(base("https://reqres.in/?x=1#top").as_str(), "https://reqres.in");
    }

    #[test]
    fn base_url_rejects_relative_and_foreign_schemes() {
        let err = BaseUrl::parse("reqres.in").unwrap_err();
        assert_eq!(err.url, "reqres.in");
        assert!(err.to_string().starts_with("invalid base URL 'reqres.in'"));

        let err = "ftp://reqres.in".parse::<BaseUrl>().unwrap_err();
        assert!(err.reason.contains("unsupported scheme 'ftp'"), "{}", err.reason);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let mut h = Headers::new();
        h.insert("Content-Type", "text/plain");
        h.insert("content-type", "application/json");
        assert_eq!(h.len(), 1);
        assert_eq!(h.get("CONTENT-TYPE"), Some("application/json"));
        assert!(h.contains("content-type"));
        assert!(!h.contains("x-api-key"));
    }

    #[test]
    fn headers_keep_insertion_order() {
        let h: Headers = [("B", "2"), ("A", "1")].into_iter().collect();
        let names: Vec<&str> = h.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(h.to_map().get("a"), Some(&"1".to_string()));
    }

    #[test]
    fn descriptor_operation_label() {
        let d = RequestDescriptor::new(
            Method::Patch,
            Endpoint::new(&base("http://x"), "/api/users/2").with_query("v", "1"),
        )
        .with_body("{}");
        assert_eq!(d.operation(), "PATCH /api/users/2");
        assert_eq!(d.body.as_deref(), Some("{}"));
    }

    #[test]
    fn method_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Method::Delete).unwrap(), "\"DELETE\"");
    }

    #[test]
    fn response_body_len_without_parsing() {
        let r = ResponseRecord::new(204, "");
        assert_eq!(r.body_len(), 0);
        assert!(r.is_empty());
        assert_eq!(r.content_type(), None);
    }
}
