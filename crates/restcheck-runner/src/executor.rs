//! Request execution
//!
//! [`Executor`] is the seam between the scenario pipeline and the network.
//! [`HttpExecutor`] sends requests with a blocking reqwest client; tests can
//! drive the pipeline with any other implementation.

use std::time::{Duration, Instant};

use restcheck_core::error::{TransportError, TransportErrorKind};
use restcheck_core::http::{Headers, Method, RequestDescriptor, ResponseRecord};

/// Sends one request and returns the full response.
pub trait Executor: Send + Sync {
    /// Execute `request`. Never retries.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no complete response could be read.
    fn execute(&self, request: &RequestDescriptor) -> Result<ResponseRecord, TransportError>;
}

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed executor. One request, one response: headers and body are
/// sent verbatim, no content type is inferred and redirects are returned to
/// the caller instead of followed.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpExecutor {
    /// Build an executor whose every call is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed (e.g. TLS backend failure).
    pub fn new(timeout: Duration) -> Result<Self, ExecutorError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ExecutorError::Client(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn classify(e: &reqwest::Error) -> TransportErrorKind {
    if e.is_timeout() {
        TransportErrorKind::Timeout
    } else if e.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    }
}

impl Executor for HttpExecutor {
    fn execute(&self, request: &RequestDescriptor) -> Result<ResponseRecord, TransportError> {
        let url = request.endpoint.url();
        let transport_error = |e: &reqwest::Error| TransportError {
            kind: classify(e),
            method: request.method.to_string(),
            url: url.clone(),
            message: e.to_string(),
        };

        let mut req = self
            .client
            .request(to_reqwest(request.method), request.endpoint.as_url().clone());
        for (k, v) in request.headers.iter() {
            req = req.header(k, v);
        }
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let start = Instant::now();
        let resp = req.send().map_err(|e| transport_error(&e))?;

        let status = resp.status().as_u16();
        let headers: Headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = resp.text().map_err(|e| transport_error(&e))?;

        Ok(ResponseRecord {
            status,
            body,
            headers,
            elapsed: start.elapsed().as_secs_f64(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("HTTP client error: {0}")]
    Client(String),
}
