//! Project configuration for contract runs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::InvalidBaseUrl;
use crate::http::{BaseUrl, Headers};

/// Environment variable that overrides `base_url` after loading.
pub const BASE_URL_ENV: &str = "RESTCHECK_BASE_URL";

/// Project configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the service under test
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory holding named JSON Schema documents
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    /// Headers sent with every request (API keys, etc.)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Dump all request/response pairs to JSONL files
    #[serde(default)]
    pub dump: bool,

    /// Directory for dump files (default: ".restcheck/dumps")
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://reqres.in".to_string()
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("schemas")
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            schema_dir: default_schema_dir(),
            headers: BTreeMap::new(),
            timeout_secs: default_timeout_secs(),
            dump: false,
            dump_dir: None,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.restcheck.toml)
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but cannot be read or parsed
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".restcheck.toml", ".restcheck.json", "restcheck.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Apply `RESTCHECK_BASE_URL` if set and non-empty.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_base_url_override(std::env::var(BASE_URL_ENV).ok())
    }

    /// Replace `base_url` when `value` is non-empty.
    #[must_use]
    pub fn with_base_url_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        self
    }

    /// `base_url` parsed into an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBaseUrl`] if `base_url` is relative or not http(s).
    pub fn parsed_base_url(&self) -> Result<BaseUrl, InvalidBaseUrl> {
        BaseUrl::parse(&self.base_url)
    }

    /// Configured default headers, in name order.
    #[must_use]
    pub fn default_headers(&self) -> Headers {
        self.headers.iter().collect()
    }

    #[must_use]
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    /// Create example config file
    #[must_use]
    pub fn example() -> &'static str {
        r#"# restcheck configuration

# Service under test (RESTCHECK_BASE_URL overrides this)
base_url = "https://reqres.in"

# Directory with named schemas (users-schema.json, resources-schema.json)
schema_dir = "schemas"

# Per-request timeout in seconds
timeout_secs = 30

# Headers sent with every request
[headers]
# x-api-key = "reqres-free-v1"

# Dump all request/response pairs to JSONL files (default: false)
# dump = true
# dump_dir = ".restcheck/dumps"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
