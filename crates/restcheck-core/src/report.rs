//! Run reports: per-scenario results and the suite summary
//!
//! These are the types written to `report.json` and printed by
//! `restcheck run --output json`. `restcheck schema` emits their JSON Schema.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::assertion::{CheckResult, Outcome};
use crate::error::ScenarioError;
use crate::http::{RequestDescriptor, ResponseRecord};

/// Final state of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Every check passed
    Passed,
    /// At least one check failed, no fatal error
    Failed,
    /// Transport, parse or schema-load error
    Errored,
    /// Not run (cancelled, or a dependency did not complete)
    Skipped,
}

impl std::fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "PASS"),
            Self::Failed => write!(f, "FAIL"),
            Self::Errored => write!(f, "ERROR"),
            Self::Skipped => write!(f, "SKIP"),
        }
    }
}

/// Snapshot of HTTP request for reproduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl From<&RequestDescriptor> for RequestSnapshot {
    fn from(d: &RequestDescriptor) -> Self {
        Self {
            method: d.method.to_string(),
            url: d.endpoint.url(),
            headers: d.headers.to_map(),
            body: d.body.clone(),
        }
    }
}

/// Snapshot of HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub latency_ms: u64,
}

impl From<&ResponseRecord> for ResponseSnapshot {
    fn from(r: &ResponseRecord) -> Self {
        Self {
            status_code: r.status,
            headers: r.headers.to_map(),
            body: (!r.body.is_empty()).then(|| r.body.clone()),
            latency_ms: (r.elapsed * 1000.0).round() as u64,
        }
    }
}

/// Request sent by a scenario and the response, if one arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Interaction {
    /// Operation label, e.g. "GET /api/users"
    pub operation: String,
    pub request: RequestSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,
}

impl Interaction {
    #[must_use]
    pub fn new(request: &RequestDescriptor, response: Option<&ResponseRecord>) -> Self {
        Self {
            operation: request.operation(),
            request: request.into(),
            response: response.map(Into::into),
        }
    }
}

/// Fatal error that ended a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorDetail {
    /// `transport`, `parse`, `schema_load`, `cancelled` or `dependency`
    pub kind: String,
    pub message: String,
}

impl From<&ScenarioError> for ErrorDetail {
    fn from(e: &ScenarioError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// Result of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioReport {
    pub name: String,
    /// Position in the suite, starting at 1
    pub order: usize,
    pub status: ScenarioStatus,
    /// Every check that ran, in order
    #[serde(default)]
    pub checks: Vec<CheckResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
    /// Wall-clock seconds for the whole scenario
    #[serde(default)]
    pub elapsed: f64,
}

impl ScenarioReport {
    /// Report for a scenario whose checks all ran.
    #[must_use]
    pub fn completed(name: impl Into<String>, order: usize, outcome: Outcome) -> Self {
        let status = if outcome.passed() {
            ScenarioStatus::Passed
        } else {
            ScenarioStatus::Failed
        };
        Self {
            name: name.into(),
            order,
            status,
            checks: outcome.into_checks(),
            error: None,
            interaction: None,
            elapsed: 0.0,
        }
    }

    /// Report for a scenario ended by a fatal error. `outcome` holds any
    /// checks that still ran.
    #[must_use]
    pub fn errored(
        name: impl Into<String>,
        order: usize,
        error: &ScenarioError,
        outcome: Outcome,
    ) -> Self {
        Self {
            name: name.into(),
            order,
            status: ScenarioStatus::Errored,
            checks: outcome.into_checks(),
            error: Some(error.into()),
            interaction: None,
            elapsed: 0.0,
        }
    }

    #[must_use]
    pub fn skipped(
        name: impl Into<String>,
        order: usize,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            order,
            status: ScenarioStatus::Skipped,
            checks: Vec::new(),
            error: Some(ErrorDetail {
                kind: kind.into(),
                message: message.into(),
            }),
            interaction: None,
            elapsed: 0.0,
        }
    }

    #[must_use]
    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interaction = Some(interaction);
        self
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: f64) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Multi-line failure text for terminal output. Empty when passed.
    #[must_use]
    pub fn failure_text(&self) -> String {
        let mut text = Outcome::from_results(self.checks.clone()).render_failures();
        if let Some(err) = &self.error {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&format!("{}: {}", err.kind, err.message));
        }
        text
    }
}

/// Summary of one suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SuiteReport {
    /// Random identifier of this run
    pub run_id: String,
    pub suite: String,
    pub base_url: String,
    pub scenarios: Vec<ScenarioReport>,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    /// Wall-clock seconds for the whole suite
    #[serde(default)]
    pub elapsed: f64,
}

impl SuiteReport {
    /// Build a report, deriving the counters from `scenarios`.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        suite: impl Into<String>,
        base_url: impl Into<String>,
        scenarios: Vec<ScenarioReport>,
    ) -> Self {
        let count = |s: ScenarioStatus| scenarios.iter().filter(|r| r.status == s).count();
        Self {
            run_id: run_id.into(),
            suite: suite.into(),
            base_url: base_url.into(),
            passed: count(ScenarioStatus::Passed),
            failed: count(ScenarioStatus::Failed),
            errored: count(ScenarioStatus::Errored),
            skipped: count(ScenarioStatus::Skipped),
            scenarios,
            elapsed: 0.0,
        }
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: f64) -> Self {
        self.elapsed = elapsed;
        self
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Scenarios that did not pass, in suite order.
    pub fn non_passing(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios
            .iter()
            .filter(|s| s.status != ScenarioStatus::Passed)
    }

    /// One-line counters, e.g. `9 passed, 1 failed, 1 errored, 0 skipped`.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "{} passed, {} failed, {} errored, {} skipped",
            self.passed, self.failed, self.errored, self.skipped
        )
    }
}

/// Generate JSON Schema for the report format.
///
/// # Errors
///
/// Returns the serializer error if the schema cannot be rendered.
pub fn generate_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(SuiteReport);
    serde_json::to_string_pretty(&schema)
}
