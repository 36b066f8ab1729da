//! Scenarios and ordered suites
//!
//! A [`Scenario`] is a request template plus an [`Expectation`]. A [`Suite`]
//! is an explicit, caller-ordered list of scenarios whose declared
//! dependencies are validated at construction: every dependency must exist
//! and must come earlier in the list.

use std::collections::{HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assertion::{Check, Observation};
use crate::document::ParsedDocument;
use crate::http::{BaseUrl, Endpoint, Headers, Method, RequestDescriptor};

/// Request parts of a scenario. A fresh [`RequestDescriptor`] is built from
/// it for every execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Headers,
    pub body: Option<String>,
}

impl RequestTemplate {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Build the descriptor for one call. `defaults` are applied first so
    /// the template's own headers win on a (case-insensitive) clash.
    #[must_use]
    pub fn build(&self, base_url: &BaseUrl, defaults: &Headers) -> RequestDescriptor {
        let mut endpoint = Endpoint::new(base_url, &self.path);
        for (k, v) in &self.query {
            endpoint = endpoint.with_query(k.as_str(), v.as_str());
        }
        let mut headers = defaults.clone();
        for (k, v) in self.headers.iter() {
            headers.insert(k, v);
        }
        RequestDescriptor {
            method: self.method,
            endpoint,
            headers,
            body: self.body.clone(),
        }
    }
}

/// Expected value of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Strict JSON equality
    Json(Value),
    /// Compare the scalar's text form: strings as-is, numbers and bools rendered
    Text(String),
}

impl FieldValue {
    fn matches(&self, actual: &Value) -> bool {
        match self {
            Self::Json(expected) => expected == actual,
            Self::Text(expected) => scalar_text(actual).is_some_and(|t| &t == expected),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// One field-path expectation; each becomes its own check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldExpectation {
    pub path: String,
    pub expected: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldExpectation {
    #[must_use]
    pub fn json(path: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            expected: FieldValue::Json(expected.into()),
            description: None,
        }
    }

    #[must_use]
    pub fn text(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: FieldValue::Text(expected.into()),
            description: None,
        }
    }

    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn label(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Expected {} to be {}.", self.path, self.expected))
    }

    /// Deferred check of this field against `document`.
    pub fn check<'a>(&'a self, document: &'a ParsedDocument) -> Check<'a> {
        Check::new(self.label(), move || match document.get(&self.path) {
            Some(actual) => Observation::new(
                self.expected.matches(actual),
                self.expected.to_string(),
                render_actual(actual),
            ),
            None => Observation::new(false, self.expected.to_string(), "<missing>"),
        })
    }
}

fn render_actual(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// What a scenario verifies about its response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expectation {
    /// Existence check: status code only, body never parsed
    Status,
    /// Status plus a zero-length body, body never parsed
    EmptyBody,
    /// Status, non-empty body, and validity against a named schema
    Schema { schema: String },
    /// Status, non-empty body, and one check per field path
    Fields { fields: Vec<FieldExpectation> },
}

impl Expectation {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::EmptyBody => "empty_body",
            Self::Schema { .. } => "schema",
            Self::Fields { .. } => "fields",
        }
    }

    /// Whether the body must be parsed to evaluate this expectation.
    #[must_use]
    pub const fn needs_document(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::Fields { .. })
    }

    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        match self {
            Self::Schema { schema } => Some(schema),
            _ => None,
        }
    }

    /// Number of checks a full evaluation produces.
    #[must_use]
    pub fn check_count(&self) -> usize {
        match self {
            Self::Status => 1,
            Self::EmptyBody => 2,
            Self::Schema { .. } => 3,
            Self::Fields { fields } => 2 + fields.len(),
        }
    }
}

/// One end-to-end test case.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub request: RequestTemplate,
    pub expected_status: u16,
    pub expectation: Expectation,
    pub depends_on: Vec<String>,
}

impl Scenario {
    #[must_use]
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request: RequestTemplate::new(method, path),
            expected_status: 200,
            expectation: Expectation::Status,
            depends_on: Vec::new(),
        }
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.insert(name, value);
        self
    }

    /// Raw body, sent verbatim. Callers set `Content-Type` themselves.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// JSON body plus an explicit `Content-Type: application/json` header.
    #[must_use]
    pub fn json_body(self, body: &Value) -> Self {
        self.header("Content-Type", "application/json")
            .body(body.to_string())
    }

    #[must_use]
    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self.expectation = Expectation::Status;
        self
    }

    #[must_use]
    pub fn expect_empty(mut self, status: u16) -> Self {
        self.expected_status = status;
        self.expectation = Expectation::EmptyBody;
        self
    }

    #[must_use]
    pub fn expect_schema(mut self, status: u16, schema: impl Into<String>) -> Self {
        self.expected_status = status;
        self.expectation = Expectation::Schema {
            schema: schema.into(),
        };
        self
    }

    #[must_use]
    pub fn expect_fields(mut self, status: u16, fields: Vec<FieldExpectation>) -> Self {
        self.expected_status = status;
        self.expectation = Expectation::Fields { fields };
        self
    }

    #[must_use]
    pub fn after(mut self, dependency: impl Into<String>) -> Self {
        self.depends_on.push(dependency.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuiteError {
    #[error("duplicate scenario name '{0}'")]
    Duplicate(String),
    #[error("scenario '{scenario}' depends on unknown scenario '{dependency}'")]
    UnknownDependency { scenario: String, dependency: String },
    #[error("scenario '{scenario}' depends on '{dependency}', which is ordered after it")]
    DependencyOrderedAfter { scenario: String, dependency: String },
    #[error("no scenario named '{0}'")]
    UnknownScenario(String),
}

/// Ordered, dependency-checked list of scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct Suite {
    name: String,
    scenarios: Vec<Scenario>,
}

impl Suite {
    /// Build a suite. Execution order is exactly the order of `scenarios`.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError`] on duplicate names or a dependency that is
    /// unknown or ordered after its dependent.
    pub fn new(name: impl Into<String>, scenarios: Vec<Scenario>) -> Result<Self, SuiteError> {
        let mut position: HashMap<&str, usize> = HashMap::new();
        for (i, s) in scenarios.iter().enumerate() {
            if position.insert(s.name.as_str(), i).is_some() {
                return Err(SuiteError::Duplicate(s.name.clone()));
            }
        }
        for (i, s) in scenarios.iter().enumerate() {
            for dep in &s.depends_on {
                match position.get(dep.as_str()) {
                    None => {
                        return Err(SuiteError::UnknownDependency {
                            scenario: s.name.clone(),
                            dependency: dep.clone(),
                        });
                    }
                    Some(&j) if j >= i => {
                        return Err(SuiteError::DependencyOrderedAfter {
                            scenario: s.name.clone(),
                            dependency: dep.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(Self {
            name: name.into(),
            scenarios,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Distinct schema names referenced by the suite, in first-use order.
    #[must_use]
    pub fn schema_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.scenarios
            .iter()
            .filter_map(|s| s.expectation.schema_name())
            .filter(|n| seen.insert(*n))
            .collect()
    }

    /// Sub-suite with the named scenarios and their transitive dependencies,
    /// keeping the original order.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::UnknownScenario`] if a name is not in the suite.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, SuiteError> {
        let mut wanted: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();
        for n in names {
            let n = n.as_ref();
            let s = self
                .get(n)
                .ok_or_else(|| SuiteError::UnknownScenario(n.to_string()))?;
            stack.push(s.name.as_str());
        }
        while let Some(n) = stack.pop() {
            if !wanted.insert(n) {
                continue;
            }
            if let Some(s) = self.get(n) {
                stack.extend(s.depends_on.iter().map(String::as_str));
            }
        }
        let scenarios = self
            .scenarios
            .iter()
            .filter(|s| wanted.contains(s.name.as_str()))
            .cloned()
            .collect();
        Self::new(self.name.clone(), scenarios)
    }
}
