//! Suite plan and config validation
//!
//! Describes what a run *would* do without sending any requests.
//! Used by `restcheck plan` and `restcheck doctor`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::registry::SchemaRegistry;
use crate::scenario::Suite;

// ── Plan types ──

/// Complete plan: ordered scenarios, check counts, and config warnings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuitePlan {
    pub suite: String,
    pub base_url: String,
    /// Scenarios in execution order
    pub scenarios: Vec<ScenarioPlan>,
    /// Checks a fully successful run would evaluate
    pub total_checks: usize,
    /// Config/schema validation results
    pub validations: Vec<Validation>,
}

/// Execution plan for a single scenario.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioPlan {
    pub order: usize,
    pub name: String,
    pub method: String,
    pub url: String,
    pub expected_status: u16,
    /// `status`, `empty_body`, `schema` or `fields`
    pub expectation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub checks: usize,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            status,
            message: message.into(),
        }
    }
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl SuitePlan {
    /// Build the plan for `suite` under `config`. No network access; schema
    /// loadability is checked through `registry`.
    #[must_use]
    pub fn build(suite: &Suite, config: &Config, registry: &SchemaRegistry) -> Self {
        let defaults = config.default_headers();
        let base = config.parsed_base_url().ok();
        let scenarios: Vec<ScenarioPlan> = suite
            .scenarios()
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let fields = match &s.expectation {
                    crate::scenario::Expectation::Fields { fields } => {
                        fields.iter().map(|f| f.path.clone()).collect()
                    }
                    _ => Vec::new(),
                };
                ScenarioPlan {
                    order: i + 1,
                    name: s.name.clone(),
                    method: s.request.method.to_string(),
                    // Without a usable base URL only the path can be shown.
                    url: base.as_ref().map_or_else(
                        || s.request.path.clone(),
                        |b| s.request.build(b, &defaults).endpoint.url(),
                    ),
                    expected_status: s.expected_status,
                    expectation: s.expectation.kind().to_string(),
                    schema: s.expectation.schema_name().map(str::to_string),
                    fields,
                    depends_on: s.depends_on.clone(),
                    checks: s.expectation.check_count(),
                }
            })
            .collect();

        let mut validations = validate_config(config);
        validations.extend(validate_schemas(suite, registry));

        Self {
            suite: suite.name().to_string(),
            base_url: config.base_url.clone(),
            total_checks: scenarios.iter().map(|s| s.checks).sum(),
            scenarios,
            validations,
        }
    }
}

// ── Config validation ──

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-token",
    "your_token",
    "YOUR_TOKEN",
    "your-api-key",
    "YOUR_API_KEY",
    "CHANGEME",
    "changeme",
    "placeholder",
    "replace-me",
    "REPLACE_ME",
];

/// Validate config and produce validation results.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let mut checks = Vec::new();

    match config.parsed_base_url() {
        Ok(base) => checks.push(Validation::new(
            "base_url",
            ValidationStatus::Ok,
            format!("base_url: {base}"),
        )),
        Err(e) => checks.push(Validation::new(
            "base_url",
            ValidationStatus::Error,
            format!("base_url: {} ({})", config.base_url, e.reason),
        )),
    }

    if config.timeout_secs == 0 {
        checks.push(Validation::new(
            "timeout",
            ValidationStatus::Error,
            "timeout_secs: 0 (every request would time out)",
        ));
    } else {
        checks.push(Validation::new(
            "timeout",
            ValidationStatus::Ok,
            format!("timeout_secs: {}", config.timeout_secs),
        ));
    }

    if config.schema_dir.is_dir() {
        checks.push(Validation::new(
            "schema_dir",
            ValidationStatus::Ok,
            format!("schema_dir: {} (exists)", config.schema_dir.display()),
        ));
    } else {
        checks.push(Validation::new(
            "schema_dir",
            ValidationStatus::Error,
            format!("schema_dir: {} (not found)", config.schema_dir.display()),
        ));
    }

    let header_issues: Vec<String> = config
        .headers
        .iter()
        .filter_map(|(key, value)| {
            if value.contains('<') && value.contains('>') {
                return Some(format!("{key}: contains '<...>' placeholder"));
            }
            PLACEHOLDER_PATTERNS
                .iter()
                .find(|p| value.contains(*p))
                .map(|p| format!("{key}: contains '{p}', may be a placeholder"))
        })
        .collect();

    if header_issues.is_empty() {
        let message = if config.headers.is_empty() {
            "headers: none configured".to_string()
        } else {
            format!("headers: {} configured", config.headers.len())
        };
        checks.push(Validation::new("headers", ValidationStatus::Ok, message));
    } else {
        for issue in header_issues {
            checks.push(Validation::new("headers", ValidationStatus::Warning, issue));
        }
    }

    checks
}

/// Try to load every schema the suite references.
#[must_use]
pub fn validate_schemas(suite: &Suite, registry: &SchemaRegistry) -> Vec<Validation> {
    suite
        .schema_names()
        .into_iter()
        .map(|name| match registry.get(name) {
            Ok(_) => Validation::new("schema", ValidationStatus::Ok, format!("schema: {name}")),
            Err(e) => Validation::new("schema", ValidationStatus::Error, e.to_string()),
        })
        .collect()
}

// ── Display helpers ──

impl SuitePlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Plan: suite '{}' against {}: {} scenarios, {} checks\n",
            self.suite,
            self.base_url,
            self.scenarios.len(),
            self.total_checks,
        ));

        for s in &self.scenarios {
            lines.push(format!(
                "{:>2}. {} ({} {} -> {})",
                s.order, s.name, s.method, s.url, s.expected_status
            ));
            let mut detail = format!("    Expect: {}", s.expectation);
            if let Some(schema) = &s.schema {
                detail.push_str(&format!(" [{schema}]"));
            }
            if !s.fields.is_empty() {
                detail.push_str(&format!(" [{}]", s.fields.join(", ")));
            }
            lines.push(detail);
            if !s.depends_on.is_empty() {
                lines.push(format!("    After: {}", s.depends_on.join(", ")));
            }
        }
        lines.push(String::new());

        lines.push("Validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    /// Returns true if any validation has Warning status.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use crate::registry::MemorySchemaStore;
    use crate::scenario::{FieldExpectation, Scenario};
    use std::collections::BTreeMap;

    fn config_with_headers(headers: BTreeMap<String, String>) -> Config {
        Config {
            headers,
            schema_dir: std::env::temp_dir(),
            ..Config::default()
        }
    }

    fn small_suite() -> Suite {
        Suite::new(
            "reqres",
            vec![
                Scenario::new("list", Method::Get, "/api/users").expect_schema(200, "users"),
                Scenario::new("page", Method::Get, "/api/users")
                    .query("page", "2")
                    .expect_fields(200, vec![FieldExpectation::json("page", 2)]),
                Scenario::new("gone", Method::Get, "/api/users/23").expect_status(404),
            ],
        )
        .unwrap()
    }

    #[test]
    fn validate_placeholder_angle_brackets() {
        let h = BTreeMap::from([("Authorization".into(), "Bearer <your-token-here>".into())]);
        let checks = validate_config(&config_with_headers(h));
        assert!(
            checks
                .iter()
                .any(|c| c.check == "headers" && c.status == ValidationStatus::Warning),
            "Should warn about angle-bracket placeholder"
        );
    }

    #[test]
    fn validate_real_key_no_warning() {
        let h = BTreeMap::from([("x-api-key".into(), "reqres-free-v1".into())]);
        let checks = validate_config(&config_with_headers(h));
        let header_checks: Vec<_> = checks.iter().filter(|c| c.check == "headers").collect();
        assert_eq!(header_checks.len(), 1);
        assert_eq!(header_checks[0].status, ValidationStatus::Ok);
    }

    #[test]
    fn validate_bad_base_url() {
        let cfg = Config {
            base_url: "reqres.in".into(),
            ..config_with_headers(BTreeMap::new())
        };
        let checks = validate_config(&cfg);
        let url_check = checks.iter().find(|c| c.check == "base_url").unwrap();
        assert_eq!(url_check.status, ValidationStatus::Error);
        assert!(url_check.message.starts_with("base_url: reqres.in ("));

        let plan = SuitePlan::build(&small_suite(), &cfg, &SchemaRegistry::new(MemorySchemaStore::new()));
        assert_eq!(plan.scenarios[2].url, "/api/users/23");
        assert!(plan.has_errors());
    }

    #[test]
    fn validate_zero_timeout() {
        let cfg = Config {
            timeout_secs: 0,
            ..config_with_headers(BTreeMap::new())
        };
        let checks = validate_config(&cfg);
        let t = checks.iter().find(|c| c.check == "timeout").unwrap();
        assert_eq!(t.status, ValidationStatus::Error);
    }

    #[test]
    fn plan_counts_checks_and_flags_missing_schema() {
        let registry = SchemaRegistry::new(MemorySchemaStore::new());
        let plan = SuitePlan::build(
            &small_suite(),
            &config_with_headers(BTreeMap::new()),
            &registry,
        );
        assert_eq!(plan.scenarios.len(), 3);
        assert_eq!(plan.total_checks, 3 + 3 + 1);
        assert_eq!(plan.scenarios[1].url, "https://reqres.in/api/users?page=2");
        assert!(plan.has_errors());
        assert!(
            plan.validations
                .iter()
                .any(|v| v.check == "schema" && v.message.contains("unknown schema 'users'"))
        );
    }

    #[test]
    fn plan_terminal_output() {
        let registry = SchemaRegistry::new(
            MemorySchemaStore::new().with("users", serde_json::json!({"type": "object"})),
        );
        let plan = SuitePlan::build(
            &small_suite(),
            &config_with_headers(BTreeMap::new()),
            &registry,
        );
        assert!(!plan.has_errors());
        assert!(!plan.has_warnings());

        let text = plan.to_terminal();
        assert!(text.contains("3 scenarios, 7 checks"));
        assert!(text.contains(" 1. list (GET https://reqres.in/api/users -> 200)"));
        assert!(text.contains("Expect: schema [users]"));
        assert!(text.contains("Expect: fields [page]"));
        assert!(text.contains("[OK] schema: users"));
    }
}
