use std::collections::HashMap;
use std::sync::Mutex;

use restcheck_core::error::{TransportError, TransportErrorKind};
use restcheck_core::http::{Method, RequestDescriptor, ResponseRecord};
use restcheck_core::registry::MemorySchemaStore;
use restcheck_core::scenario::FieldExpectation;

use super::*;

type Reply = Result<ResponseRecord, TransportErrorKind>;

/// Canned responses keyed by "METHOD /path?query".
#[derive(Default)]
struct StubExecutor {
    routes: HashMap<String, Reply>,
    calls: Arc<Mutex<Vec<RequestDescriptor>>>,
}

impl StubExecutor {
    fn route(mut self, key: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert(key.to_string(), Ok(ResponseRecord::new(status, body)));
        self
    }

    fn fail(mut self, key: &str, kind: TransportErrorKind) -> Self {
        self.routes.insert(key.to_string(), Err(kind));
        self
    }
}

impl Executor for StubExecutor {
    fn execute(&self, request: &RequestDescriptor) -> Result<ResponseRecord, TransportError> {
        self.calls.lock().unwrap().push(request.clone());
        let key = format!("{} {}", request.method, request.endpoint.path_and_query());
        match self.routes.get(&key) {
            Some(Ok(r)) => Ok(r.clone()),
            Some(Err(kind)) => Err(TransportError {
                kind: *kind,
                method: request.method.to_string(),
                url: request.endpoint.url(),
                message: "stubbed failure".into(),
            }),
            None => Ok(ResponseRecord::new(404, "{}")),
        }
    }
}

#[derive(Default)]
struct RecordingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

impl SuiteObserver for RecordingObserver {
    fn on_suite_start(&self, suite: &Suite, _run_id: &str) {
        self.events.lock().unwrap().push(format!("suite:{}", suite.name()));
    }
    fn on_scenario_start(&self, _order: usize, scenario: &Scenario) {
        self.events.lock().unwrap().push(format!("start:{}", scenario.name));
    }
    fn on_scenario_finish(&self, report: &ScenarioReport) {
        self.events
            .lock()
            .unwrap()
            .push(format!("finish:{}:{}", report.name, report.status));
    }
    fn on_suite_finish(&self, report: &SuiteReport) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done:{}", report.summary_line()));
    }
}

fn base_url() -> BaseUrl {
    BaseUrl::parse("http://stub.local").unwrap()
}

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::new(MemorySchemaStore::new().with(
        "users",
        serde_json::json!({
            "type": "object",
            "required": ["page", "data"],
            "properties": {"page": {"type": "integer"}, "data": {"type": "array"}}
        }),
    )))
}

const USERS_PAGE: &str = r#"{"page": 1, "per_page": 6, "total": 12, "total_pages": 2, "data": []}"#;
const MORPHEUS: &str = r#"{"name": "morpheus", "job": "zion resident", "updatedAt": "2024-01-01T00:00:00Z"}"#;

fn write_chain() -> Suite {
    let update_body = serde_json::json!({"name": "morpheus", "job": "zion resident"});
    let fields = || {
        vec![
            FieldExpectation::json("name", "morpheus"),
            FieldExpectation::json("job", "zion resident"),
        ]
    };
    Suite::new(
        "chain",
        vec![
            Scenario::new("create_user", Method::Post, "/api/users")
                .json_body(&serde_json::json!({"name": "morpheus", "job": "leader"}))
                .expect_fields(201, vec![FieldExpectation::json("name", "morpheus")]),
            Scenario::new("update_user", Method::Put, "/api/users/2")
                .json_body(&update_body)
                .expect_fields(200, fields())
                .after("create_user"),
            Scenario::new("patch_user", Method::Patch, "/api/users/2")
                .json_body(&update_body)
                .expect_fields(200, fields())
                .after("update_user"),
            Scenario::new("delete_user", Method::Delete, "/api/users/2")
                .expect_empty(204)
                .after("patch_user"),
        ],
    )
    .unwrap()
}

fn chain_stub() -> StubExecutor {
    StubExecutor::default()
        .route(
            "POST /api/users",
            201,
            r#"{"name": "morpheus", "job": "leader", "id": "7"}"#,
        )
        .route("PUT /api/users/2", 200, MORPHEUS)
        .route("PATCH /api/users/2", 200, MORPHEUS)
        .route("DELETE /api/users/2", 204, "")
}

fn statuses(report: &SuiteReport) -> Vec<ScenarioStatus> {
    report.scenarios.iter().map(|s| s.status).collect()
}

#[test]
fn not_found_runs_one_check_without_parsing() {
    let stub = StubExecutor::default().route("GET /api/users/23", 404, "this is not json");
    let harness = Harness::builder(stub, base_url()).registry(registry()).build();
    let scenario = Scenario::new("user_not_found", Method::Get, "/api/users/23").expect_status(404);

    let report = harness.run_scenario(&scenario, 4);
    assert_eq!(report.status, ScenarioStatus::Passed);
    assert_eq!(report.checks.len(), 1);
    assert_eq!(report.checks[0].description, "Expected status code 404.");
    assert_eq!(report.order, 4);
}

#[test]
fn default_headers_reach_the_executor() {
    let stub = StubExecutor::default().route("GET /api/users/23", 404, "");
    let calls = Arc::clone(&stub.calls);
    let harness = Harness::builder(stub, base_url())
        .registry(registry())
        .default_headers([("x-api-key", "reqres-free-v1")].into_iter().collect())
        .build();
    let scenario = Scenario::new("user_not_found", Method::Get, "/api/users/23").expect_status(404);
    let _ = harness.run_scenario(&scenario, 1);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].headers.get("X-Api-Key"), Some("reqres-free-v1"));
    assert_eq!(calls[0].endpoint.url(), "http://stub.local/api/users/23");
}

#[test]
fn schema_scenario_passes_and_is_repeatable() {
    let stub = StubExecutor::default().route("GET /api/users", 200, USERS_PAGE);
    let harness = Harness::builder(stub, base_url()).registry(registry()).build();
    let scenario =
        Scenario::new("list_users_default_page", Method::Get, "/api/users").expect_schema(200, "users");

    let first = harness.run_scenario(&scenario, 1);
    let second = harness.run_scenario(&scenario, 1);
    assert_eq!(first.status, ScenarioStatus::Passed);
    assert_eq!(first.checks, second.checks);
    assert_eq!(first.checks.len(), 3);
}

#[test]
fn unknown_schema_errors_before_request() {
    let stub = StubExecutor::default();
    let calls = Arc::clone(&stub.calls);
    let harness = Harness::builder(stub, base_url()).registry(registry()).build();
    let scenario = Scenario::new("list_resources_default_page", Method::Get, "/api/unknown")
        .expect_schema(200, "resources");

    let report = harness.run_scenario(&scenario, 5);
    assert_eq!(report.status, ScenarioStatus::Errored);
    assert!(report.checks.is_empty());
    assert!(report.interaction.is_none());
    assert_eq!(
        report.error.as_ref().map(|e| e.kind.as_str()),
        Some("schema_load")
    );
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn transport_error_runs_no_checks() {
    let stub = StubExecutor::default().fail("GET /api/users/2", TransportErrorKind::Timeout);
    let harness = Harness::builder(stub, base_url()).registry(registry()).build();
    let scenario = Scenario::new("single_user", Method::Get, "/api/users/2")
        .expect_fields(200, vec![FieldExpectation::json("data.id", 2)]);

    let report = harness.run_scenario(&scenario, 3);
    assert_eq!(report.status, ScenarioStatus::Errored);
    assert!(report.checks.is_empty());
    let error = report.error.unwrap();
    assert_eq!(error.kind, "transport");
    assert!(error.message.starts_with("timeout error for GET"));
    let interaction = report.interaction.unwrap();
    assert!(interaction.response.is_none());
}

#[test]
fn malformed_body_errors_but_keeps_status_check() {
    let stub = StubExecutor::default().route("GET /api/users", 200, "<html>oops</html>");
    let harness = Harness::builder(stub, base_url()).registry(registry()).build();
    let scenario =
        Scenario::new("list_users_default_page", Method::Get, "/api/users").expect_schema(200, "users");

    let report = harness.run_scenario(&scenario, 1);
    assert_eq!(report.status, ScenarioStatus::Errored);
    assert_eq!(report.checks.len(), 2);
    assert!(report.checks.iter().all(|c| c.passed));
    assert_eq!(report.error.unwrap().kind, "parse");
}

#[test]
fn put_and_patch_produce_identical_field_outcomes() {
    let harness = Harness::builder(chain_stub(), base_url()).registry(registry()).build();
    let suite = write_chain();
    let put = harness.run_scenario(suite.get("update_user").unwrap(), 2);
    let patch = harness.run_scenario(suite.get("patch_user").unwrap(), 3);
    assert_eq!(put.status, ScenarioStatus::Passed);
    assert_eq!(put.checks, patch.checks);
}

#[test]
fn suite_runs_in_order_and_notifies_observer() {
    let observer = RecordingObserver::default();
    let events = Arc::clone(&observer.events);
    let harness = Harness::builder(chain_stub(), base_url())
        .registry(registry())
        .observer(observer)
        .build();

    let report = harness.run_suite(&write_chain());
    assert_eq!(report.passed, 4);
    assert_eq!(report.run_id.len(), 16);
    let orders: Vec<usize> = report.scenarios.iter().map(|s| s.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4]);

    let events = events.lock().unwrap();
    assert_eq!(events.first().map(String::as_str), Some("suite:chain"));
    assert_eq!(events[1], "start:create_user");
    assert_eq!(events[2], "finish:create_user:PASS");
    assert_eq!(
        events.last().map(String::as_str),
        Some("done:4 passed, 0 failed, 0 errored, 0 skipped")
    );
}

#[test]
fn errored_dependency_skips_the_rest_of_the_chain() {
    let stub = chain_stub().fail("PUT /api/users/2", TransportErrorKind::Connect);
    let calls = Arc::clone(&stub.calls);
    let harness = Harness::builder(stub, base_url()).registry(registry()).build();

    let report = harness.run_suite(&write_chain());
    assert_eq!(
        statuses(&report),
        vec![
            ScenarioStatus::Passed,
            ScenarioStatus::Errored,
            ScenarioStatus::Skipped,
            ScenarioStatus::Skipped,
        ]
    );
    let skipped = report.get("patch_user").unwrap();
    assert_eq!(
        skipped.error.as_ref().map(|e| e.message.as_str()),
        Some("dependency 'update_user' did not complete")
    );
    assert_eq!(
        report
            .get("delete_user")
            .unwrap()
            .error
            .as_ref()
            .map(|e| e.message.as_str()),
        Some("dependency 'patch_user' did not complete")
    );
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[test]
fn failed_dependency_does_not_skip_dependents() {
    let stub = chain_stub().route("PUT /api/users/2", 200, r#"{"name": "neo", "job": "zion resident"}"#);
    let harness = Harness::builder(stub, base_url()).registry(registry()).build();

    let report = harness.run_suite(&write_chain());
    assert_eq!(
        statuses(&report),
        vec![
            ScenarioStatus::Passed,
            ScenarioStatus::Failed,
            ScenarioStatus::Passed,
            ScenarioStatus::Passed,
        ]
    );
}

#[test]
fn cancelled_token_skips_everything() {
    let token = CancelToken::new();
    token.cancel();
    let stub = chain_stub();
    let calls = Arc::clone(&stub.calls);
    let harness = Harness::builder(stub, base_url())
        .registry(registry())
        .cancel_token(token)
        .build();

    let report = harness.run_suite(&write_chain());
    assert_eq!(report.skipped, 4);
    assert!(
        report
            .scenarios
            .iter()
            .all(|s| s.error.as_ref().is_some_and(|e| e.kind == "cancelled"))
    );
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn fail_fast_cancels_after_first_non_pass() {
    let stub = chain_stub().route("POST /api/users", 500, r#"{"error": "boom"}"#);
    let harness = Harness::builder(stub, base_url())
        .registry(registry())
        .fail_fast(true)
        .build();

    let report = harness.run_suite(&write_chain());
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 3);
    assert_eq!(
        report.scenarios[1].error.as_ref().unwrap().message,
        "stopped after first non-passing scenario"
    );
    assert!(!harness.cancel_token().is_cancelled());
}

#[test]
fn fail_fast_runs_are_repeatable() {
    let stub = StubExecutor::default();
    let calls = Arc::clone(&stub.calls);
    let harness = Harness::builder(stub, base_url())
        .registry(registry())
        .fail_fast(true)
        .build();
    let suite = Suite::new(
        "s",
        vec![
            Scenario::new("first", Method::Get, "/api/users/2").expect_status(200),
            Scenario::new("second", Method::Get, "/api/users/3").expect_status(200),
        ],
    )
    .unwrap();

    let first = harness.run_suite(&suite);
    let second = harness.run_suite(&suite);
    assert_eq!(first.summary_line(), "0 passed, 1 failed, 0 errored, 1 skipped");
    assert_eq!(second.summary_line(), first.summary_line());
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[test]
fn delete_with_empty_body_never_parses() {
    let harness = Harness::builder(chain_stub(), base_url()).registry(registry()).build();
    let suite = write_chain();
    let report = harness.run_scenario(suite.get("delete_user").unwrap(), 4);
    assert_eq!(report.status, ScenarioStatus::Passed);
    assert!(report.error.is_none());
    assert_eq!(report.checks.len(), 2);
}

#[test]
fn prepare_reports_missing_schemas() {
    let harness = Harness::builder(StubExecutor::default(), base_url())
        .registry(registry())
        .build();
    let suite = Suite::new(
        "s",
        vec![
            Scenario::new("a", Method::Get, "/api/users").expect_schema(200, "users"),
            Scenario::new("b", Method::Get, "/api/unknown").expect_schema(200, "resources"),
        ],
    )
    .unwrap();
    let errors = harness.prepare(&suite);
    assert_eq!(errors.len(), 1);
    assert_eq!(harness.registry().cached(), vec!["users".to_string()]);
}
