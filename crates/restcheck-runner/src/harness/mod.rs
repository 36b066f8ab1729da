//! Scenario pipeline: build request → execute → parse → check → report
//!
//! Scenarios run strictly one at a time in suite order. Cancellation is
//! observed between scenarios only; a request in flight is bounded by the
//! executor's timeout.

mod checks;
mod observer;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use restcheck_core::assertion::Outcome;
use restcheck_core::config::Config;
use restcheck_core::error::{InvalidBaseUrl, ScenarioError, SchemaLoadError};
use restcheck_core::http::{BaseUrl, Headers};
use restcheck_core::registry::SchemaRegistry;
use restcheck_core::report::{Interaction, ScenarioReport, ScenarioStatus, SuiteReport};
use restcheck_core::scenario::{Scenario, Suite};

use crate::executor::{Executor, ExecutorError, HttpExecutor};

pub use observer::{SuiteObserver, TracingObserver};

/// Shared cancellation flag, checked before each scenario.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs scenarios and suites against one base URL.
pub struct Harness {
    executor: Box<dyn Executor>,
    registry: Arc<SchemaRegistry>,
    observer: Box<dyn SuiteObserver>,
    base_url: BaseUrl,
    default_headers: Headers,
    cancel: CancelToken,
    fail_fast: bool,
}

/// Builder for [`Harness`].
pub struct HarnessBuilder {
    executor: Box<dyn Executor>,
    registry: Option<Arc<SchemaRegistry>>,
    observer: Option<Box<dyn SuiteObserver>>,
    base_url: BaseUrl,
    default_headers: Headers,
    cancel: CancelToken,
    fail_fast: bool,
}

impl HarnessBuilder {
    #[must_use]
    pub fn registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: impl SuiteObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    #[must_use]
    pub fn default_headers(mut self, headers: Headers) -> Self {
        self.default_headers = headers;
        self
    }

    /// Token for cancelling a run from outside, e.g. a signal handler.
    #[must_use]
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Skip the remaining scenarios of a run after the first one that does
    /// not pass. Does not touch the shared cancel token.
    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    #[must_use]
    pub fn build(self) -> Harness {
        Harness {
            executor: self.executor,
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(SchemaRegistry::from_dir("schemas"))),
            observer: self
                .observer
                .unwrap_or_else(|| Box::new(TracingObserver)),
            base_url: self.base_url,
            default_headers: self.default_headers,
            cancel: self.cancel,
            fail_fast: self.fail_fast,
        }
    }
}

impl Harness {
    #[must_use]
    pub fn builder(executor: impl Executor + 'static, base_url: BaseUrl) -> HarnessBuilder {
        HarnessBuilder {
            executor: Box::new(executor),
            registry: None,
            observer: None,
            base_url,
            default_headers: Headers::new(),
            cancel: CancelToken::new(),
            fail_fast: false,
        }
    }

    /// Builder preloaded from configuration: HTTP executor with the configured
    /// timeout, file-backed schema registry, base URL and default headers.
    ///
    /// # Errors
    ///
    /// Returns error if `base_url` is not an absolute http(s) URL or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<HarnessBuilder, HarnessError> {
        let base_url = config.parsed_base_url()?;
        let executor = HttpExecutor::new(config.timeout())?;
        Ok(Self::builder(executor, base_url)
            .registry(Arc::new(SchemaRegistry::from_dir(&config.schema_dir)))
            .default_headers(config.default_headers()))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Compile every schema the suite references. Failures are returned, not
    /// fatal: the affected scenarios error out when they run.
    pub fn prepare(&self, suite: &Suite) -> Vec<SchemaLoadError> {
        let errors = self.registry.preload(suite.schema_names());
        for e in &errors {
            tracing::warn!(error = %e, "schema preload failed");
        }
        errors
    }

    /// Run one scenario through the full pipeline.
    #[must_use]
    pub fn run_scenario(&self, scenario: &Scenario, order: usize) -> ScenarioReport {
        let start = Instant::now();
        let request = scenario.request.build(&self.base_url, &self.default_headers);

        // Resolve the schema before sending anything.
        let schema = match scenario.expectation.schema_name() {
            Some(name) => match self.registry.get(name) {
                Ok(schema) => Some(schema),
                Err(e) => {
                    return ScenarioReport::errored(
                        &scenario.name,
                        order,
                        &ScenarioError::from(e),
                        Outcome::default(),
                    )
                    .with_elapsed(start.elapsed().as_secs_f64());
                }
            },
            None => None,
        };

        tracing::debug!(scenario = %scenario.name, "--> {} {}", request.method, request.endpoint.url());
        let response = match self.executor.execute(&request) {
            Ok(response) => response,
            Err(e) => {
                return ScenarioReport::errored(
                    &scenario.name,
                    order,
                    &ScenarioError::from(e),
                    Outcome::default(),
                )
                .with_interaction(Interaction::new(&request, None))
                .with_elapsed(start.elapsed().as_secs_f64());
            }
        };
        tracing::debug!(
            scenario = %scenario.name,
            "<-- {} ({} bytes, {:.3}s)",
            response.status,
            response.body_len(),
            response.elapsed
        );

        let eval = checks::evaluate(scenario, &response, schema.as_deref());
        let report = match &eval.error {
            Some(e) => ScenarioReport::errored(&scenario.name, order, e, eval.outcome),
            None => ScenarioReport::completed(&scenario.name, order, eval.outcome),
        };
        report
            .with_interaction(Interaction::new(&request, Some(&response)))
            .with_elapsed(start.elapsed().as_secs_f64())
    }

    /// Run every scenario of `suite` in order.
    ///
    /// A scenario whose dependency errored or was skipped is skipped. Failed
    /// assertions in a dependency do not skip its dependents.
    #[must_use]
    pub fn run_suite(&self, suite: &Suite) -> SuiteReport {
        let start = Instant::now();
        let run_id = new_run_id();
        self.observer.on_suite_start(suite, &run_id);
        self.prepare(suite);

        let mut incomplete: HashSet<&str> = HashSet::new();
        let mut stopped = false;
        let mut reports = Vec::with_capacity(suite.len());

        for (i, scenario) in suite.scenarios().iter().enumerate() {
            let order = i + 1;
            let blocked = scenario
                .depends_on
                .iter()
                .find(|d| incomplete.contains(d.as_str()));

            let report = if self.cancel.is_cancelled() {
                ScenarioReport::skipped(&scenario.name, order, "cancelled", "run cancelled")
            } else if stopped {
                ScenarioReport::skipped(
                    &scenario.name,
                    order,
                    "cancelled",
                    "stopped after first non-passing scenario",
                )
            } else if let Some(dep) = blocked {
                ScenarioReport::skipped(
                    &scenario.name,
                    order,
                    "dependency",
                    format!("dependency '{dep}' did not complete"),
                )
            } else {
                self.observer.on_scenario_start(order, scenario);
                self.run_scenario(scenario, order)
            };

            if matches!(
                report.status,
                ScenarioStatus::Errored | ScenarioStatus::Skipped
            ) {
                incomplete.insert(scenario.name.as_str());
            }
            if self.fail_fast && report.status != ScenarioStatus::Passed {
                stopped = true;
            }

            self.observer.on_scenario_finish(&report);
            reports.push(report);
        }

        let report = SuiteReport::new(run_id, suite.name(), self.base_url.as_str(), reports)
            .with_elapsed(start.elapsed().as_secs_f64());
        self.observer.on_suite_finish(&report);
        report
    }
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("base_url", &self.base_url.as_str())
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

fn new_run_id() -> String {
    let mut rng = SmallRng::from_entropy();
    format!("{:016x}", rng.r#gen::<u64>())
}

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    BaseUrl(#[from] InvalidBaseUrl),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

#[cfg(test)]
mod tests;
