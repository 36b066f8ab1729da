//! Assertion engine: every check runs and every failure is reported
//!
//! A scenario declares its expectations as a list of [`Check`]s. [`run_all`]
//! evaluates each of them in order regardless of earlier failures (a panic
//! inside one check is caught and recorded as that check's failure), so the
//! resulting [`Outcome`] always enumerates every violated expectation.

use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AssertionFailure;

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CheckResult {
    pub description: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

/// What a check observed. Returned by the check's closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

impl Observation {
    #[must_use]
    pub fn new(passed: bool, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            passed,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// One named, deferred expectation.
pub struct Check<'a> {
    description: String,
    eval: Box<dyn FnOnce() -> Observation + 'a>,
}

impl<'a> Check<'a> {
    pub fn new(description: impl Into<String>, eval: impl FnOnce() -> Observation + 'a) -> Self {
        Self {
            description: description.into(),
            eval: Box::new(eval),
        }
    }

    pub fn equals<T>(description: impl Into<String>, expected: T, actual: T) -> Self
    where
        T: PartialEq + Display + 'a,
    {
        Self::new(description, move || {
            Observation::new(expected == actual, expected.to_string(), actual.to_string())
        })
    }

    pub fn greater_than<T>(description: impl Into<String>, threshold: T, actual: T) -> Self
    where
        T: PartialOrd + Display + 'a,
    {
        Self::new(description, move || {
            Observation::new(actual > threshold, format!("> {threshold}"), actual.to_string())
        })
    }

    pub fn is_true(description: impl Into<String>, condition: bool, actual: impl Into<String>) -> Self {
        let actual = actual.into();
        Self::new(description, move || Observation::new(condition, "true", actual))
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluate this check. A panic is converted into a failed result.
    #[must_use]
    pub fn run(self) -> CheckResult {
        let Self { description, eval } = self;
        match catch_unwind(AssertUnwindSafe(eval)) {
            Ok(obs) => CheckResult {
                description,
                expected: obs.expected,
                actual: obs.actual,
                passed: obs.passed,
            },
            Err(payload) => CheckResult {
                description,
                expected: "check to complete".to_string(),
                actual: format!("panicked: {}", panic_message(payload.as_ref())),
                passed: false,
            },
        }
    }
}

impl std::fmt::Debug for Check<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run every check, in order, without short-circuiting.
pub fn run_all<'a>(checks: impl IntoIterator<Item = Check<'a>>) -> Outcome {
    Outcome {
        checks: checks.into_iter().map(Check::run).collect(),
    }
}

/// Aggregated results of a scenario's checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Outcome {
    checks: Vec<CheckResult>,
}

impl Outcome {
    #[must_use]
    pub fn from_results(checks: Vec<CheckResult>) -> Self {
        Self { checks }
    }

    /// True iff every check passed. An empty outcome passes.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    #[must_use]
    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    #[must_use]
    pub fn into_checks(self) -> Vec<CheckResult> {
        self.checks
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Append results from a later stage (e.g. body checks after parsing).
    pub fn extend(&mut self, other: Outcome) {
        self.checks.extend(other.checks);
    }

    /// `Some` when at least one check failed.
    #[must_use]
    pub fn failure(&self) -> Option<AssertionFailure> {
        let failed = self.failures().count();
        (failed > 0).then_some(AssertionFailure {
            failed,
            total: self.checks.len(),
        })
    }

    /// Multi-line report listing every failed check. Empty when all passed.
    #[must_use]
    pub fn render_failures(&self) -> String {
        let Some(summary) = self.failure() else {
            return String::new();
        };
        let mut lines = vec![format!("{summary}:")];
        for c in self.failures() {
            lines.push(format!(
                "  - {} (expected: {}, actual: {})",
                c.description, c.expected, c.actual
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn all_checks_run_after_a_failure() {
        let outcome = run_all([
            Check::equals("Expected status code 200.", 200, 404),
            Check::greater_than("Expected response content to be non-empty.", 0, 12),
            Check::equals("Expected name to be morpheus.", "morpheus", "neo"),
        ]);
        assert_eq!(outcome.len(), 3);
        assert!(!outcome.passed());
        let failed: Vec<&str> = outcome.failures().map(|c| c.description.as_str()).collect();
        assert_eq!(
            failed,
            vec!["Expected status code 200.", "Expected name to be morpheus."]
        );
    }

    #[test]
    fn panicking_check_does_not_stop_the_rest() {
        let outcome = run_all([
            Check::new("explodes", || panic!("boom")),
            Check::equals("still runs", 1, 1),
        ]);
        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.checks()[0].actual, "panicked: boom");
        assert!(!outcome.checks()[0].passed);
        assert!(outcome.checks()[1].passed);
    }

    #[test]
    fn empty_outcome_passes() {
        let outcome = run_all(Vec::<Check>::new());
        assert!(outcome.passed());
        assert!(outcome.failure().is_none());
        assert_eq!(outcome.render_failures(), "");
    }

    #[test]
    fn is_true_records_actual() {
        let r = Check::is_true("Response matches schema.", false, "/page: missing").run();
        assert!(!r.passed);
        assert_eq!(r.expected, "true");
        assert_eq!(r.actual, "/page: missing");
    }

    #[test]
    fn extend_keeps_order() {
        let mut first = run_all([Check::equals("a", 1, 1)]);
        first.extend(run_all([Check::equals("b", 1, 2)]));
        let names: Vec<&str> = first.checks().iter().map(|c| c.description.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            first.failure(),
            Some(AssertionFailure {
                failed: 1,
                total: 2
            })
        );
    }

    #[test]
    fn render_failures_lists_every_failed_check() {
        let outcome = run_all([
            Check::equals("Expected status code 200.", 200, 404),
            Check::equals("Expected current page to be 2.", "2", "2"),
            Check::equals("Expected user ID to be 2.", "2", "<missing>"),
        ]);
        insta::assert_snapshot!(outcome.render_failures(), @r"
        2 of 3 checks failed:
          - Expected status code 200. (expected: 200, actual: 404)
          - Expected user ID to be 2. (expected: 2, actual: <missing>)
        ");
    }

    proptest! {
        #[test]
        fn exactly_the_failing_check_is_reported(n in 1usize..24, k_seed in 0usize..1000) {
            let k = k_seed % n;
            let checks = (0..n).map(|i| {
                let actual = if i == k { 1 } else { 0 };
                Check::equals(format!("check {i}"), 0, actual)
            });
            let outcome = run_all(checks);
            prop_assert_eq!(outcome.len(), n);
            let failed: Vec<String> = outcome.failures().map(|c| c.description.clone()).collect();
            prop_assert_eq!(failed, vec![format!("check {k}")]);
        }
    }
}
