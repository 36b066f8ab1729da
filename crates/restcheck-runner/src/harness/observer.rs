//! Suite lifecycle hooks

use restcheck_core::report::{ScenarioReport, ScenarioStatus, SuiteReport};
use restcheck_core::scenario::{Scenario, Suite};

/// Receives harness lifecycle events. All methods default to no-ops.
pub trait SuiteObserver: Send + Sync {
    fn on_suite_start(&self, _suite: &Suite, _run_id: &str) {}
    fn on_scenario_start(&self, _order: usize, _scenario: &Scenario) {}
    /// Called for every scenario, including skipped ones.
    fn on_scenario_finish(&self, _report: &ScenarioReport) {}
    fn on_suite_finish(&self, _report: &SuiteReport) {}
}

/// Emits lifecycle events as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SuiteObserver for TracingObserver {
    fn on_suite_start(&self, suite: &Suite, run_id: &str) {
        tracing::info!(
            suite = suite.name(),
            run_id,
            scenarios = suite.len(),
            "suite started"
        );
    }

    fn on_scenario_start(&self, order: usize, scenario: &Scenario) {
        tracing::info!(scenario = %scenario.name, order, "scenario started");
    }

    fn on_scenario_finish(&self, report: &ScenarioReport) {
        match report.status {
            ScenarioStatus::Errored => {
                let error = report.error.as_ref().map_or("", |e| e.message.as_str());
                tracing::warn!(scenario = %report.name, status = %report.status, error, "scenario errored");
            }
            ScenarioStatus::Skipped => {
                let reason = report.error.as_ref().map_or("", |e| e.message.as_str());
                tracing::info!(scenario = %report.name, status = %report.status, reason, "scenario skipped");
            }
            ScenarioStatus::Passed | ScenarioStatus::Failed => {
                tracing::info!(
                    scenario = %report.name,
                    status = %report.status,
                    checks = report.checks.len(),
                    failed = report.failed_checks().count(),
                    elapsed = report.elapsed,
                    "scenario finished"
                );
            }
        }
    }

    fn on_suite_finish(&self, report: &SuiteReport) {
        tracing::info!(
            run_id = %report.run_id,
            passed = report.passed,
            failed = report.failed,
            errored = report.errored,
            skipped = report.skipped,
            "suite finished"
        );
    }
}
