//! Verdict - turns a suite report into pass/fail and a process exit code

use crate::report::SuiteReport;

/// Exit code when every scenario passed.
pub const EXIT_PASS: i32 = 0;
/// Exit code when at least one check failed and nothing errored.
pub const EXIT_ASSERTION_FAILURES: i32 = 1;
/// Exit code when a scenario errored or was skipped.
pub const EXIT_INCOMPLETE: i32 = 2;
/// Exit code for tool-level errors (bad config, unreadable files, ...).
pub const EXIT_TOOL_ERROR: i32 = 3;

/// Policy for judging a run
#[derive(Debug, Clone, Default)]
pub struct VerdictPolicy {
    /// Treat skipped scenarios as passing (useful with `--only`)
    pub allow_skipped: bool,
}

impl VerdictPolicy {
    /// Determine verdict from a finished suite report.
    ///
    /// PASS requires every scenario to have passed. Errored (and, unless
    /// allowed, skipped) scenarios outrank assertion failures in the exit code.
    #[must_use]
    pub fn verdict(&self, report: &SuiteReport) -> Verdict {
        let skipped = if self.allow_skipped { 0 } else { report.skipped };
        let incomplete = report.errored + skipped;

        let exit_code = if report.total() == 0 || incomplete > 0 {
            EXIT_INCOMPLETE
        } else if report.failed > 0 {
            EXIT_ASSERTION_FAILURES
        } else {
            EXIT_PASS
        };

        let status = if exit_code == EXIT_PASS {
            VerdictStatus::Pass
        } else {
            VerdictStatus::Fail
        };

        let reason = if report.total() == 0 {
            "No scenarios were run".to_string()
        } else if status == VerdictStatus::Pass {
            format!("All {} scenarios passed", report.passed)
        } else {
            let mut parts = Vec::new();
            if report.failed > 0 {
                let checks: usize = report
                    .scenarios
                    .iter()
                    .map(|s| s.failed_checks().count())
                    .sum();
                parts.push(format!(
                    "{} scenarios failed ({checks} failed checks)",
                    report.failed
                ));
            }
            if report.errored > 0 {
                parts.push(format!("{} errored", report.errored));
            }
            if skipped > 0 {
                parts.push(format!("{skipped} skipped"));
            }
            parts.join("; ")
        };

        Verdict {
            status,
            exit_code,
            reason,
        }
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::{Check, run_all};
    use crate::error::{ScenarioError, TransportError, TransportErrorKind};
    use crate::report::ScenarioReport;

    fn pass(name: &str) -> ScenarioReport {
        ScenarioReport::completed(name, 1, run_all([Check::equals("status", 200, 200)]))
    }

    fn fail(name: &str) -> ScenarioReport {
        ScenarioReport::completed(
            name,
            1,
            run_all([
                Check::equals("status", 200, 200),
                Check::equals("name", "morpheus", "neo"),
                Check::equals("job", "leader", "chosen one"),
            ]),
        )
    }

    fn error(name: &str) -> ScenarioReport {
        let e = ScenarioError::Transport(TransportError {
            kind: TransportErrorKind::Connect,
            method: "GET".into(),
            url: "http://127.0.0.1:1/api/users".into(),
            message: "connection refused".into(),
        });
        ScenarioReport::errored(name, 1, &e, crate::assertion::Outcome::default())
    }

    fn suite(scenarios: Vec<ScenarioReport>) -> SuiteReport {
        SuiteReport::new("r", "reqres", "http://localhost", scenarios)
    }

    #[test]
    fn all_passed_is_pass() {
        let v = VerdictPolicy::default().verdict(&suite(vec![pass("a"), pass("b")]));
        assert_eq!(v.status, VerdictStatus::Pass);
        assert_eq!(v.exit_code, EXIT_PASS);
        assert_eq!(v.reason, "All 2 scenarios passed");
    }

    #[test]
    fn empty_run_is_fail() {
        let v = VerdictPolicy::default().verdict(&suite(vec![]));
        assert_eq!(v.status, VerdictStatus::Fail);
        assert_eq!(v.exit_code, EXIT_INCOMPLETE);
        assert_eq!(v.reason, "No scenarios were run");
    }

    #[test]
    fn assertion_failures_exit_1() {
        let v = VerdictPolicy::default().verdict(&suite(vec![pass("a"), fail("b")]));
        assert_eq!(v.status, VerdictStatus::Fail);
        assert_eq!(v.exit_code, EXIT_ASSERTION_FAILURES);
        assert_eq!(v.reason, "1 scenarios failed (2 failed checks)");
    }

    #[test]
    fn errors_outrank_failures() {
        let v = VerdictPolicy::default().verdict(&suite(vec![fail("a"), error("b")]));
        assert_eq!(v.exit_code, EXIT_INCOMPLETE);
        assert!(v.reason.contains("1 errored"));
        assert!(v.reason.contains("1 scenarios failed"));
    }

    #[test]
    fn skipped_counts_unless_allowed() {
        let report = suite(vec![
            pass("a"),
            ScenarioReport::skipped("b", 2, "cancelled", "run cancelled"),
        ]);
        let strict = VerdictPolicy::default().verdict(&report);
        assert_eq!(strict.exit_code, EXIT_INCOMPLETE);
        assert_eq!(strict.reason, "1 skipped");

        let lenient = VerdictPolicy {
            allow_skipped: true,
        }
        .verdict(&report);
        assert_eq!(lenient.status, VerdictStatus::Pass);
    }
}
