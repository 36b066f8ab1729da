//! Response checks for one scenario
//!
//! Non-body checks (status, body length) read the raw record only. Body
//! checks run on a parsed document, and only when the expectation needs one.

use restcheck_core::assertion::{Check, Outcome, run_all};
use restcheck_core::document::ParsedDocument;
use restcheck_core::error::{ScenarioError, SchemaLoadError};
use restcheck_core::http::ResponseRecord;
use restcheck_core::registry::Schema;
use restcheck_core::scenario::{Expectation, Scenario};
use restcheck_core::validate::validate;

/// Checks that ran, plus the fatal error that stopped the rest (if any).
#[derive(Debug)]
pub(crate) struct Evaluation {
    pub outcome: Outcome,
    pub error: Option<ScenarioError>,
}

fn status_check<'a>(expected: u16, actual: u16) -> Check<'a> {
    Check::equals(format!("Expected status code {expected}."), expected, actual)
}

fn non_empty_check<'a>(response: &ResponseRecord) -> Check<'a> {
    Check::greater_than(
        "Expected response content to be non-empty.",
        0,
        response.body_len(),
    )
}

/// Evaluate `response` against the scenario's expectation. `schema` must be
/// the resolved schema when the expectation names one.
pub(crate) fn evaluate(
    scenario: &Scenario,
    response: &ResponseRecord,
    schema: Option<&Schema>,
) -> Evaluation {
    let expected = scenario.expected_status;

    let mut outcome = match &scenario.expectation {
        Expectation::Status => run_all([status_check(expected, response.status)]),
        Expectation::EmptyBody => run_all([
            status_check(expected, response.status),
            Check::equals(
                "Expected response content to be empty.",
                0,
                response.body_len(),
            ),
        ]),
        Expectation::Schema { .. } | Expectation::Fields { .. } => run_all([
            status_check(expected, response.status),
            non_empty_check(response),
        ]),
    };

    if !scenario.expectation.needs_document() {
        return Evaluation {
            outcome,
            error: None,
        };
    }

    let document = match ParsedDocument::parse(response) {
        Ok(doc) => doc,
        Err(e) => {
            return Evaluation {
                outcome,
                error: Some(e.into()),
            };
        }
    };

    match &scenario.expectation {
        Expectation::Schema { schema: name } => {
            let Some(schema) = schema else {
                return Evaluation {
                    outcome,
                    error: Some(
                        SchemaLoadError::Unknown {
                            name: name.clone(),
                            searched: "unresolved".to_string(),
                        }
                        .into(),
                    ),
                };
            };
            let result = validate(&document, schema);
            outcome.extend(run_all([Check::is_true(
                format!("Expected response to match the '{name}' schema."),
                result.valid,
                result.summary(),
            )]));
        }
        Expectation::Fields { fields } => {
            outcome.extend(run_all(fields.iter().map(|f| f.check(&document))));
        }
        Expectation::Status | Expectation::EmptyBody => {}
    }

    Evaluation {
        outcome,
        error: None,
    }
}
