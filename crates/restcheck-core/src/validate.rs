//! Schema validation of parsed documents

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::ParsedDocument;
use crate::registry::Schema;

/// Violations beyond this count are dropped from the report.
const MAX_ERRORS: usize = 10;

/// Result of validating one document against one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    /// Violation messages as rendered by the validator, at most ten entries
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Errors joined for single-line display.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.valid {
            "valid".to_string()
        } else {
            self.errors.join("; ")
        }
    }
}

/// Validate `document` against `schema`. Neither side is modified.
#[must_use]
pub fn validate(document: &ParsedDocument, schema: &Schema) -> ValidationResult {
    let instance = document.root();
    let validator = schema.validator();
    if validator.is_valid(instance) {
        return ValidationResult {
            valid: true,
            errors: Vec::new(),
        };
    }

    let errors: Vec<String> = validator
        .iter_errors(instance)
        .take(MAX_ERRORS)
        .map(|e| e.to_string())
        .collect();

    ValidationResult {
        valid: false,
        errors,
    }
}
