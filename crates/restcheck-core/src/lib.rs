//! restcheck-core: types and verification logic for REST contract checks
//!
//! This crate holds everything that does not touch the network: the request
//! and response model, parsed documents, the schema registry and validator,
//! the assertion engine, scenarios and suites, and run reports.

pub mod assertion;
pub mod config;
pub mod document;
pub mod dump;
pub mod error;
pub mod generator;
pub mod http;
pub mod plan;
pub mod registry;
pub mod report;
pub mod scenario;
pub mod validate;
pub mod verdict;

pub use assertion::{Check, CheckResult, Observation, Outcome, run_all};
pub use config::{Config, ConfigError};
pub use document::ParsedDocument;
pub use dump::{DumpError, DumpIndex};
pub use error::{
    AssertionFailure, InvalidBaseUrl, ParseError, ScenarioError, SchemaLoadError, TransportError,
    TransportErrorKind,
};
pub use generator::to_http_file;
pub use http::{BaseUrl, Endpoint, Headers, Method, RequestDescriptor, ResponseRecord};
pub use plan::SuitePlan;
pub use registry::{FileSchemaStore, MemorySchemaStore, Schema, SchemaRegistry, SchemaStore};
pub use report::{ScenarioReport, ScenarioStatus, SuiteReport};
pub use scenario::{Expectation, FieldExpectation, FieldValue, Scenario, Suite, SuiteError};
pub use validate::{ValidationResult, validate};
pub use verdict::{Verdict, VerdictPolicy, VerdictStatus};
