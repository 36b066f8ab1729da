//! restcheck-runner: HTTP execution and the scenario harness

pub mod catalog;
pub mod executor;
pub mod harness;

pub use catalog::reqres_suite;
pub use executor::{Executor, ExecutorError, HttpExecutor};
pub use harness::{CancelToken, Harness, HarnessBuilder, HarnessError, SuiteObserver, TracingObserver};
