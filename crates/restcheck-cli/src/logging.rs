//! Tracing setup for the CLI
//!
//! Log lines go to stderr so `--output json` on stdout stays machine-readable.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CRATES: [&str; 3] = ["restcheck", "restcheck_core", "restcheck_runner"];

/// Initialize tracing.
///
/// `RUST_LOG` wins when set. Otherwise our crates log at `info` (or `debug`
/// with `-v`) and dependencies at `warn`.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives: Vec<String> = CRATES.iter().map(|c| format!("{c}={level}")).collect();
    directives.push("warn".to_string());
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_by_verbosity() {
        assert_eq!(
            default_directives(false),
            "restcheck=info,restcheck_core=info,restcheck_runner=info,warn"
        );
        assert!(default_directives(true).starts_with("restcheck=debug,"));
    }
}
