//! HTTP file generator - converts non-passing scenarios to .http format

use crate::report::{RequestSnapshot, ScenarioReport, SuiteReport};

/// Generate .http file content for every scenario that did not pass and
/// actually sent a request.
#[must_use]
pub fn to_http_file(report: &SuiteReport, base_url_var: &str) -> String {
    let failing: Vec<&ScenarioReport> = report
        .non_passing()
        .filter(|s| s.interaction.is_some())
        .collect();

    let mut lines = Vec::new();
    lines.push(format!(
        "# Auto-generated reproduction cases ({} scenarios)",
        failing.len()
    ));
    lines.push(format!("@{base_url_var} = {}", report.base_url));
    lines.push(String::new());

    for scenario in failing {
        let Some(interaction) = &scenario.interaction else {
            continue;
        };
        lines.push(format!(
            "### [{}] {} - {}",
            scenario.order, scenario.name, scenario.status
        ));
        for check in scenario.failed_checks() {
            lines.push(format!(
                "# {} (expected: {}, actual: {})",
                check.description, check.expected, check.actual
            ));
        }
        if let Some(err) = &scenario.error {
            lines.push(format!("# {}: {}", err.kind, err.message));
        }

        let url = match interaction.request.url.strip_prefix(report.base_url.as_str()) {
            Some(rest) if !report.base_url.is_empty() => format!("{{{{{base_url_var}}}}}{rest}"),
            _ => interaction.request.url.clone(),
        };
        lines.push(format!("{} {}", interaction.request.method, url));
        push_headers_and_body(&mut lines, &interaction.request);

        lines.push(String::new());
    }

    lines.join("\n")
}

fn push_headers_and_body(lines: &mut Vec<String>, request: &RequestSnapshot) {
    for (key, value) in &request.headers {
        if !matches!(key.as_str(), "host" | "content-length") {
            lines.push(format!("{key}: {value}"));
        }
    }
    if let Some(body) = &request.body {
        lines.push(String::new());
        lines.push(body.clone());
    }
}
