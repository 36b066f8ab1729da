//! Persistent report storage: `~/.restcheck/reports/`
//!
//! Every `restcheck run` is saved regardless of `--output` mode.
//! Directory layout: `{host_port}_{timestamp}/`

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use restcheck_core::{Config, SuiteReport, Verdict, to_http_file};

/// Everything needed to persist a run.
pub struct ReportData<'a> {
    pub config: &'a Config,
    pub report: &'a SuiteReport,
    pub verdict: &'a Verdict,
}

/// Save a run to `~/.restcheck/reports/{host_port}_{timestamp}/`.
///
/// Returns the report directory path on success.
pub fn save_report(data: &ReportData) -> Result<PathBuf, std::io::Error> {
    save_report_in(&report_base_dir()?, data)
}

/// Save a run under `base` instead of the home directory.
pub fn save_report_in(base: &Path, data: &ReportData) -> Result<PathBuf, std::io::Error> {
    let report_dir = base.join(build_dir_name(&data.config.base_url));
    std::fs::create_dir_all(&report_dir)?;

    // config.toml: snapshot of the config used
    let config_toml =
        toml::to_string_pretty(data.config).map_err(|e| std::io::Error::other(e.to_string()))?;
    std::fs::write(report_dir.join("config.toml"), config_toml)?;

    // summary.json: verdict + counters + metadata
    let report = data.report;
    let summary = serde_json::json!({
        "verdict": {
            "status": data.verdict.status.to_string(),
            "exit_code": data.verdict.exit_code,
            "reason": data.verdict.reason,
        },
        "stats": {
            "total": report.total(),
            "passed": report.passed,
            "failed": report.failed,
            "errored": report.errored,
            "skipped": report.skipped,
        },
        "meta": {
            "run_id": report.run_id,
            "suite": report.suite,
            "timestamp": timestamp_iso(),
            "duration_secs": report.elapsed,
            "base_url": report.base_url,
        },
    });
    write_json(&report_dir.join("summary.json"), &summary)?;

    // report.json: the full per-scenario report
    write_json(&report_dir.join("report.json"), report)?;

    // reproductions.http: for quick replay in IDE/curl
    if report.non_passing().any(|s| s.interaction.is_some()) {
        std::fs::write(
            report_dir.join("reproductions.http"),
            to_http_file(report, "baseUrl"),
        )?;
    }

    Ok(report_dir)
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<(), std::io::Error> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| std::io::Error::other(e.to_string()))?;
    std::fs::write(path, text)
}

fn report_base_dir() -> Result<PathBuf, std::io::Error> {
    let home = std::env::var("HOME")
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
    Ok(PathBuf::from(home).join(".restcheck").join("reports"))
}

/// `{host_port}_{timestamp}` e.g. `reqres.in_20261016T093000`
fn build_dir_name(base_url: &str) -> String {
    format!("{}_{}", extract_host_port(base_url), timestamp_compact())
}

/// `"http://localhost:8080/path"` → `"localhost_8080"`
fn extract_host_port(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("unknown")
        .replace(':', "_")
}

/// `"20261016T093000"`: filesystem-safe compact timestamp.
fn timestamp_compact() -> String {
    let (y, mo, d, h, mi, s) = utc_now();
    format!("{y:04}{mo:02}{d:02}T{h:02}{mi:02}{s:02}")
}

/// `"2026-10-16T09:30:00Z"`: ISO 8601 for JSON.
fn timestamp_iso() -> String {
    let (y, mo, d, h, mi, s) = utc_now();
    format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}Z")
}

/// Current UTC date-time from the epoch.
fn utc_now() -> (i32, u32, u32, u32, u32, u32) {
    let epoch_secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let days = (epoch_secs / 86400) as i64;
    let tod = epoch_secs % 86400;
    let (y, m, d) = civil_from_days(days);
    (
        y,
        m,
        d,
        (tod / 3600) as u32,
        ((tod % 3600) / 60) as u32,
        (tod % 60) as u32,
    )
}

/// Epoch days → (year, month, day), proleptic Gregorian.
///
/// Reference: <https://howardhinnant.github.io/date_algorithms.html#civil_from_days>
fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}
