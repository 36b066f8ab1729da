//! Full request/response dump to JSONL files
//!
//! Writes every scenario's interaction (not just failures) to per-operation
//! JSONL files for post-hoc debugging.
//!
//! ```text
//! .restcheck/dumps/
//! ├── GET__api_users.jsonl
//! ├── POST__api_users.jsonl
//! └── index.json
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::report::{Interaction, ScenarioStatus, SuiteReport};

/// Headers that should be masked in dumps for security.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "x-auth-token",
    "cookie",
    "set-cookie",
    "proxy-authorization",
];

/// Mask value for redacted headers.
const MASK: &str = "***";

/// One JSONL line: the interaction plus the scenario it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpRecord {
    pub scenario: String,
    pub status: ScenarioStatus,
    #[serde(flatten)]
    pub interaction: Interaction,
}

/// Summary of a dump operation, written as `index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpIndex {
    pub run_id: String,
    /// Total interactions dumped
    pub total: u64,
    /// Per-operation file listing
    pub operations: Vec<DumpOperationEntry>,
    /// Directory where files were written
    pub dump_dir: PathBuf,
}

/// An entry in the dump index for one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpOperationEntry {
    /// Operation label, e.g. "POST /api/users"
    pub operation: String,
    /// Filename within dump directory
    pub file: String,
    /// Number of interactions in this file
    pub count: u64,
}

/// Write the interactions of `report` to per-operation JSONL files.
///
/// Scenarios that never sent a request (skipped, schema errors) have no
/// interaction and are left out.
///
/// # Errors
///
/// Returns error if dump directory cannot be created or files cannot be written.
pub fn write_dump(
    report: &SuiteReport,
    dump_dir: &Path,
    mask_headers: bool,
) -> Result<DumpIndex, DumpError> {
    std::fs::create_dir_all(dump_dir)
        .map_err(|e| DumpError::Io(format!("create {}: {e}", dump_dir.display())))?;

    // BTreeMap keeps the file listing sorted by operation
    let mut groups: BTreeMap<String, Vec<DumpRecord>> = BTreeMap::new();
    for scenario in &report.scenarios {
        let Some(interaction) = &scenario.interaction else {
            continue;
        };
        let interaction = if mask_headers {
            mask_interaction(interaction)
        } else {
            interaction.clone()
        };
        groups
            .entry(interaction.operation.clone())
            .or_default()
            .push(DumpRecord {
                scenario: scenario.name.clone(),
                status: scenario.status,
                interaction,
            });
    }

    let mut entries = Vec::new();
    let mut total: u64 = 0;

    for (operation, records) in groups {
        let filename = sanitize_filename(&operation);
        let filepath = dump_dir.join(&filename);

        let file = std::fs::File::create(&filepath)
            .map_err(|e| DumpError::Io(format!("create {}: {e}", filepath.display())))?;
        let mut writer = std::io::BufWriter::new(file);

        let count = records.len() as u64;
        total += count;

        for record in &records {
            let line =
                serde_json::to_string(record).map_err(|e| DumpError::Serialize(e.to_string()))?;
            writeln!(writer, "{line}")
                .map_err(|e| DumpError::Io(format!("write {}: {e}", filepath.display())))?;
        }

        writer
            .flush()
            .map_err(|e| DumpError::Io(format!("flush {}: {e}", filepath.display())))?;

        entries.push(DumpOperationEntry {
            operation,
            file: filename,
            count,
        });
    }

    let index = DumpIndex {
        run_id: report.run_id.clone(),
        total,
        operations: entries,
        dump_dir: dump_dir.to_path_buf(),
    };

    let index_path = dump_dir.join("index.json");
    let index_json =
        serde_json::to_string_pretty(&index).map_err(|e| DumpError::Serialize(e.to_string()))?;
    std::fs::write(&index_path, index_json)
        .map_err(|e| DumpError::Io(format!("write {}: {e}", index_path.display())))?;

    Ok(index)
}

/// Maximum characters kept from the operation label in the filename.
const MAX_FILENAME_LEN: usize = 200;

/// Convert an operation label to a safe filename.
///
/// "DELETE /api/users/2" → "DELETE__api_users_2.jsonl"
fn sanitize_filename(operation: &str) -> String {
    let sanitized: String = operation
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' => c,
            _ => '_',
        })
        .collect();
    format!("{sanitized}.jsonl")
}

/// Returns true if the header name matches a known sensitive header (case-insensitive).
fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|&h| name.eq_ignore_ascii_case(h))
}

/// Mask sensitive headers on both sides of an interaction.
fn mask_interaction(interaction: &Interaction) -> Interaction {
    let mut masked = interaction.clone();
    let request_headers = masked.request.headers.iter_mut();
    let response_headers = masked
        .response
        .iter_mut()
        .flat_map(|r| r.headers.iter_mut());
    for (key, value) in request_headers.chain(response_headers) {
        if is_sensitive_header(key) {
            *value = MASK.to_string();
        }
    }
    masked
}

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}
