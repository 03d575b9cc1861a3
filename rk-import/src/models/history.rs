//! Server-side import history records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Record id; the backend has used both integer and UUID keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

/// One row of `GET /scan/import-history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportHistoryEntry {
    pub id: RecordId,
    pub file_name: String,
    /// `success`, `skipped` or `failed`
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: String,
}

/// Keep entries whose status matches `status` (case-insensitive)
///
/// `None` keeps everything. `imported` is accepted as a synonym for
/// `success`.
pub fn filter_by_status<'a>(
    entries: &'a [ImportHistoryEntry],
    status: Option<&str>,
) -> Vec<&'a ImportHistoryEntry> {
    let Some(wanted) = status.map(normalize_status) else {
        return entries.iter().collect();
    };

    entries
        .iter()
        .filter(|entry| normalize_status(&entry.status) == wanted)
        .collect()
}

fn normalize_status(status: &str) -> String {
    let status = status.trim().to_ascii_lowercase();
    if status == "imported" {
        "success".to_string()
    } else {
        status
    }
}
