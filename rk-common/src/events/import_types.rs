//! Batch import type definitions
//!
//! Supporting types for per-item outcomes and run progress.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which entry point started a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunSource {
    /// Files discovered by a server-side directory scan
    DirectoryImport,
    /// Local files uploaded from this machine
    LocalUpload,
}

impl fmt::Display for RunSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSource::DirectoryImport => f.write_str("directory import"),
            RunSource::LocalUpload => f.write_str("local upload"),
        }
    }
}

/// Why a run was refused before any item was processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No candidate was selected
    EmptySelection,
    /// The upload disclaimer has not been accepted
    ConsentRequired,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptySelection => f.write_str("Select at least one file first"),
            RejectReason::ConsentRequired => {
                f.write_str("Accept the upload disclaimer before uploading")
            }
        }
    }
}

/// Stable reference to the candidate an outcome belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateRef {
    pub display_name: String,
    /// Server path for scanned candidates, local path for uploads
    pub source_path: String,
}

/// Classified cause of a failed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Timeout,
    NetworkUnreachable,
    PermissionDenied,
    BadRequest,
    PayloadTooLarge,
    ServerError,
    Unknown,
}

impl FailureReason {
    /// User-facing description used when the server gave no message
    pub fn describe(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "Request timed out",
            FailureReason::NetworkUnreachable => "Cannot reach the server",
            FailureReason::PermissionDenied => "Permission denied",
            FailureReason::BadRequest => "The server rejected the request",
            FailureReason::PayloadTooLarge => "File exceeds the server upload limit",
            FailureReason::ServerError => "Server error",
            FailureReason::Unknown => "Import failed",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Classification of one completed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Imported,
    Skipped,
    Failed(FailureReason),
}

impl OutcomeStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, OutcomeStatus::Failed(_))
    }

    /// Imported and skipped items are done with; failed ones stay for a retry
    pub fn is_settled(&self) -> bool {
        !self.is_failed()
    }
}

/// Outcome of a single item, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub candidate: CandidateRef,
    pub status: OutcomeStatus,
    pub message: String,
}

/// Progress counter of a running batch
///
/// `current` is the 1-based index of the item about to be processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    pub current: usize,
    pub total: usize,
}

impl RunProgress {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.current == 0 && self.total == 0
    }
}

/// Aggregate tally of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Items never attempted because the run was cancelled
    pub abandoned: usize,
}

impl RunSummary {
    /// Count one outcome
    pub fn record(&mut self, status: &OutcomeStatus) {
        match status {
            OutcomeStatus::Imported => self.imported += 1,
            OutcomeStatus::Skipped => self.skipped += 1,
            OutcomeStatus::Failed(_) => self.failed += 1,
        }
    }

    /// Items that reached the collaborator
    pub fn attempted(&self) -> usize {
        self.imported + self.skipped + self.failed
    }

    /// Items selected at run start
    pub fn total(&self) -> usize {
        self.attempted() + self.abandoned
    }

    /// Every attempted item failed (and there was at least one)
    pub fn all_failed(&self) -> bool {
        self.failed > 0 && self.imported == 0 && self.skipped == 0
    }

    /// "2 imported / 1 failed" style line, listing only non-zero counts
    pub fn display_string(&self) -> String {
        let parts: Vec<String> = [
            (self.imported, "imported"),
            (self.skipped, "skipped"),
            (self.failed, "failed"),
            (self.abandoned, "not attempted"),
        ]
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{} {}", count, label))
        .collect();

        if parts.is_empty() {
            "nothing processed".to_string()
        } else {
            parts.join(" / ")
        }
    }
}
