//! Data models for batch import

pub mod candidate;
pub mod history;
pub mod options;

pub use candidate::{is_supported_extension, CandidateSource, ImportCandidate, SUPPORTED_EXTENSIONS};
pub use history::{filter_by_status, ImportHistoryEntry, RecordId};
pub use options::ImportOptions;
