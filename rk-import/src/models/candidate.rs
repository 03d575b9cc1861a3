//! Import candidates
//!
//! A candidate is a book file eligible for import: either found by the
//! server's directory scan or picked from the local filesystem.

use crate::services::ScannedFile;
use chrono::{DateTime, Utc};
use rk_common::events::CandidateRef;
use std::path::{Path, PathBuf};

/// Extensions the library accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &["epub", "pdf", "txt", "mobi", "azw3"];

/// Case-insensitive check against [`SUPPORTED_EXTENSIONS`]
pub fn is_supported_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(ext))
}

/// Where a candidate's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// Path on the server, as reported by the directory scan
    Scanned { path: String },
    /// Path on this machine, to be uploaded
    Local { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCandidate {
    pub source: CandidateSource,
    pub display_name: String,
    pub size_bytes: u64,
    /// Lowercase, without the leading dot
    pub extension: String,
    /// Only known for scan-sourced candidates
    pub last_modified: Option<DateTime<Utc>>,
    pub selected: bool,
}

impl ImportCandidate {
    /// Build a candidate from one entry of a scan-list response
    pub fn from_scanned(file: &ScannedFile) -> Self {
        let extension = if file.ext.is_empty() {
            extension_of(Path::new(&file.name))
        } else {
            file.ext.trim_start_matches('.').to_ascii_lowercase()
        };

        Self {
            source: CandidateSource::Scanned {
                path: file.path.clone(),
            },
            display_name: file.name.clone(),
            size_bytes: file.size,
            extension,
            last_modified: file.modified.as_ref().and_then(|m| m.to_datetime()),
            selected: false,
        }
    }

    /// Build a candidate for a local file
    pub fn from_local_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            source: CandidateSource::Local {
                path: path.to_path_buf(),
            },
            display_name,
            size_bytes: metadata.len(),
            extension: extension_of(path),
            last_modified: None,
            selected: false,
        })
    }

    /// Path string identifying the candidate's bytes
    pub fn source_path(&self) -> String {
        match &self.source {
            CandidateSource::Scanned { path } => path.clone(),
            CandidateSource::Local { path } => path.display().to_string(),
        }
    }

    /// Reference carried by outcomes and events
    pub fn to_ref(&self) -> CandidateRef {
        CandidateRef {
            display_name: self.display_name.clone(),
            source_path: self.source_path(),
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}
