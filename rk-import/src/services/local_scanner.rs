//! Local book file discovery
//!
//! Expands the paths given for an upload run into candidates: files are
//! taken as-is, directories are walked recursively.

use crate::models::{is_supported_extension, ImportCandidate};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Result of a local scan
#[derive(Debug, Clone, Default)]
pub struct LocalScanResult {
    /// Supported book files, sorted by path, deduplicated
    pub candidates: Vec<ImportCandidate>,
    /// Explicitly named files whose extension is not supported
    pub unsupported: Vec<PathBuf>,
    /// Entries that could not be read
    pub errors: Vec<String>,
}

pub struct LocalScanner {
    ignore_patterns: Vec<String>,
    max_depth: Option<usize>,
}

impl Default for LocalScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalScanner {
    /// Create scanner with default ignore patterns
    ///
    /// Ignores system files like .DS_Store, Thumbs.db, .git, and any
    /// hidden entry below the roots.
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                "@eaDir".to_string(),
                "node_modules".to_string(),
            ],
            max_depth: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Scan `paths` for book files
    pub fn scan(&self, paths: &[PathBuf]) -> Result<LocalScanResult, ScanError> {
        if let Some(missing) = paths.iter().find(|p| !p.exists()) {
            return Err(ScanError::PathNotFound(missing.clone()));
        }

        let mut result = LocalScanResult::default();
        let mut found: Vec<PathBuf> = Vec::new();

        for root in paths {
            if root.is_file() {
                if has_supported_extension(root) {
                    found.push(root.clone());
                } else {
                    result.unsupported.push(root.clone());
                }
                continue;
            }

            let walker = WalkDir::new(root)
                .follow_links(false)
                .max_depth(self.max_depth.unwrap_or(usize::MAX))
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !self.is_ignored(e));

            for entry in walker {
                match entry {
                    Ok(entry) => {
                        if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                            found.push(entry.into_path());
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Error accessing entry: {}", e);
                        result.errors.push(e.to_string());
                    }
                }
            }
        }

        found.sort();
        let mut seen = HashSet::new();
        found.retain(|p| seen.insert(p.clone()));

        for path in found {
            match ImportCandidate::from_local_path(&path) {
                Ok(candidate) => result.candidates.push(candidate),
                Err(e) => {
                    tracing::warn!("Cannot read {}: {}", path.display(), e);
                    result.errors.push(format!("{}: {}", path.display(), e));
                }
            }
        }

        tracing::debug!(
            candidates = result.candidates.len(),
            unsupported = result.unsupported.len(),
            errors = result.errors.len(),
            "Local scan complete"
        );
        Ok(result)
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.ignore_patterns.iter().any(|p| name == p.as_str())
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| is_supported_extension(&e.to_string_lossy()))
        .unwrap_or(false)
}
