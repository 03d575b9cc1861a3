//! Per-item import collaborators
//!
//! The executor hands one candidate at a time to an `ImportCollaborator`.
//! Two implementations exist: server-side import of scanned files and
//! multipart upload of local files.

use crate::models::{CandidateSource, ImportCandidate, ImportOptions};
use crate::services::{BatchFile, ClientError, ImportBatchResponse, ReadKnowsClient, UploadResponse};
use async_trait::async_trait;
use std::sync::Arc;

/// Counters describing what the backend did with one submitted item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitResponse {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Server-provided detail, if any
    pub message: Option<String>,
}

impl From<ImportBatchResponse> for SubmitResponse {
    fn from(response: ImportBatchResponse) -> Self {
        let message = response
            .message
            .or_else(|| response.errors.first().map(|e| e.to_string()));
        Self {
            imported: response.imported,
            skipped: response.skipped,
            failed: response.failed,
            message,
        }
    }
}

impl From<UploadResponse> for SubmitResponse {
    fn from(response: UploadResponse) -> Self {
        let message = response
            .message
            .or_else(|| response.book.and_then(|b| b.title).map(|t| format!("Added \"{}\"", t)));
        // Any 2xx upload counts as one imported book
        Self {
            imported: 1,
            skipped: 0,
            failed: 0,
            message,
        }
    }
}

/// Performs the remote operation for a single candidate
#[async_trait]
pub trait ImportCollaborator: Send + Sync {
    async fn submit(
        &self,
        candidate: &ImportCandidate,
        options: &ImportOptions,
    ) -> Result<SubmitResponse, ClientError>;
}

/// Imports scanned server-side files, one file per import-batch call
pub struct DirectoryImporter {
    client: Arc<ReadKnowsClient>,
}

impl DirectoryImporter {
    pub fn new(client: Arc<ReadKnowsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImportCollaborator for DirectoryImporter {
    async fn submit(
        &self,
        candidate: &ImportCandidate,
        options: &ImportOptions,
    ) -> Result<SubmitResponse, ClientError> {
        let CandidateSource::Scanned { path } = &candidate.source else {
            return Err(ClientError::InvalidInput(format!(
                "{} is a local file; upload it instead",
                candidate.display_name
            )));
        };

        let files = [BatchFile {
            path: path.clone(),
            name: candidate.display_name.clone(),
        }];
        let response = self.client.import_batch(&files, options).await?;
        Ok(response.into())
    }
}

/// Uploads local files through the multipart upload endpoint
pub struct LocalUploader {
    client: Arc<ReadKnowsClient>,
}

impl LocalUploader {
    pub fn new(client: Arc<ReadKnowsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImportCollaborator for LocalUploader {
    async fn submit(
        &self,
        candidate: &ImportCandidate,
        options: &ImportOptions,
    ) -> Result<SubmitResponse, ClientError> {
        let CandidateSource::Local { path } = &candidate.source else {
            return Err(ClientError::InvalidInput(format!(
                "{} lives on the server; import it instead",
                candidate.display_name
            )));
        };

        let response = self.client.upload_book(path, options).await?;
        Ok(response.into())
    }
}
