//! ReadKnows backend API client
//!
//! Thin reqwest wrapper over the scan, import, upload and history
//! endpoints. Each call carries the timeout of its transport class.

use crate::models::{ImportHistoryEntry, ImportOptions};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Method, RequestBuilder};
use rk_common::config::TimeoutConfig;
use rk_common::events::FailureReason;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio_util::io::ReaderStream;

const USER_AGENT: &str = concat!("rk-import/", env!("CARGO_PKG_VERSION"));
const API_PREFIX: &str = "/api";
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// API client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {}", message.as_deref().unwrap_or("no details"))]
    Api { status: u16, message: Option<String> },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Client build error: {0}")]
    Build(String),
}

impl ClientError {
    /// Classify a reqwest transport error
    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_connect() {
            ClientError::Network(e.to_string())
        } else {
            ClientError::Request(e.to_string())
        }
    }

    /// Map onto the per-item failure taxonomy
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            ClientError::Timeout => FailureReason::Timeout,
            ClientError::Network(_) => FailureReason::NetworkUnreachable,
            ClientError::Api { status, .. } => reason_for_status(*status),
            ClientError::InvalidInput(_) => FailureReason::BadRequest,
            ClientError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                FailureReason::PermissionDenied
            }
            ClientError::Request(_)
            | ClientError::Decode(_)
            | ClientError::Io(_)
            | ClientError::Build(_) => FailureReason::Unknown,
        }
    }

    /// Message taken from the server's structured error body, if any
    pub fn api_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// HTTP status → failure reason
pub fn reason_for_status(status: u16) -> FailureReason {
    match status {
        401 | 403 => FailureReason::PermissionDenied,
        400 | 409 | 415 | 422 => FailureReason::BadRequest,
        408 | 504 => FailureReason::Timeout,
        413 => FailureReason::PayloadTooLarge,
        500..=599 => FailureReason::ServerError,
        _ => FailureReason::Unknown,
    }
}

/// Pull a human-readable message out of an error body
///
/// Accepts `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`. Anything else yields `None`.
pub fn extract_api_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let candidate = match value.get("error") {
        Some(serde_json::Value::String(s)) => Some(s.as_str()),
        Some(obj @ serde_json::Value::Object(_)) => obj.get("message").and_then(|m| m.as_str()),
        _ => None,
    }
    .or_else(|| value.get("message").and_then(|m| m.as_str()));

    candidate
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Wire types
// ============================================================================

/// Modification time as sent by the scan endpoint (ISO string or epoch millis)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    Millis(i64),
    Text(String),
}

impl WireTimestamp {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            WireTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            WireTimestamp::Text(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// One file found by `POST /scan/scan-list`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScannedFile {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub modified: Option<WireTimestamp>,
}

/// Scan problem reported by the server (bare string or `{path, error}`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScanIssue {
    Message(String),
    Detail {
        #[serde(default)]
        path: Option<String>,
        #[serde(alias = "message")]
        error: String,
    },
}

impl std::fmt::Display for ScanIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanIssue::Message(msg) => f.write_str(msg),
            ScanIssue::Detail {
                path: Some(path),
                error,
            } => write!(f, "{}: {}", path, error),
            ScanIssue::Detail { path: None, error } => f.write_str(error),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanListResponse {
    #[serde(default)]
    pub files: Vec<ScannedFile>,
    #[serde(default)]
    pub errors: Vec<ScanIssue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanListRequest<'a> {
    scan_path: &'a str,
}

/// File reference inside an import-batch request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFile {
    pub path: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
struct ImportBatchRequest<'a> {
    files: &'a [BatchFile],
    #[serde(flatten)]
    options: &'a ImportOptions,
}

/// Counters returned by `POST /scan/import-batch`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportBatchResponse {
    #[serde(default)]
    pub imported: usize,
    #[serde(default)]
    pub skipped: usize,
    #[serde(default)]
    pub failed: usize,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ScanIssue>,
}

/// Book echoed back by `POST /books/upload`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploadedBook {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub book: Option<UploadedBook>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImportHistoryResponse {
    #[serde(default)]
    history: Vec<ImportHistoryEntry>,
}

// ============================================================================
// Client
// ============================================================================

/// ReadKnows API client
pub struct ReadKnowsClient {
    http_client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    timeouts: TimeoutConfig,
}

impl ReadKnowsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        timeouts: TimeoutConfig,
    ) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http_client,
            base_url,
            api_token,
            timeouts,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn request(&self, method: Method, path: &str, timeout: Duration) -> RequestBuilder {
        let builder = self
            .http_client
            .request(method, self.url(path))
            .timeout(timeout);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send, check status, return the raw response
    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = builder.send().await.map_err(ClientError::from_transport)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_api_message(&body);
            tracing::debug!(status = status.as_u16(), ?message, "ReadKnows API error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(builder).await?;
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else {
                ClientError::Decode(e.to_string())
            }
        })
    }

    /// List importable files under a server-side directory
    pub async fn scan_list(&self, scan_path: &str) -> Result<ScanListResponse, ClientError> {
        tracing::debug!(scan_path, "Requesting server directory scan");

        let builder = self
            .request(Method::POST, "/scan/scan-list", self.timeouts.request())
            .json(&ScanListRequest { scan_path });
        let response: ScanListResponse = self.send_json(builder).await?;

        tracing::info!(
            scan_path,
            files = response.files.len(),
            errors = response.errors.len(),
            "Server scan complete"
        );
        Ok(response)
    }

    /// Import server-side files into the library
    pub async fn import_batch(
        &self,
        files: &[BatchFile],
        options: &ImportOptions,
    ) -> Result<ImportBatchResponse, ClientError> {
        if files.is_empty() {
            return Err(ClientError::InvalidInput("no files to import".to_string()));
        }

        let builder = self
            .request(Method::POST, "/scan/import-batch", self.timeouts.batch_import())
            .json(&ImportBatchRequest { files, options });
        self.send_json(builder).await
    }

    /// Upload a local book file
    pub async fn upload_book(
        &self,
        path: &Path,
        options: &ImportOptions,
    ) -> Result<UploadResponse, ClientError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ClientError::InvalidInput(format!("not a file: {}", path.display())))?;

        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        tracing::debug!(file = %file_name, bytes = len, "Uploading book");

        // Streamed from disk so large books are never held in memory
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = reqwest::multipart::Part::stream_with_length(body, len)
            .file_name(file_name)
            .mime_str(mime_for(path))
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new().part("file", part);
        for (name, value) in options.form_fields() {
            form = form.text(name, value);
        }

        let builder = self
            .request(Method::POST, "/books/upload", self.timeouts.upload())
            .multipart(form);
        self.send_json(builder).await
    }

    /// Most recent import history entries
    pub async fn import_history(&self, limit: usize) -> Result<Vec<ImportHistoryEntry>, ClientError> {
        let builder = self
            .request(Method::GET, "/scan/import-history", self.timeouts.request())
            .query(&[("limit", limit)]);
        let response: ImportHistoryResponse = self.send_json(builder).await?;
        Ok(response.history)
    }

    /// Delete all import history entries
    pub async fn clear_import_history(&self) -> Result<(), ClientError> {
        let builder = self.request(Method::DELETE, "/scan/import-history", self.timeouts.request());
        let response = self.send(builder).await?;
        tracing::info!(status = %response.status(), "Import history cleared");
        Ok(())
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "epub" => "application/epub+zip",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "mobi" | "azw3" => "application/x-mobipocket-ebook",
        _ => "application/octet-stream",
    }
}
