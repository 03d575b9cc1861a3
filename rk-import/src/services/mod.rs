//! External services: the ReadKnows API and local file discovery

pub mod local_scanner;
pub mod readknows_client;

pub use local_scanner::{LocalScanResult, LocalScanner, ScanError};
pub use readknows_client::{
    extract_api_message, reason_for_status, BatchFile, ClientError, ImportBatchResponse,
    ReadKnowsClient, ScanIssue, ScanListResponse, ScannedFile, UploadResponse, UploadedBook,
    WireTimestamp,
};
