//! Error types for rk-import

use crate::services::{ClientError, ScanError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// ReadKnows API call failed outside a run (scan, history)
    #[error("Server request failed: {0}")]
    Client(#[from] ClientError),

    /// Local file discovery failed
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Configuration or other shared failure
    #[error("Common error: {0}")]
    Common(#[from] rk_common::Error),
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;
