//! Per-item outcome classification

use super::collaborator::SubmitResponse;
use crate::services::ClientError;
use rk_common::events::{CandidateRef, FailureReason, ImportOutcome, OutcomeStatus};

const IMPORTED_MESSAGE: &str = "Imported";
const SKIPPED_MESSAGE: &str = "Already in library";

/// Map one collaborator result onto exactly one outcome
///
/// Counters win in the order imported, skipped, failed. A success
/// response without any counter (e.g. an upload) is an import.
pub fn classify(candidate: CandidateRef, result: Result<SubmitResponse, ClientError>) -> ImportOutcome {
    let (status, message) = match result {
        Ok(response) => classify_response(response),
        Err(error) => classify_error(&error),
    };

    ImportOutcome {
        candidate,
        status,
        message,
    }
}

fn classify_response(response: SubmitResponse) -> (OutcomeStatus, String) {
    if response.imported > 0 {
        let message = response.message.unwrap_or_else(|| IMPORTED_MESSAGE.to_string());
        (OutcomeStatus::Imported, message)
    } else if response.skipped > 0 {
        let message = response.message.unwrap_or_else(|| SKIPPED_MESSAGE.to_string());
        (OutcomeStatus::Skipped, message)
    } else if response.failed > 0 {
        let message = response
            .message
            .unwrap_or_else(|| FailureReason::Unknown.describe().to_string());
        (OutcomeStatus::Failed(FailureReason::Unknown), message)
    } else {
        let message = response.message.unwrap_or_else(|| IMPORTED_MESSAGE.to_string());
        (OutcomeStatus::Imported, message)
    }
}

/// Message priority: server's structured error, then the transport
/// classification, then the generic fallback (`Unknown` describes itself
/// as the fallback).
fn classify_error(error: &ClientError) -> (OutcomeStatus, String) {
    let reason = error.failure_reason();
    let message = error
        .api_message()
        .map(str::to_string)
        .unwrap_or_else(|| reason.describe().to_string());
    (OutcomeStatus::Failed(reason), message)
}
