//! Sequential executor
//!
//! Submits selected candidates one at a time, in list order. Never more
//! than one request is in flight; the backend's import pipeline is a
//! single writer.

use super::classifier;
use super::collaborator::ImportCollaborator;
use super::PipelineState;
use crate::models::{ImportCandidate, ImportOptions};
use chrono::Utc;
use rk_common::events::{EventBus, OutcomeStatus, RkEvent, RunProgress};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What the loop left undone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Items never submitted because cancellation was requested
    pub abandoned: usize,
}

/// Run the loop, appending one outcome per submitted item to `state`
///
/// Cancellation is checked between items; an in-flight call always
/// completes and is classified.
pub(crate) async fn execute(
    state: &mut PipelineState,
    event_bus: &EventBus,
    run_id: Uuid,
    batch: &[ImportCandidate],
    options: &ImportOptions,
    collaborator: &dyn ImportCollaborator,
    cancel: &CancellationToken,
) -> ExecutionResult {
    let total = batch.len();

    for (i, candidate) in batch.iter().enumerate() {
        if cancel.is_cancelled() {
            let abandoned = total - i;
            info!(%run_id, abandoned, "Run cancelled, remaining items not attempted");
            return ExecutionResult { abandoned };
        }

        let index = i + 1;
        state.progress = RunProgress {
            current: index,
            total,
        };
        event_bus.emit_lossy(RkEvent::ProgressChanged {
            run_id,
            progress: state.progress,
            timestamp: Utc::now(),
        });

        debug!(%run_id, index, total, file = %candidate.display_name, "Submitting");
        let result = collaborator.submit(candidate, options).await;
        let outcome = classifier::classify(candidate.to_ref(), result);

        match outcome.status {
            OutcomeStatus::Imported | OutcomeStatus::Skipped => {
                info!(
                    %run_id,
                    index,
                    file = %candidate.display_name,
                    status = ?outcome.status,
                    "{}",
                    outcome.message
                );
            }
            OutcomeStatus::Failed(reason) => {
                warn!(
                    %run_id,
                    index,
                    file = %candidate.display_name,
                    ?reason,
                    "Import failed: {}",
                    outcome.message
                );
            }
        }

        event_bus.emit_lossy(RkEvent::ItemOutcome {
            run_id,
            index,
            outcome: outcome.clone(),
            timestamp: Utc::now(),
        });
        state.outcomes.push(outcome);
    }

    ExecutionResult::default()
}
