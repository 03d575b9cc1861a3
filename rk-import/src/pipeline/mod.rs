//! Batch import pipeline
//!
//! Drives one run at a time over a [`SelectionSet`]:
//! preconditions, sequential execution, per-item classification,
//! aggregate reporting and pruning of settled candidates.
//!
//! **State machine:** `Idle → Running(current, total) → Idle`
//!
//! Every observable step is broadcast on the [`EventBus`]; front ends
//! subscribe instead of reading pipeline state.

pub mod classifier;
pub mod collaborator;
mod executor;
pub mod reporter;

pub use collaborator::{DirectoryImporter, ImportCollaborator, LocalUploader, SubmitResponse};
pub use executor::ExecutionResult;

use crate::models::{ImportCandidate, ImportOptions};
use crate::selection::SelectionSet;
use chrono::Utc;
use rk_common::events::{
    EventBus, ImportOutcome, RejectReason, RkEvent, RunProgress, RunSource, RunSummary,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Whether a run is in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
}

/// Pipeline state, reset to idle when a run ends
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub phase: RunPhase,
    pub progress: RunProgress,
    /// Outcomes of the run in progress, in submission order
    pub outcomes: Vec<ImportOutcome>,
}

impl PipelineState {
    fn reset(&mut self) {
        self.phase = RunPhase::Idle;
        self.progress = RunProgress::idle();
        self.outcomes.clear();
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub source: RunSource,
    pub summary: RunSummary,
    /// One per attempted item, in submission order
    pub outcomes: Vec<ImportOutcome>,
    pub cancelled: bool,
    /// Candidates removed from the selection set
    pub pruned: usize,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// How a run request ended
#[derive(Debug, Clone)]
pub enum RunStatus {
    /// Preconditions failed; no item was submitted
    Rejected(RejectReason),
    Completed(RunReport),
}

impl RunStatus {
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunStatus::Completed(report) => Some(report),
            RunStatus::Rejected(_) => None,
        }
    }
}

pub struct BatchPipeline {
    event_bus: EventBus,
    state: PipelineState,
}

impl BatchPipeline {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            event_bus,
            state: PipelineState::default(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Import the selected server-side files
    pub async fn run_directory_import(
        &mut self,
        selection: &mut SelectionSet,
        options: &ImportOptions,
        collaborator: &dyn ImportCollaborator,
        cancel: &CancellationToken,
    ) -> RunStatus {
        self.run(RunSource::DirectoryImport, selection, options, collaborator, true, cancel)
            .await
    }

    /// Upload the selected local files
    ///
    /// Refused unless the user accepted the upload disclaimer.
    pub async fn run_local_upload(
        &mut self,
        selection: &mut SelectionSet,
        options: &ImportOptions,
        collaborator: &dyn ImportCollaborator,
        disclaimer_accepted: bool,
        cancel: &CancellationToken,
    ) -> RunStatus {
        self.run(
            RunSource::LocalUpload,
            selection,
            options,
            collaborator,
            disclaimer_accepted,
            cancel,
        )
        .await
    }

    async fn run(
        &mut self,
        source: RunSource,
        selection: &mut SelectionSet,
        options: &ImportOptions,
        collaborator: &dyn ImportCollaborator,
        consent: bool,
        cancel: &CancellationToken,
    ) -> RunStatus {
        if let Some(reason) = check_preconditions(selection, consent) {
            warn!(%source, %reason, "Run rejected");
            self.event_bus.emit_lossy(RkEvent::RunRejected {
                source,
                reason,
                timestamp: Utc::now(),
            });
            return RunStatus::Rejected(reason);
        }

        let batch: Vec<ImportCandidate> = selection.selected().cloned().collect();
        let run_id = Uuid::new_v4();
        let total = batch.len();

        info!(%run_id, %source, total, "Starting run");
        self.state.phase = RunPhase::Running;
        self.event_bus.emit_lossy(RkEvent::RunStarted {
            run_id,
            source,
            total,
            timestamp: Utc::now(),
        });

        let ExecutionResult { abandoned } = executor::execute(
            &mut self.state,
            &self.event_bus,
            run_id,
            &batch,
            options,
            collaborator,
            cancel,
        )
        .await;

        let outcomes = std::mem::take(&mut self.state.outcomes);
        let summary = reporter::tally(&outcomes, abandoned);
        reporter::report(&self.event_bus, run_id, &summary);
        let pruned = reporter::prune(selection, &outcomes);

        self.state.reset();
        self.event_bus.emit_lossy(RkEvent::ProgressChanged {
            run_id,
            progress: RunProgress::idle(),
            timestamp: Utc::now(),
        });

        let cancelled = abandoned > 0;
        info!(
            %run_id,
            imported = summary.imported,
            skipped = summary.skipped,
            failed = summary.failed,
            abandoned,
            pruned,
            "Run finished"
        );
        self.event_bus.emit_lossy(RkEvent::RunFinished {
            run_id,
            source,
            summary,
            cancelled,
            timestamp: Utc::now(),
        });

        RunStatus::Completed(RunReport {
            run_id,
            source,
            summary,
            outcomes,
            cancelled,
            pruned,
        })
    }
}

fn check_preconditions(selection: &SelectionSet, consent: bool) -> Option<RejectReason> {
    if selection.selected_count() == 0 {
        Some(RejectReason::EmptySelection)
    } else if !consent {
        Some(RejectReason::ConsentRequired)
    } else {
        None
    }
}
