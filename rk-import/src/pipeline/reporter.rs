//! End-of-run reporting and selection pruning

use crate::selection::SelectionSet;
use chrono::Utc;
use rk_common::events::{CandidateRef, EventBus, ImportOutcome, RkEvent, RunSummary};
use std::collections::HashSet;
use uuid::Uuid;

/// Hints shown when every attempted item failed
pub const FAILURE_HINTS: [&str; 4] = [
    "the network connection to the server is up and the server is reachable",
    "each file is within the server's upload size limit",
    "the server logs for import errors",
    "the file format is supported",
];

/// Aggregate outcomes into counters
pub fn tally(outcomes: &[ImportOutcome], abandoned: usize) -> RunSummary {
    let mut summary = RunSummary {
        abandoned,
        ..Default::default()
    };
    for outcome in outcomes {
        summary.record(&outcome.status);
    }
    summary
}

/// Emit the single summary notification, plus a failure hint when
/// nothing succeeded
pub fn report(event_bus: &EventBus, run_id: Uuid, summary: &RunSummary) {
    event_bus.emit_lossy(RkEvent::SummaryReported {
        run_id,
        summary: *summary,
        timestamp: Utc::now(),
    });

    if summary.all_failed() {
        event_bus.emit_lossy(RkEvent::FailureHint {
            run_id,
            hints: FAILURE_HINTS.iter().map(|h| h.to_string()).collect(),
            timestamp: Utc::now(),
        });
    }
}

/// Drop imported and skipped candidates from `selection`
///
/// Failed candidates stay, keeping their selection state, so the user
/// can retry them.
pub fn prune(selection: &mut SelectionSet, outcomes: &[ImportOutcome]) -> usize {
    let settled: HashSet<CandidateRef> = outcomes
        .iter()
        .filter(|o| o.status.is_settled())
        .map(|o| o.candidate.clone())
        .collect();

    if settled.is_empty() {
        return 0;
    }
    selection.prune(&settled)
}
