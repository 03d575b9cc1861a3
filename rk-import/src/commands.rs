//! Helpers behind the `rk-import` subcommands
//!
//! Kept in the library so integration tests can drive them without the
//! binary.

use crate::error::ImportResult;
use crate::models::{filter_by_status, ImportCandidate, ImportHistoryEntry};
use crate::selection::SelectionSet;
use crate::services::{LocalScanner, ReadKnowsClient, ScanIssue};
use rk_common::events::{Notification, NotificationLevel, RkEvent};
use rk_common::pagination::{paginate, Pagination};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

/// Server scan turned into a fully selected [`SelectionSet`]
pub async fn scan_candidates(
    client: &ReadKnowsClient,
    scan_path: &str,
) -> ImportResult<(SelectionSet, Vec<ScanIssue>)> {
    let response = client.scan_list(scan_path).await?;
    for issue in &response.errors {
        warn!(scan_path, "Scan issue: {}", issue);
    }

    let selection: SelectionSet = response
        .files
        .iter()
        .map(ImportCandidate::from_scanned)
        .map(|mut c| {
            c.selected = true;
            c
        })
        .collect();
    Ok((selection, response.errors))
}

/// Local paths turned into a fully selected [`SelectionSet`]
pub fn local_candidates(scanner: &LocalScanner, paths: &[PathBuf]) -> ImportResult<SelectionSet> {
    let result = scanner.scan(paths)?;
    for path in &result.unsupported {
        warn!("Unsupported file type, ignoring: {}", path.display());
    }
    for error in &result.errors {
        warn!("{}", error);
    }
    info!(candidates = result.candidates.len(), "Local files discovered");

    Ok(result
        .candidates
        .into_iter()
        .map(|mut c| {
            c.selected = true;
            c
        })
        .collect())
}

/// Keep only candidates whose extension is in `extensions`
///
/// An empty list selects everything. Matching ignores case and a
/// leading dot.
pub fn apply_extension_filter(selection: &mut SelectionSet, extensions: &[String]) {
    if extensions.is_empty() {
        selection.select_where(|_| true);
        return;
    }

    let wanted: Vec<String> = extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .collect();
    selection.select_where(|c| wanted.iter().any(|w| *w == c.extension));
}

/// One page of history entries after status filtering
pub fn list_history<'a>(
    entries: &'a [ImportHistoryEntry],
    status: Option<&str>,
    page: usize,
    page_size: usize,
) -> (Vec<&'a ImportHistoryEntry>, Pagination) {
    let filtered = filter_by_status(entries, status);
    let (rows, pagination) = paginate(&filtered, page, page_size);
    (rows.to_vec(), pagination)
}

/// Print notifications for one run until it finishes or is rejected
///
/// Events lost to a lagging receiver are reported as a single
/// "dropped" line. Returns the last event seen so callers can inspect
/// the outcome.
pub async fn render_events<W: Write>(
    mut rx: broadcast::Receiver<RkEvent>,
    mut out: W,
) -> std::io::Result<Option<RkEvent>> {
    let mut total = 0;

    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event renderer lagged behind");
                writeln!(
                    out,
                    "warning: {} notification(s) dropped; see `rk-import history list` for every item",
                    skipped
                )?;
                continue;
            }
            Err(RecvError::Closed) => return Ok(None),
        };

        match &event {
            RkEvent::RunStarted { source, total: t, .. } => {
                total = *t;
                writeln!(out, "Starting {} of {} file(s)", source, t)?;
            }
            RkEvent::ItemOutcome { index, .. } => {
                if let Some(n) = Notification::from_event(&event) {
                    writeln!(out, "[{}/{}] {} {}", index, total, tag(n.level), n.message)?;
                }
            }
            _ => {
                if let Some(n) = Notification::from_event(&event) {
                    writeln!(out, "{} {}", tag(n.level), n.message)?;
                }
            }
        }

        if matches!(event, RkEvent::RunFinished { .. } | RkEvent::RunRejected { .. }) {
            out.flush()?;
            return Ok(Some(event));
        }
    }
}

fn tag(level: NotificationLevel) -> &'static str {
    match level {
        NotificationLevel::Info => "info:",
        NotificationLevel::Success => "ok:",
        NotificationLevel::Warning => "warning:",
        NotificationLevel::Error => "error:",
    }
}
