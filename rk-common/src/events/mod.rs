//! Event types for the ReadKnows event system
//!
//! Provides the shared event enum and the EventBus that front ends
//! subscribe to instead of polling pipeline state.

mod import_types;

pub use import_types::{
    CandidateRef, FailureReason, ImportOutcome, OutcomeStatus, RejectReason, RunProgress,
    RunSource, RunSummary,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// ReadKnows event types
///
/// Events are broadcast via EventBus and can be serialized as JSON lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RkEvent {
    /// A run was refused before touching any item
    ///
    /// Triggers:
    /// - UI: Show one blocking error notification
    RunRejected {
        source: RunSource,
        reason: RejectReason,
        timestamp: DateTime<Utc>,
    },

    /// A run passed its preconditions and is about to process items
    RunStarted {
        run_id: Uuid,
        source: RunSource,
        /// Number of selected candidates
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// The executor is about to submit item `progress.current`
    ///
    /// Also emitted once with an idle counter when the run ends.
    ProgressChanged {
        run_id: Uuid,
        progress: RunProgress,
        timestamp: DateTime<Utc>,
    },

    /// One item was classified
    ///
    /// Triggers:
    /// - UI: Transient per-item notification
    ItemOutcome {
        run_id: Uuid,
        /// 1-based position within the run
        index: usize,
        outcome: ImportOutcome,
        timestamp: DateTime<Utc>,
    },

    /// Aggregate counts once the loop has exited
    SummaryReported {
        run_id: Uuid,
        summary: RunSummary,
        timestamp: DateTime<Utc>,
    },

    /// Every attempted item failed; likely causes for the user to check
    FailureHint {
        run_id: Uuid,
        hints: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Run is back to idle
    RunFinished {
        run_id: Uuid,
        source: RunSource,
        summary: RunSummary,
        cancelled: bool,
        timestamp: DateTime<Utc>,
    },
}

impl RkEvent {
    /// Variant name, useful for logging and filtering
    pub fn event_type(&self) -> &str {
        match self {
            RkEvent::RunRejected { .. } => "RunRejected",
            RkEvent::RunStarted { .. } => "RunStarted",
            RkEvent::ProgressChanged { .. } => "ProgressChanged",
            RkEvent::ItemOutcome { .. } => "ItemOutcome",
            RkEvent::SummaryReported { .. } => "SummaryReported",
            RkEvent::FailureHint { .. } => "FailureHint",
            RkEvent::RunFinished { .. } => "RunFinished",
        }
    }

    /// Render the user-facing notification for this event, if it has one
    ///
    /// Progress and lifecycle events drive counters, not notifications.
    pub fn notification(&self) -> Option<Notification> {
        match self {
            RkEvent::RunRejected { reason, .. } => {
                Some(Notification::new(NotificationLevel::Error, reason.to_string()))
            }
            RkEvent::ItemOutcome { outcome, .. } => {
                let name = &outcome.candidate.display_name;
                let notification = match outcome.status {
                    OutcomeStatus::Imported => Notification::new(
                        NotificationLevel::Success,
                        format!("Imported {}", name),
                    ),
                    OutcomeStatus::Skipped => Notification::new(
                        NotificationLevel::Warning,
                        format!("Skipped {}: {}", name, outcome.message),
                    ),
                    OutcomeStatus::Failed(_) => Notification::new(
                        NotificationLevel::Error,
                        format!("{}: {}", name, outcome.message),
                    ),
                };
                Some(notification)
            }
            RkEvent::SummaryReported { summary, .. } => {
                let level = if summary.failed > 0 {
                    NotificationLevel::Warning
                } else if summary.imported > 0 {
                    NotificationLevel::Success
                } else {
                    NotificationLevel::Info
                };
                Some(Notification::new(level, summary.display_string()))
            }
            RkEvent::FailureHint { hints, .. } => Some(Notification::new(
                NotificationLevel::Warning,
                format!("All items failed. Check: {}", hints.join("; ")),
            )),
            RkEvent::RunStarted { .. }
            | RkEvent::ProgressChanged { .. }
            | RkEvent::RunFinished { .. } => None,
        }
    }
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message for the user (a toast in a graphical front end)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Shorthand for [`RkEvent::notification`]
    pub fn from_event(event: &RkEvent) -> Option<Self> {
        event.notification()
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// A 100-item run produces a little over 200 events; size the capacity
/// accordingly or drain the receiver concurrently.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RkEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RkEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: RkEvent) -> Result<usize, broadcast::error::SendError<RkEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RkEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
