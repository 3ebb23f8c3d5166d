//! Observable controller state and operation outcomes

use admission_core::{DraftSource, DraftState, ErrorKind, SubmissionRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle phase of the admission application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Bootstrap has not completed
    Loading,
    /// Wizard is editable
    Draft,
    /// Application submitted; terminal
    Submitted {
        /// The submission
        record: SubmissionRecord,
    },
}

impl Phase {
    /// Submission record when submitted
    #[inline]
    #[must_use]
    pub fn record(&self) -> Option<&SubmissionRecord> {
        match self {
            Phase::Submitted { record } => Some(record),
            _ => None,
        }
    }
}

/// Snapshot the UI renders from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    pub phase: Phase,
    pub draft: DraftState,
    /// Backend unreachable on the last attempt; edits are kept on the device
    pub offline: bool,
    pub saving: bool,
    pub submitting: bool,
    /// Message of the last failure, cleared on the next success
    pub last_error: Option<String>,
}

impl SyncStatus {
    pub(crate) fn loading() -> Self {
        Self {
            phase: Phase::Loading,
            draft: DraftState::new(),
            offline: false,
            saving: false,
            submitting: false,
            last_error: None,
        }
    }

    /// Check if the application is submitted
    #[inline]
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, Phase::Submitted { .. })
    }
}

/// Result of [`crate::DraftSyncController::bootstrap`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// User already has an application
    Submitted(SubmissionRecord),
    /// Wizard should be shown with the loaded draft
    Draft {
        source: DraftSource,
        offline: bool,
    },
}

/// Result of a draft save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Backend acknowledged the save
    Saved { saved_at: DateTime<Utc> },
    /// All attempts failed; the draft is only on the device
    Failed {
        kind: ErrorKind,
        message: String,
        attempts: u32,
    },
    /// Nothing to save (not loaded yet, or already submitted)
    Skipped,
}

/// Result of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Application accepted, fresh or recovered from a duplicate
    Submitted(SubmissionRecord),
    /// Rejected; the draft is untouched
    Rejected { kind: ErrorKind, message: String },
    /// Another submission is in flight
    Busy,
    /// Bootstrap has not completed
    NotReady,
}
