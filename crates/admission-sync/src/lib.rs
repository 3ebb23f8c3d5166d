//! Admission Sync - draft synchronisation for the admission wizard
//!
//! Keeps an in-progress application safe across reloads and flaky networks
//! and guarantees it is submitted at most once.
//!
//! # Architecture
//!
//! ```text
//! edit → DraftState ──mirror──→ LocalStore (device)
//!            │
//!            └─debounce─→ save_draft ─retry─→ AdmissionBackend
//!
//! submit → payload → submit_application ─duplicate─→ get_my_admission
//!                          │
//!                          └──→ SubmissionRecord (device + state)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use admission_sync::prelude::*;
//!
//! # async fn example(backend: std::sync::Arc<dyn AdmissionBackend>) {
//! let controller = DraftSyncController::new(
//!     SyncConfig::default(),
//!     backend,
//!     std::sync::Arc::new(MemoryStore::new()),
//!     std::sync::Arc::new(TracingNotifier),
//! );
//!
//! if let BootstrapOutcome::Draft { .. } = controller.bootstrap().await {
//!     controller.set_field("fullNameEnglish", "Rahim Khan").unwrap();
//!     controller.submit().await;
//! }
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod backend;
pub mod controller;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod retry;
pub mod status;
pub mod store;

pub use backend::AdmissionBackend;
pub use controller::DraftSyncController;
pub use error::{StoreError, SyncError};
pub use notify::{
    ChannelNotifier, Notification, NotificationAction, NotificationLevel, Notifier,
    TracingNotifier,
};
pub use persistence::{DraftStorage, LocalDraft, DRAFT_KEY, SUBMISSION_KEY};
pub use retry::{retry_with_backoff, RetryFailure};
pub use status::{BootstrapOutcome, Phase, SaveOutcome, SubmitOutcome, SyncStatus};
pub use store::{FileStore, LocalStore, MemoryStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the controller
    pub use crate::backend::AdmissionBackend;
    pub use crate::controller::DraftSyncController;
    pub use crate::notify::{Notification, NotificationAction, Notifier, TracingNotifier};
    pub use crate::status::{BootstrapOutcome, Phase, SaveOutcome, SubmitOutcome, SyncStatus};
    pub use crate::store::{FileStore, LocalStore, MemoryStore};
    pub use admission_core::{DraftFields, DraftSource, SubmissionRecord, SyncConfig};
}
