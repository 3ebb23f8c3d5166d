//! Admission Core - draft, submission and payload types
//!
//! Shared vocabulary for the admission wizard:
//! - Field record for every wizard input
//! - Draft state and submission record
//! - Backend response shapes and error taxonomy
//! - Canonical submission payload transform
//!
//! # Example
//!
//! ```rust
//! use admission_core::{DraftFields, SubmissionPayload, PayloadError};
//!
//! let mut fields = DraftFields::new();
//! fields.set_by_name("fullNameEnglish", "Rahim Khan").unwrap();
//!
//! // Incomplete drafts cannot be submitted
//! assert!(matches!(
//!     SubmissionPayload::from_fields(&fields),
//!     Err(PayloadError::MissingField(_))
//! ));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod fields;
pub mod payload;
pub mod types;

pub use config::{RetryPolicy, SyncConfig};
pub use error::{BackendError, ErrorKind, FieldError, PayloadError};
pub use fields::{DraftFields, FileHandle, Gender, Shift};
pub use payload::{Address, Documents, SubmissionPayload};
pub use types::{
    AdmissionSummary, DraftSource, DraftState, ExistingAdmission, SaveAck, ServerDraft,
    SubmissionRecord, SubmitReceipt,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
