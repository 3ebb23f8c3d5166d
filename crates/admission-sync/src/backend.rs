//! Admission backend collaborator
//!
//! The controller talks to the backend only through [`AdmissionBackend`];
//! the REST client lives in `admission-http`, tests use scripted fakes.

use admission_core::{
    AdmissionSummary, BackendError, DraftFields, ExistingAdmission, SaveAck, ServerDraft,
    SubmissionPayload, SubmitReceipt,
};
use async_trait::async_trait;

/// Remote admission service
///
/// Every method is a suspension point; implementations classify their
/// failures into [`BackendError`] so the controller can decide between
/// fallback, retry and surfacing.
#[async_trait]
pub trait AdmissionBackend: Send + Sync + std::fmt::Debug {
    /// Whether the current user already has a submitted admission
    async fn check_existing_admission(&self) -> Result<ExistingAdmission, BackendError>;

    /// Server-side draft, `None` when the user has not saved one
    async fn get_draft(&self) -> Result<Option<ServerDraft>, BackendError>;

    /// Persist the draft
    async fn save_draft(&self, fields: &DraftFields, step: u8) -> Result<SaveAck, BackendError>;

    /// Delete the server-side draft
    async fn clear_draft(&self) -> Result<(), BackendError>;

    /// Submit the application
    async fn submit_application(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmitReceipt, BackendError>;

    /// The user's existing admission
    async fn get_my_admission(&self) -> Result<AdmissionSummary, BackendError>;
}
