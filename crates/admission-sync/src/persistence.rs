//! Typed access to the two locally persisted admission entries
//!
//! - `admission_draft`: `{ formData, currentStep }`
//! - `admission_submission_state`: `{ isSubmitted: true, applicationId }`

use crate::error::StoreError;
use crate::store::LocalStore;
use admission_core::{DraftFields, SubmissionRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Key of the mirrored draft
pub const DRAFT_KEY: &str = "admission_draft";

/// Key of the recorded submission
pub const SUBMISSION_KEY: &str = "admission_submission_state";

/// Draft as mirrored on the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalDraft {
    /// Field values
    pub form_data: DraftFields,
    /// Wizard step
    pub current_step: u8,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalSubmission {
    is_submitted: bool,
    application_id: String,
}

/// Draft and submission persistence over a [`LocalStore`]
#[derive(Debug, Clone)]
pub struct DraftStorage {
    store: Arc<dyn LocalStore>,
}

impl DraftStorage {
    /// Wrap a store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Mirrored draft, if any
    ///
    /// # Errors
    /// `StoreError::Corrupt` if the stored blob is not a draft
    pub fn load_draft(&self) -> Result<Option<LocalDraft>, StoreError> {
        self.read(DRAFT_KEY)
    }

    /// Replace the mirrored draft
    pub fn save_draft(&self, fields: &DraftFields, current_step: u8) -> Result<(), StoreError> {
        let draft = LocalDraft {
            form_data: fields.clone(),
            current_step,
        };
        self.write(DRAFT_KEY, &draft)
    }

    /// Delete the mirrored draft
    pub fn clear_draft(&self) -> Result<(), StoreError> {
        self.store.remove(DRAFT_KEY)
    }

    /// Recorded submission, if any
    ///
    /// Entries with `isSubmitted: false` or a blank id are ignored. A
    /// recorded submission always counts as already submitted.
    pub fn load_submission(&self) -> Result<Option<SubmissionRecord>, StoreError> {
        let stored: Option<LocalSubmission> = self.read(SUBMISSION_KEY)?;
        Ok(stored
            .filter(|s| s.is_submitted && !s.application_id.trim().is_empty())
            .map(|s| SubmissionRecord::discovered(s.application_id)))
    }

    /// Record a submission
    pub fn save_submission(&self, record: &SubmissionRecord) -> Result<(), StoreError> {
        let entry = LocalSubmission {
            is_submitted: true,
            application_id: record.application_id().to_string(),
        };
        self.write(SUBMISSION_KEY, &entry)
    }

    /// Forget the recorded submission
    pub fn clear_submission(&self) -> Result<(), StoreError> {
        self.store.remove(SUBMISSION_KEY)
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.store
            .get(key)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &raw)
    }
}
