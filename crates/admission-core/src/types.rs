//! Core types for admission drafts
//!
//! Defines:
//! - Draft state and where it was loaded from
//! - The submission record that replaces the draft once submitted
//! - Response shapes exchanged with the admission backend

use crate::fields::DraftFields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Where the currently loaded draft came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftSource {
    /// Confirmed by the backend
    Server,
    /// Only persisted on this device
    Local,
    /// Fresh draft
    #[default]
    None,
}

/// In-progress admission application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    /// Latest field values
    pub fields: DraftFields,
    /// Wizard page currently shown (1-based)
    pub current_step: u8,
    /// Last server-acknowledged save
    pub saved_at: Option<DateTime<Utc>>,
    /// Origin of the loaded draft
    pub source: DraftSource,
}

impl DraftState {
    /// Create empty draft on the first step
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: DraftFields::default(),
            current_step: 1,
            saved_at: None,
            source: DraftSource::None,
        }
    }

    /// Create draft from stored fields
    #[inline]
    #[must_use]
    pub fn from_parts(fields: DraftFields, current_step: u8, source: DraftSource) -> Self {
        Self {
            fields,
            current_step,
            saved_at: None,
            source,
        }
    }

    /// With server save timestamp
    #[inline]
    #[must_use]
    pub fn with_saved_at(mut self, saved_at: Option<DateTime<Utc>>) -> Self {
        self.saved_at = saved_at;
        self
    }

    /// Clamp the step into `1..=total_steps`
    #[inline]
    #[must_use]
    pub fn clamp_step(step: u8, total_steps: u8) -> u8 {
        step.clamp(1, total_steps.max(1))
    }
}

impl Default for DraftState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a fresh or already-existing submission
///
/// Created once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionRecord {
    application_id: String,
    already_submitted: bool,
}

impl SubmissionRecord {
    /// Record for an application accepted by this session's submit
    #[inline]
    #[must_use]
    pub fn submitted(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            already_submitted: false,
        }
    }

    /// Record for an application found during reconciliation
    #[inline]
    #[must_use]
    pub fn discovered(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            already_submitted: true,
        }
    }

    /// Backend-issued application identifier
    #[inline]
    #[must_use]
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Whether the record was discovered rather than freshly submitted
    #[inline]
    #[must_use]
    pub fn already_submitted(&self) -> bool {
        self.already_submitted
    }
}

/// Response of the existing-admission check
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingAdmission {
    /// Whether the user already has an admission
    #[serde(alias = "has_admission")]
    pub has_admission: bool,
    /// Admission identifier if present
    #[serde(
        default,
        alias = "admission_id",
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub admission_id: Option<String>,
}

impl ExistingAdmission {
    /// No admission on record
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Admission exists with this id
    #[inline]
    #[must_use]
    pub fn found(admission_id: impl Into<String>) -> Self {
        Self {
            has_admission: true,
            admission_id: Some(admission_id.into()),
        }
    }
}

/// Draft as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDraft {
    /// Saved field values
    pub draft_data: DraftFields,
    /// Saved wizard step
    #[serde(default = "first_step")]
    pub current_step: u8,
    /// Server save timestamp
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Acknowledgement of a draft save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveAck {
    /// Server save timestamp
    pub saved_at: DateTime<Utc>,
}

/// Response of a submit call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    /// Application identifier
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    /// Set when the backend resolved the submit to an existing application
    #[serde(default, alias = "already_submitted")]
    pub already_submitted: Option<bool>,
}

impl SubmitReceipt {
    /// Receipt for a fresh submission
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            already_submitted: None,
        }
    }
}

/// The user's admission as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionSummary {
    /// Application identifier
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    /// Remaining admission fields
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl AdmissionSummary {
    /// Summary with no extra details
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            details: serde_json::Map::new(),
        }
    }
}

fn first_step() -> u8 {
    1
}

/// Identifiers arrive as strings or integers depending on the endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn required_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}
