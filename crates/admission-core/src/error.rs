//! Error types for the admission core
//!
//! Provides the error taxonomy shared by every layer:
//! - Backend call failures (network, duplicate submission, validation, ...)
//! - Field edits that cannot be applied
//! - Submission payload construction failures

/// Classification of a backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connectivity problem or backend unreachable
    Network,
    /// The application was already submitted
    DuplicateSubmission,
    /// Malformed payload rejected by the backend
    Validation,
    /// Requested record does not exist
    NotFound,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::DuplicateSubmission => "duplicate submission",
            Self::Validation => "validation",
            Self::NotFound => "not found",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Errors returned by an admission backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Backend unreachable or transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Backend signalled that an application already exists
    #[error("{message}")]
    DuplicateSubmission {
        /// Raw backend message
        message: String,
    },

    /// Backend rejected the request content
    #[error("{0}")]
    Validation(String),

    /// Record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Unclassified failure
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl BackendError {
    /// Create a duplicate-submission error
    #[inline]
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::DuplicateSubmission {
            message: message.into(),
        }
    }

    /// Classification of this error
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::DuplicateSubmission { .. } => ErrorKind::DuplicateSubmission,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Check if error is retryable
    ///
    /// Validation and duplicate errors describe the request itself, so
    /// sending it again cannot succeed.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Unknown(_))
    }

    /// Check if the backend reported a duplicate submission
    #[inline]
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateSubmission { .. })
    }

    /// Check if the error means the backend could not be reached
    #[inline]
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Errors applying a named field edit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// No field with this name
    #[error("unknown field: '{0}'")]
    UnknownField(String),

    /// Value could not be parsed for the field
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl FieldError {
    /// Create invalid value error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors building the submission payload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Required field missing or blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Field present but malformed
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl PayloadError {
    /// Create invalid field error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
