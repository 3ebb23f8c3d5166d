//! Admission HTTP - REST client for the admission backend
//!
//! Implements [`admission_sync::AdmissionBackend`] over the admissions API
//! and maps HTTP failures onto the backend error taxonomy.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod config;
pub mod error;

pub use client::HttpAdmissionBackend;
pub use config::{HttpConfig, DEFAULT_BASE_URL};
pub use error::{classify_response, HttpError, DUPLICATE_CODE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
