//! Submission payload construction
//!
//! Transforms wizard [`DraftFields`] into the backend's admission schema:
//! snake_case names, capitalised enum-like values, composite address objects
//! and the "same as present address" copy. The transform is pure.

use crate::error::PayloadError;
use crate::fields::{DraftFields, FileHandle};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Nationality assumed when the applicant leaves the field blank
pub const DEFAULT_NATIONALITY: &str = "Bangladeshi";

/// Postal address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upazila: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_office: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
}

/// Submitted documents (file names or storage URLs)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documents {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_certificate: Option<String>,
}

/// Canonical submission payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub full_name_bangla: String,
    pub full_name_english: String,
    pub father_name: String,
    pub mother_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_certificate_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nid_no: Option<String>,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    pub nationality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,

    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_relation: Option<String>,

    pub present_address: Address,
    pub permanent_address: Address,
    pub same_as_present: bool,

    pub ssc_board: String,
    pub ssc_roll: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_gpa: Option<f32>,
    pub ssc_passing_year: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_group: Option<String>,

    pub department: String,
    pub shift: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,

    pub documents: Documents,
}

impl SubmissionPayload {
    /// Build the payload from wizard fields
    ///
    /// # Errors
    /// - `PayloadError::MissingField` for a blank required field (camelCase name)
    /// - `PayloadError::InvalidField` for a malformed date, GPA or year
    pub fn from_fields(fields: &DraftFields) -> Result<Self, PayloadError> {
        let present_address = Address {
            division: clean(&fields.present_division),
            district: Some(required(&fields.present_district, "presentDistrict")?),
            upazila: clean(&fields.present_upazila),
            post_office: clean(&fields.present_post_office),
            village: clean(&fields.present_village),
        };

        let permanent_address = if fields.same_as_present {
            present_address.clone()
        } else {
            Address {
                division: clean(&fields.permanent_division),
                district: clean(&fields.permanent_district),
                upazila: clean(&fields.permanent_upazila),
                post_office: clean(&fields.permanent_post_office),
                village: clean(&fields.permanent_village),
            }
        };

        let gender = fields
            .gender
            .ok_or(PayloadError::MissingField("gender"))?
            .label()
            .to_string();
        let shift = fields
            .shift
            .ok_or(PayloadError::MissingField("shift"))?
            .label()
            .to_string();

        Ok(Self {
            full_name_bangla: required(&fields.full_name_bangla, "fullNameBangla")?,
            full_name_english: required(&fields.full_name_english, "fullNameEnglish")?,
            father_name: required(&fields.father_name, "fatherName")?,
            mother_name: required(&fields.mother_name, "motherName")?,
            date_of_birth: parse_date(&required(&fields.date_of_birth, "dateOfBirth")?)?,
            birth_certificate_no: clean(&fields.birth_certificate_no),
            nid_no: clean(&fields.nid_no),
            gender,
            religion: clean(&fields.religion).map(|v| capitalize_words(&v)),
            blood_group: clean(&fields.blood_group).map(|v| v.to_uppercase()),
            nationality: clean(&fields.nationality)
                .map_or_else(|| DEFAULT_NATIONALITY.to_string(), |v| capitalize_words(&v)),
            marital_status: clean(&fields.marital_status).map(|v| capitalize_words(&v)),

            mobile: required(&fields.mobile, "mobile")?,
            email: clean(&fields.email).map(|v| v.to_lowercase()),
            guardian_name: clean(&fields.guardian_name),
            guardian_mobile: clean(&fields.guardian_mobile),
            guardian_relation: clean(&fields.guardian_relation).map(|v| capitalize_words(&v)),

            present_address,
            permanent_address,
            same_as_present: fields.same_as_present,

            ssc_board: capitalize_words(&required(&fields.ssc_board, "sscBoard")?),
            ssc_roll: required(&fields.ssc_roll, "sscRoll")?,
            ssc_registration: clean(&fields.ssc_registration),
            ssc_gpa: clean(&fields.ssc_gpa).map(|v| parse_gpa(&v)).transpose()?,
            ssc_passing_year: parse_year(&required(&fields.ssc_passing_year, "sscPassingYear")?)?,
            ssc_group: clean(&fields.ssc_group).map(|v| capitalize_words(&v)),

            department: required(&fields.department, "department")?,
            shift,
            session: clean(&fields.session),

            documents: Documents {
                photo: fields.photo.as_ref().map(document_ref),
                ssc_transcript: fields.ssc_transcript.as_ref().map(document_ref),
                birth_certificate: fields.birth_certificate.as_ref().map(document_ref),
            },
        })
    }
}

/// Capitalise each whitespace-separated word ("islam" → "Islam",
/// "science GROUP" → "Science Group")
#[must_use]
pub fn capitalize_words(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, PayloadError> {
    clean(value).ok_or(PayloadError::MissingField(field))
}

fn parse_date(value: &str) -> Result<NaiveDate, PayloadError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| PayloadError::invalid("dateOfBirth", format!("'{value}': {e}")))
}

fn parse_gpa(value: &str) -> Result<f32, PayloadError> {
    let gpa: f32 = value
        .parse()
        .map_err(|_| PayloadError::invalid("sscGpa", format!("'{value}' is not a number")))?;
    if (0.0..=5.0).contains(&gpa) {
        Ok(gpa)
    } else {
        Err(PayloadError::invalid("sscGpa", format!("{gpa} is outside 0.00-5.00")))
    }
}

fn parse_year(value: &str) -> Result<u16, PayloadError> {
    if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PayloadError::invalid(
            "sscPassingYear",
            format!("'{value}' is not a four-digit year"),
        ));
    }
    value
        .parse()
        .map_err(|_| PayloadError::invalid("sscPassingYear", format!("'{value}' is not a year")))
}

fn document_ref(handle: &FileHandle) -> String {
    handle.url.clone().unwrap_or_else(|| handle.name.clone())
}
