//! Admission wizard field record
//!
//! Every wizard input has a named optional member on [`DraftFields`]; the
//! serialized form (camelCase keys, unset members omitted) is the
//! `formData` blob stored locally and sent to the backend as `draft_data`.

use crate::error::FieldError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Applicant gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Other
    Other,
}

impl Gender {
    /// Display label expected by the backend
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(FieldError::invalid(
                "gender",
                format!("expected male, female or other, got '{other}'"),
            )),
        }
    }
}

/// Class shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    /// First shift
    Morning,
    /// Second shift
    Day,
}

impl Shift {
    /// Display label expected by the backend
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Shift::Morning => "Morning",
            Shift::Day => "Day",
        }
    }
}

impl FromStr for Shift {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" | "1st" | "first" => Ok(Shift::Morning),
            "day" | "2nd" | "second" => Ok(Shift::Day),
            other => Err(FieldError::invalid(
                "shift",
                format!("expected morning or day, got '{other}'"),
            )),
        }
    }
}

/// Reference to an uploaded document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    /// Original file name
    pub name: String,
    /// Storage URL once uploaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl FileHandle {
    /// Create handle for a not-yet-uploaded file
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            size_bytes: None,
        }
    }

    /// With storage URL
    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Wizard field values
///
/// All members are optional until submission; required-ness is checked when
/// the submission payload is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftFields {
    // Personal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name_bangla: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name_english: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_certificate_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nid_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,

    // Contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_relation: Option<String>,

    // Present address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present_division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present_district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present_upazila: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present_post_office: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present_village: Option<String>,

    // Permanent address
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub same_as_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent_division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent_district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent_upazila: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent_post_office: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent_village: Option<String>,

    // Academic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_board: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_roll: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_gpa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_passing_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_group: Option<String>,

    // Programme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<Shift>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,

    // Documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<FileHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssc_transcript: Option<FileHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_certificate: Option<FileHandle>,
}

impl DraftFields {
    /// Names accepted by [`DraftFields::set_by_name`]
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "fullNameBangla",
        "fullNameEnglish",
        "fatherName",
        "motherName",
        "dateOfBirth",
        "birthCertificateNo",
        "nidNo",
        "gender",
        "religion",
        "bloodGroup",
        "nationality",
        "maritalStatus",
        "mobile",
        "email",
        "guardianName",
        "guardianMobile",
        "guardianRelation",
        "presentDivision",
        "presentDistrict",
        "presentUpazila",
        "presentPostOffice",
        "presentVillage",
        "sameAsPresent",
        "permanentDivision",
        "permanentDistrict",
        "permanentUpazila",
        "permanentPostOffice",
        "permanentVillage",
        "sscBoard",
        "sscRoll",
        "sscRegistration",
        "sscGpa",
        "sscPassingYear",
        "sscGroup",
        "department",
        "shift",
        "session",
        "photo",
        "sscTranscript",
        "birthCertificate",
    ];

    /// Create empty field record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field from its camelCase name and a textual value
    ///
    /// A blank value clears the field. On error the record is unchanged.
    ///
    /// # Errors
    /// - `FieldError::UnknownField` if `name` is not a wizard field
    /// - `FieldError::InvalidValue` if `value` does not parse for the field
    pub fn set_by_name(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let text = || {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        let file = || text().map(FileHandle::named);

        match name {
            "fullNameBangla" => self.full_name_bangla = text(),
            "fullNameEnglish" => self.full_name_english = text(),
            "fatherName" => self.father_name = text(),
            "motherName" => self.mother_name = text(),
            "dateOfBirth" => self.date_of_birth = text(),
            "birthCertificateNo" => self.birth_certificate_no = text(),
            "nidNo" => self.nid_no = text(),
            "gender" => self.gender = text().map(|v| v.parse::<Gender>()).transpose()?,
            "religion" => self.religion = text(),
            "bloodGroup" => self.blood_group = text(),
            "nationality" => self.nationality = text(),
            "maritalStatus" => self.marital_status = text(),
            "mobile" => self.mobile = text(),
            "email" => self.email = text(),
            "guardianName" => self.guardian_name = text(),
            "guardianMobile" => self.guardian_mobile = text(),
            "guardianRelation" => self.guardian_relation = text(),
            "presentDivision" => self.present_division = text(),
            "presentDistrict" => self.present_district = text(),
            "presentUpazila" => self.present_upazila = text(),
            "presentPostOffice" => self.present_post_office = text(),
            "presentVillage" => self.present_village = text(),
            "sameAsPresent" => self.same_as_present = parse_flag(value)?,
            "permanentDivision" => self.permanent_division = text(),
            "permanentDistrict" => self.permanent_district = text(),
            "permanentUpazila" => self.permanent_upazila = text(),
            "permanentPostOffice" => self.permanent_post_office = text(),
            "permanentVillage" => self.permanent_village = text(),
            "sscBoard" => self.ssc_board = text(),
            "sscRoll" => self.ssc_roll = text(),
            "sscRegistration" => self.ssc_registration = text(),
            "sscGpa" => self.ssc_gpa = text(),
            "sscPassingYear" => self.ssc_passing_year = text(),
            "sscGroup" => self.ssc_group = text(),
            "department" => self.department = text(),
            "shift" => self.shift = text().map(|v| v.parse::<Shift>()).transpose()?,
            "session" => self.session = text(),
            "photo" => self.photo = file(),
            "sscTranscript" => self.ssc_transcript = file(),
            "birthCertificate" => self.birth_certificate = file(),
            other => return Err(FieldError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Number of populated fields
    #[must_use]
    pub fn filled_count(&self) -> usize {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_object().map(serde_json::Map::len))
            .unwrap_or(0)
    }

    /// Check if no field has been filled
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_flag(value: &str) -> Result<bool, FieldError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" | "" => Ok(false),
        other => Err(FieldError::invalid(
            "sameAsPresent",
            format!("expected a yes/no value, got '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_only_filled_fields_in_camel_case() {
        let mut fields = DraftFields::new();
        fields.full_name_english = Some("Rahim Khan".into());
        fields.gender = Some(Gender::Male);

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "fullNameEnglish": "Rahim Khan", "gender": "male" })
        );
    }

    #[test]
    fn deserializes_partial_form_data() {
        let json = r#"{"fatherName":"Karim Khan","sameAsPresent":true,"photo":{"name":"me.jpg"}}"#;
        let fields: DraftFields = serde_json::from_str(json).unwrap();

        assert_eq!(fields.father_name.as_deref(), Some("Karim Khan"));
        assert!(fields.same_as_present);
        assert_eq!(fields.photo, Some(FileHandle::named("me.jpg")));
        assert!(fields.mobile.is_none());
    }

    #[test]
    fn set_by_name_trims_and_clears() {
        let mut fields = DraftFields::new();
        fields.set_by_name("mobile", "  01711000000 ").unwrap();
        assert_eq!(fields.mobile.as_deref(), Some("01711000000"));

        fields.set_by_name("mobile", "   ").unwrap();
        assert!(fields.mobile.is_none());
    }

    #[test]
    fn set_by_name_parses_enums() {
        let mut fields = DraftFields::new();
        fields.set_by_name("gender", "Female").unwrap();
        fields.set_by_name("shift", "2nd").unwrap();
        fields.set_by_name("sameAsPresent", "yes").unwrap();

        assert_eq!(fields.gender, Some(Gender::Female));
        assert_eq!(fields.shift, Some(Shift::Day));
        assert!(fields.same_as_present);
    }

    #[test]
    fn set_by_name_rejects_bad_input_without_change() {
        let mut fields = DraftFields::new();
        fields.set_by_name("gender", "male").unwrap();

        let err = fields.set_by_name("gender", "unknown").unwrap_err();
        assert!(matches!(err, FieldError::InvalidValue { field: "gender", .. }));
        assert_eq!(fields.gender, Some(Gender::Male));

        let err = fields.set_by_name("favouriteColour", "blue").unwrap_err();
        assert_eq!(err, FieldError::UnknownField("favouriteColour".into()));
    }

    #[test]
    fn every_listed_name_is_settable() {
        for name in DraftFields::FIELD_NAMES {
            let value = match *name {
                "gender" => "male",
                "shift" => "morning",
                "sameAsPresent" => "true",
                _ => "x",
            };
            let mut fields = DraftFields::new();
            fields.set_by_name(name, value).unwrap();
            assert_eq!(fields.filled_count(), 1, "field {name}");
        }
    }

    #[test]
    fn filled_count_and_is_empty() {
        let mut fields = DraftFields::new();
        assert!(fields.is_empty());
        assert_eq!(fields.filled_count(), 0);

        fields.religion = Some("islam".into());
        fields.same_as_present = true;
        assert!(!fields.is_empty());
        assert_eq!(fields.filled_count(), 2);
    }
}
