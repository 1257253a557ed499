//! Patient records and the patient service.
//!
//! This module provides the patient side of the clinic domain:
//!
//! - The [`Patient`] payload stored in the `patients` collection
//! - [`PatientDraft`] inputs validated at save time
//! - [`PatientService`] with create/read/update/delete, the address-only
//!   patch, and the birthday batch used by the scheduler
//!
//! The `age` field is derived: it is recomputed from `dateOfBirth` on every
//! save (see [`crate::age`]), so callers never supply it.

use std::fmt;

use chrono::{Local, NaiveDate};
use clinic_docstore::{Collection, DocStore, Document, RecordId};
use clinic_types::NonEmptyText;
use serde::{Deserialize, Serialize};

use crate::age::{age_on, birthday_matches};
use crate::error::{ClinicError, ClinicResult};

/// Collection name for patient documents.
pub const PATIENTS_COLLECTION: &str = "patients";

/// Patient gender, restricted to the enumerated set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Parses the wire spelling (`Male`, `Female`, `Other`).
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Validation`] for any other value.
    pub fn parse(input: &str) -> ClinicResult<Self> {
        match input {
            "Male" => Ok(Self::Male),
            "Female" => Ok(Self::Female),
            "Other" => Ok(Self::Other),
            other => Err(ClinicError::Validation(format!(
                "gender must be one of Male, Female, Other, got '{other}'"
            ))),
        }
    }

    /// The wire spelling of this gender.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Patient payload stored in the `patients` collection.
///
/// Identity and `createdAt`/`updatedAt` timestamps live on the store's
/// [`Document`] envelope, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub name: String,
    pub date_of_birth: NaiveDate,
    /// Derived from `date_of_birth`; recomputed on every save.
    pub age: i32,
    pub gender: Gender,
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
}

/// Caller-supplied patient fields, validated at save time.
///
/// All fields are optional so the same draft serves create (where
/// name/dateOfBirth/gender/contact are required) and partial update (where
/// only the provided fields change). Dates arrive as strings and are parsed
/// during validation.
#[derive(Debug, Clone, Default)]
pub struct PatientDraft {
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
}

/// Outcome of one run of the birthday age-refresh batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgeRefreshReport {
    /// Patients whose birth month/day matched the run date.
    pub matched: usize,
    /// Patients whose record was rewritten with a fresh age.
    pub updated: usize,
    /// Patients whose individual save failed; the batch continued past them.
    pub failed: usize,
}

/// Patient data operations over the document store - no API concerns.
#[derive(Clone)]
pub struct PatientService {
    patients: Collection<Patient>,
}

impl PatientService {
    /// Creates a patient service over the given store.
    pub fn new(store: &DocStore) -> Self {
        Self {
            patients: store.collection(PATIENTS_COLLECTION),
        }
    }

    /// Returns all patient records in insertion order.
    pub fn list(&self) -> ClinicResult<Vec<Document<Patient>>> {
        Ok(self.patients.list()?)
    }

    /// Fetches one patient record.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::NotFound`] if no patient has this id.
    pub fn get(&self, id: &RecordId) -> ClinicResult<Document<Patient>> {
        self.patients.get(id)?.ok_or(ClinicError::NotFound("Patient"))
    }

    /// Creates a patient record.
    ///
    /// Validates the required fields (`name`, `dateOfBirth`, `gender`,
    /// `contact`), parses the date of birth, and computes `age` as of today
    /// before persisting.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Validation`] if a required field is absent or
    /// invalid, or [`ClinicError::Storage`] if the write fails.
    pub fn create(&self, draft: PatientDraft) -> ClinicResult<Document<Patient>> {
        let name = required_text("name", draft.name)?;
        let date_of_birth = match draft.date_of_birth {
            Some(value) => parse_birth_date(&value)?,
            None => return Err(missing("dateOfBirth")),
        };
        let gender = match draft.gender {
            Some(value) => Gender::parse(&value)?,
            None => return Err(missing("gender")),
        };
        let contact = required_text("contact", draft.contact)?;

        let patient = Patient {
            name: name.into_string(),
            date_of_birth,
            age: age_on(date_of_birth, Local::now().date_naive()),
            gender,
            contact: contact.into_string(),
            address: draft.address,
            medical_history: draft.medical_history,
        };
        Ok(self.patients.insert(patient)?)
    }

    /// Updates a patient record, replacing only the fields present in the
    /// draft and re-validating them. `age` is recomputed on every save,
    /// whether or not `dateOfBirth` changed.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::NotFound`] if no patient has this id, or
    /// [`ClinicError::Validation`] for an invalid field value.
    pub fn update(&self, id: &RecordId, draft: PatientDraft) -> ClinicResult<Document<Patient>> {
        let existing = self.get(id)?;
        let merged = apply_draft(existing.data, draft)?;
        self.patients
            .replace(id, merged)?
            .ok_or(ClinicError::NotFound("Patient"))
    }

    /// Patches only the patient's address.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Validation`] if the address is absent or empty,
    /// and [`ClinicError::NotFound`] if no patient has this id.
    pub fn update_address(
        &self,
        id: &RecordId,
        address: Option<String>,
    ) -> ClinicResult<Document<Patient>> {
        let address = address
            .as_deref()
            .and_then(|a| NonEmptyText::new(a).ok())
            .ok_or_else(|| ClinicError::validation("Address is required"))?;

        let mut patient = self.get(id)?.data;
        patient.address = Some(address.into_string());
        patient.age = age_on(patient.date_of_birth, Local::now().date_naive());
        self.patients
            .replace(id, patient)?
            .ok_or(ClinicError::NotFound("Patient"))
    }

    /// Hard-deletes a patient record.
    ///
    /// Appointments referencing the patient are left in place; joined reads
    /// render their patient summary as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::NotFound`] if no patient has this id.
    pub fn delete(&self, id: &RecordId) -> ClinicResult<()> {
        if self.patients.delete(id)? {
            Ok(())
        } else {
            Err(ClinicError::NotFound("Patient"))
        }
    }

    /// Recomputes the age of every patient whose birthday is `today`.
    ///
    /// This is the batch the daily scheduler runs. Each per-patient save has
    /// its own failure boundary: a failing save is logged and counted, and
    /// the batch continues with the remaining patients.
    ///
    /// Running the batch twice on the same date is idempotent - the second
    /// run recomputes the same ages.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Storage`] only if the initial scan fails;
    /// individual save failures are reported via [`AgeRefreshReport::failed`].
    pub fn refresh_birthday_ages(&self, today: NaiveDate) -> ClinicResult<AgeRefreshReport> {
        let birthdays = self
            .patients
            .find(|doc| birthday_matches(doc.data.date_of_birth, today))?;

        let mut report = AgeRefreshReport {
            matched: birthdays.len(),
            ..AgeRefreshReport::default()
        };

        for doc in birthdays {
            let mut patient = doc.data;
            patient.age = age_on(patient.date_of_birth, today);
            match self.patients.replace(&doc.id, patient) {
                Ok(Some(updated)) => {
                    report.updated += 1;
                    tracing::info!(
                        patient = %doc.id,
                        name = %updated.data.name,
                        age = updated.data.age,
                        "refreshed patient age"
                    );
                }
                Ok(None) => {
                    // Deleted between the scan and the save; nothing to refresh.
                    tracing::debug!(patient = %doc.id, "patient vanished during age refresh");
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(patient = %doc.id, error = %err, "failed to refresh patient age");
                }
            }
        }

        Ok(report)
    }
}

fn missing(field: &str) -> ClinicError {
    ClinicError::Validation(format!("{field} is required"))
}

fn required_text(field: &str, value: Option<String>) -> ClinicResult<NonEmptyText> {
    let value = value.ok_or_else(|| missing(field))?;
    NonEmptyText::new(&value)
        .map_err(|_| ClinicError::Validation(format!("{field} cannot be empty")))
}

fn parse_birth_date(input: &str) -> ClinicResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        ClinicError::Validation(format!(
            "dateOfBirth must be a calendar date (YYYY-MM-DD), got '{input}'"
        ))
    })
}

fn apply_draft(mut current: Patient, draft: PatientDraft) -> ClinicResult<Patient> {
    if let Some(name) = draft.name {
        current.name = required_text("name", Some(name))?.into_string();
    }
    if let Some(date_of_birth) = draft.date_of_birth {
        current.date_of_birth = parse_birth_date(&date_of_birth)?;
    }
    if let Some(gender) = draft.gender {
        current.gender = Gender::parse(&gender)?;
    }
    if let Some(contact) = draft.contact {
        current.contact = required_text("contact", Some(contact))?.into_string();
    }
    if let Some(address) = draft.address {
        current.address = Some(address);
    }
    if let Some(medical_history) = draft.medical_history {
        current.medical_history = Some(medical_history);
    }
    current.age = age_on(current.date_of_birth, Local::now().date_naive());
    Ok(current)
}
