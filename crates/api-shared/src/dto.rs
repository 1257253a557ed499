//! Wire models for the clinic REST API.
//!
//! Requests mirror the service drafts (all fields optional; required-field
//! validation happens inside core at save time, so a missing field surfaces
//! as a Validation error rather than a deserialization failure). Responses
//! are flat camelCase objects translated from core records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clinic_core::{Appointment, AppointmentDraft, JoinedAppointment, Patient, PatientDraft};
use clinic_docstore::Document;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /patients` and `PUT /patients/:id`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientUpsertReq {
    pub name: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    pub date_of_birth: Option<String>,
    /// One of `Male`, `Female`, `Other`.
    pub gender: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
}

impl From<PatientUpsertReq> for PatientDraft {
    fn from(req: PatientUpsertReq) -> Self {
        Self {
            name: req.name,
            date_of_birth: req.date_of_birth,
            gender: req.gender,
            contact: req.contact,
            address: req.address,
            medical_history: req.medical_history,
        }
    }
}

/// Body of `PATCH /patients/:id/address`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateAddressReq {
    pub address: Option<String>,
}

/// Body of `POST /appointments` and `PUT /appointments/:id`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentUpsertReq {
    /// Id of an existing patient.
    pub patient: Option<String>,
    pub doctor: Option<String>,
    /// ISO-8601 date or date-time, local wall-clock.
    pub date: Option<String>,
    pub reason: Option<String>,
    /// One of `Scheduled`, `Completed`, `Cancelled`; defaults to `Scheduled`
    /// on create.
    pub status: Option<String>,
}

impl From<AppointmentUpsertReq> for AppointmentDraft {
    fn from(req: AppointmentUpsertReq) -> Self {
        Self {
            patient: req.patient,
            doctor: req.doctor,
            date: req.date,
            reason: req.reason,
            status: req.status,
        }
    }
}

/// Query parameters of `GET /appointments/availability`.
///
/// Both parameters are required; they are optional here so that the handler
/// can reject an absent one with the contract's Validation message instead of
/// a generic extractor failure.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AvailabilityParams {
    pub doctor: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// A stored patient record.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRes {
    pub id: String,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub age: i32,
    pub gender: String,
    pub contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document<Patient>> for PatientRes {
    fn from(doc: Document<Patient>) -> Self {
        Self {
            id: doc.id.to_string(),
            name: doc.data.name,
            date_of_birth: doc.data.date_of_birth,
            age: doc.data.age,
            gender: doc.data.gender.as_str().to_owned(),
            contact: doc.data.contact,
            address: doc.data.address,
            medical_history: doc.data.medical_history,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// The patient subset attached to joined appointment reads.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatientSummaryRes {
    pub id: String,
    pub name: String,
    pub contact: String,
}

/// A stored appointment record, patient as a plain reference.
///
/// Returned by create/update, where no join is performed.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRes {
    pub id: String,
    pub patient: String,
    pub doctor: String,
    pub date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document<Appointment>> for AppointmentRes {
    fn from(doc: Document<Appointment>) -> Self {
        Self {
            id: doc.id.to_string(),
            patient: doc.data.patient.to_string(),
            doctor: doc.data.doctor,
            date: doc.data.date,
            reason: doc.data.reason,
            status: doc.data.status.as_str().to_owned(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// An appointment with its patient summary attached.
///
/// `patient` is `null` when the referenced patient no longer exists.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinedAppointmentRes {
    pub id: String,
    pub patient: Option<PatientSummaryRes>,
    pub doctor: String,
    pub date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JoinedAppointment> for JoinedAppointmentRes {
    fn from(joined: JoinedAppointment) -> Self {
        let doc = joined.appointment;
        Self {
            id: doc.id.to_string(),
            patient: joined.patient.map(|summary| PatientSummaryRes {
                id: summary.id.to_string(),
                name: summary.name,
                contact: summary.contact,
            }),
            doctor: doc.data.doctor,
            date: doc.data.date,
            reason: doc.data.reason,
            status: doc.data.status.as_str().to_owned(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Plain confirmation message (deletes).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

/// Response of the address-only patch.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AddressUpdatedRes {
    pub message: String,
    pub patient: PatientRes,
}

/// Response of the cancel transition.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancelledAppointmentRes {
    pub message: String,
    pub appointment: AppointmentRes,
}

/// Response of the availability query.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvailabilityRes {
    pub available: bool,
    pub message: String,
    /// Conflicting appointments; present only when unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointments: Option<Vec<JoinedAppointmentRes>>,
}

/// Error body: the underlying message, verbatim.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
}
