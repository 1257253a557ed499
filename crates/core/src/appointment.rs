//! Appointments and the appointment service.
//!
//! This module provides the booking side of the clinic domain:
//!
//! - The [`Appointment`] payload stored in the `appointments` collection
//! - Joined reads that enrich an appointment with a summary of its patient,
//!   computed at query time rather than stored
//! - The cancel transition with its already-cancelled guard
//! - The doctor-availability query over an inclusive calendar-day window
//!
//! Booking and availability are deliberately decoupled: creating an
//! appointment never consults availability, so two bookings for the same slot
//! both succeed. The generic update can likewise set any status, including
//! moving a record away from Cancelled without the guard.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use clinic_docstore::{Collection, DocStore, Document, RecordId};
use serde::{Deserialize, Serialize};

use crate::error::{ClinicError, ClinicResult};
use crate::patient::{Patient, PATIENTS_COLLECTION};

/// Collection name for appointment documents.
pub const APPOINTMENTS_COLLECTION: &str = "appointments";

/// Appointment lifecycle states.
///
/// The only guarded transition is Scheduled → Cancelled via
/// [`AppointmentService::cancel`]; Completed is reachable only through the
/// generic update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Parses the wire spelling (`Scheduled`, `Completed`, `Cancelled`).
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Validation`] for any other value.
    pub fn parse(input: &str) -> ClinicResult<Self> {
        match input {
            "Scheduled" => Ok(Self::Scheduled),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(ClinicError::Validation(format!(
                "status must be one of Scheduled, Completed, Cancelled, got '{other}'"
            ))),
        }
    }

    /// The wire spelling of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appointment payload stored in the `appointments` collection.
///
/// `patient` references a patient document by id; there is no back-reference
/// and deleting a patient does not cascade here. `date` is local wall-clock
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub patient: RecordId,
    pub doctor: String,
    pub date: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: AppointmentStatus,
}

/// Caller-supplied appointment fields, validated at save time.
///
/// All fields are optional so the same draft serves create (where
/// patient/doctor/date are required) and partial update. `status` defaults to
/// Scheduled when omitted at create.
#[derive(Debug, Clone, Default)]
pub struct AppointmentDraft {
    pub patient: Option<String>,
    pub doctor: Option<String>,
    pub date: Option<String>,
    pub reason: Option<String>,
    pub status: Option<String>,
}

/// The subset of patient fields attached to appointment reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientSummary {
    pub id: RecordId,
    pub name: String,
    pub contact: String,
}

/// An appointment enriched with its patient summary at query time.
///
/// `patient` is `None` when the referenced patient no longer exists (the
/// reference itself is preserved inside the appointment).
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedAppointment {
    pub appointment: Document<Appointment>,
    pub patient: Option<PatientSummary>,
}

/// Result of a doctor-availability query.
#[derive(Debug, Clone, PartialEq)]
pub struct Availability {
    pub available: bool,
    pub message: String,
    /// Conflicting Scheduled appointments; empty when available.
    pub conflicts: Vec<JoinedAppointment>,
}

/// Inclusive availability window for a calendar day:
/// `[00:00:00.000, 23:59:59.999]` in local wall-clock time.
pub fn day_window(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_hms_opt(0, 0, 0).expect("midnight is a valid time");
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .expect("end of day is a valid time");
    (start, end)
}

/// Appointment data operations over the document store - no API concerns.
#[derive(Clone)]
pub struct AppointmentService {
    appointments: Collection<Appointment>,
    patients: Collection<Patient>,
}

impl AppointmentService {
    /// Creates an appointment service over the given store.
    pub fn new(store: &DocStore) -> Self {
        Self {
            appointments: store.collection(APPOINTMENTS_COLLECTION),
            patients: store.collection(PATIENTS_COLLECTION),
        }
    }

    /// Returns all appointments in insertion order, each with its patient
    /// summary attached.
    pub fn list(&self) -> ClinicResult<Vec<JoinedAppointment>> {
        self.appointments
            .list()?
            .into_iter()
            .map(|doc| self.join(doc))
            .collect()
    }

    /// Fetches one appointment with its patient summary.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::NotFound`] if no appointment has this id.
    pub fn get(&self, id: &RecordId) -> ClinicResult<JoinedAppointment> {
        let doc = self
            .appointments
            .get(id)?
            .ok_or(ClinicError::NotFound("Appointment"))?;
        self.join(doc)
    }

    /// Books an appointment.
    ///
    /// Requires `patient` (the id of an existing patient), `doctor`, and
    /// `date`. `status` defaults to Scheduled when omitted. Availability is
    /// **not** checked: booking and the availability query are decoupled
    /// operations.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Validation`] if a required field is absent, the
    /// patient reference is ill-formed or does not resolve, or a supplied
    /// status/date does not parse.
    pub fn create(&self, draft: AppointmentDraft) -> ClinicResult<Document<Appointment>> {
        let patient = match draft.patient {
            Some(value) => self.resolve_patient_ref(&value)?,
            None => return Err(missing("patient")),
        };
        let doctor = required_text("doctor", draft.doctor)?;
        let date = match draft.date {
            Some(value) => parse_appointment_date(&value)?,
            None => return Err(missing("date")),
        };
        let status = match draft.status {
            Some(value) => AppointmentStatus::parse(&value)?,
            None => AppointmentStatus::Scheduled,
        };

        let appointment = Appointment {
            patient,
            doctor,
            date,
            reason: draft.reason,
            status,
        };
        Ok(self.appointments.insert(appointment)?)
    }

    /// Updates an appointment, replacing only the fields present in the
    /// draft.
    ///
    /// Note that `status` may be set to any value here, including moving a
    /// record away from Cancelled; only [`cancel`](Self::cancel) applies the
    /// state guard.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::NotFound`] if no appointment has this id, or
    /// [`ClinicError::Validation`] for an invalid field value.
    pub fn update(
        &self,
        id: &RecordId,
        draft: AppointmentDraft,
    ) -> ClinicResult<Document<Appointment>> {
        let existing = self
            .appointments
            .get(id)?
            .ok_or(ClinicError::NotFound("Appointment"))?;

        let mut current = existing.data;
        if let Some(patient) = draft.patient {
            current.patient = self.resolve_patient_ref(&patient)?;
        }
        if let Some(doctor) = draft.doctor {
            current.doctor = required_text("doctor", Some(doctor))?;
        }
        if let Some(date) = draft.date {
            current.date = parse_appointment_date(&date)?;
        }
        if let Some(reason) = draft.reason {
            current.reason = Some(reason);
        }
        if let Some(status) = draft.status {
            current.status = AppointmentStatus::parse(&status)?;
        }

        self.appointments
            .replace(id, current)?
            .ok_or(ClinicError::NotFound("Appointment"))
    }

    /// Cancels an appointment.
    ///
    /// The one guarded transition in the system: cancelling an
    /// already-cancelled appointment is rejected, not a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::NotFound`] if no appointment has this id, or
    /// [`ClinicError::InvalidState`] if it is already Cancelled.
    pub fn cancel(&self, id: &RecordId) -> ClinicResult<Document<Appointment>> {
        let doc = self
            .appointments
            .get(id)?
            .ok_or(ClinicError::NotFound("Appointment"))?;

        if doc.data.status == AppointmentStatus::Cancelled {
            return Err(ClinicError::InvalidState(
                "Appointment is already cancelled".into(),
            ));
        }

        let mut appointment = doc.data;
        appointment.status = AppointmentStatus::Cancelled;
        self.appointments
            .replace(id, appointment)?
            .ok_or(ClinicError::NotFound("Appointment"))
    }

    /// Hard-deletes an appointment.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::NotFound`] if no appointment has this id.
    pub fn delete(&self, id: &RecordId) -> ClinicResult<()> {
        if self.appointments.delete(id)? {
            Ok(())
        } else {
            Err(ClinicError::NotFound("Appointment"))
        }
    }

    /// Reports whether `doctor` is free on `date`.
    ///
    /// Scans Scheduled appointments for that doctor whose time falls inside
    /// the inclusive day window ([`day_window`]). Zero matches means
    /// available; otherwise the conflicting appointments are returned with
    /// patient summaries attached. Purely advisory: nothing stops a booking
    /// on a busy day.
    pub fn check_availability(&self, doctor: &str, date: NaiveDate) -> ClinicResult<Availability> {
        let (start, end) = day_window(date);
        let conflicts = self.appointments.find(|doc| {
            doc.data.doctor == doctor
                && doc.data.status == AppointmentStatus::Scheduled
                && doc.data.date >= start
                && doc.data.date <= end
        })?;

        if conflicts.is_empty() {
            return Ok(Availability {
                available: true,
                message: format!("{doctor} is available on {date}"),
                conflicts: Vec::new(),
            });
        }

        let joined = conflicts
            .into_iter()
            .map(|doc| self.join(doc))
            .collect::<ClinicResult<Vec<_>>>()?;
        Ok(Availability {
            available: false,
            message: format!("{doctor} has {} appointment(s) on {date}", joined.len()),
            conflicts: joined,
        })
    }

    /// Fetch-then-merge enrichment: attaches the referenced patient's summary
    /// if the patient still exists.
    fn join(&self, doc: Document<Appointment>) -> ClinicResult<JoinedAppointment> {
        let patient = self.patients.get(&doc.data.patient)?.map(|p| PatientSummary {
            id: p.id,
            name: p.data.name,
            contact: p.data.contact,
        });
        Ok(JoinedAppointment {
            appointment: doc,
            patient,
        })
    }

    fn resolve_patient_ref(&self, input: &str) -> ClinicResult<RecordId> {
        let id = RecordId::parse(input.trim())
            .map_err(|err| ClinicError::Validation(err.to_string()))?;
        if self.patients.get(&id)?.is_none() {
            return Err(ClinicError::Validation(format!("unknown patient: {id}")));
        }
        Ok(id)
    }
}

fn missing(field: &str) -> ClinicError {
    ClinicError::Validation(format!("{field} is required"))
}

fn required_text(field: &str, value: Option<String>) -> ClinicResult<String> {
    let value = value.ok_or_else(|| missing(field))?;
    clinic_types::NonEmptyText::new(&value)
        .map(clinic_types::NonEmptyText::into_string)
        .map_err(|_| ClinicError::Validation(format!("{field} cannot be empty")))
}

/// Parses an appointment date-time.
///
/// Accepts RFC 3339 (converted to local wall-clock time), a naive ISO-8601
/// date-time with or without seconds, or a bare date (booked at midnight).
fn parse_appointment_date(input: &str) -> ClinicResult<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&chrono::Local).naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).expect("midnight is a valid time"));
    }
    Err(ClinicError::Validation(format!(
        "date must be an ISO-8601 date or date-time, got '{input}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::{PatientDraft, PatientService};
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        patients: PatientService,
        appointments: AppointmentService,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().expect("tempdir");
        let store = DocStore::open(tmp.path().join("data")).expect("open store");
        Fixture {
            patients: PatientService::new(&store),
            appointments: AppointmentService::new(&store),
            _tmp: tmp,
        }
    }

    fn create_patient(fx: &Fixture, name: &str) -> RecordId {
        fx.patients
            .create(PatientDraft {
                name: Some(name.into()),
                date_of_birth: Some("1992-03-20".into()),
                gender: Some("Other".into()),
                contact: Some("0123 456 789".into()),
                ..PatientDraft::default()
            })
            .expect("create patient")
            .id
    }

    fn booking(patient: &RecordId, doctor: &str, date: &str) -> AppointmentDraft {
        AppointmentDraft {
            patient: Some(patient.to_string()),
            doctor: Some(doctor.into()),
            date: Some(date.into()),
            reason: Some("checkup".into()),
            status: None,
        }
    }

    #[test]
    fn create_defaults_status_to_scheduled() {
        let fx = fixture();
        let patient = create_patient(&fx, "Sarah Williams");
        let created = fx
            .appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-10T09:30:00"))
            .expect("create");
        assert_eq!(created.data.status, AppointmentStatus::Scheduled);
        assert_eq!(created.data.patient, patient);
    }

    #[test]
    fn create_requires_patient_doctor_and_date() {
        let fx = fixture();
        let patient = create_patient(&fx, "Sarah Williams");

        let mut no_patient = booking(&patient, "Dr. Smith", "2026-03-10T09:30:00");
        no_patient.patient = None;
        let mut no_doctor = booking(&patient, "Dr. Smith", "2026-03-10T09:30:00");
        no_doctor.doctor = None;
        let mut no_date = booking(&patient, "Dr. Smith", "2026-03-10T09:30:00");
        no_date.date = None;

        for draft in [no_patient, no_doctor, no_date] {
            let err = fx.appointments.create(draft).expect_err("missing field");
            assert!(matches!(err, ClinicError::Validation(_)));
        }
    }

    #[test]
    fn create_rejects_unresolvable_patient_reference() {
        let fx = fixture();
        let ghost = RecordId::new();
        let err = fx
            .appointments
            .create(booking(&ghost, "Dr. Smith", "2026-03-10T09:30:00"))
            .expect_err("unknown patient");
        assert!(matches!(err, ClinicError::Validation(_)));

        let mut malformed = booking(&ghost, "Dr. Smith", "2026-03-10T09:30:00");
        malformed.patient = Some("not-an-id".into());
        let err = fx.appointments.create(malformed).expect_err("bad id");
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[test]
    fn double_booking_the_same_slot_succeeds() {
        // Booking never consults availability: two appointments for the same
        // doctor and time are both accepted. Current behavior, not a defect.
        let fx = fixture();
        let patient = create_patient(&fx, "Sarah Williams");

        let first = fx
            .appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-10T09:30:00"))
            .expect("first booking");
        let second = fx
            .appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-10T09:30:00"))
            .expect("second booking");
        assert_ne!(first.id, second.id);

        let date = NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date");
        let availability = fx
            .appointments
            .check_availability("Dr. Smith", date)
            .expect("availability");
        assert!(!availability.available);
        assert_eq!(availability.conflicts.len(), 2);
    }

    #[test]
    fn cancel_sets_status_and_guards_repeat_cancels() {
        let fx = fixture();
        let patient = create_patient(&fx, "Sarah Williams");
        let created = fx
            .appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-10T09:30:00"))
            .expect("create");

        let cancelled = fx.appointments.cancel(&created.id).expect("cancel");
        assert_eq!(cancelled.data.status, AppointmentStatus::Cancelled);

        let err = fx
            .appointments
            .cancel(&created.id)
            .expect_err("repeat cancel");
        match err {
            ClinicError::InvalidState(message) => {
                assert_eq!(message, "Appointment is already cancelled");
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn generic_update_bypasses_the_cancel_guard() {
        // Source-observed inconsistency kept as-is: update may move a record
        // away from Cancelled without going through cancel.
        let fx = fixture();
        let patient = create_patient(&fx, "Sarah Williams");
        let created = fx
            .appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-10T09:30:00"))
            .expect("create");
        fx.appointments.cancel(&created.id).expect("cancel");

        let revived = fx
            .appointments
            .update(
                &created.id,
                AppointmentDraft {
                    status: Some("Scheduled".into()),
                    ..AppointmentDraft::default()
                },
            )
            .expect("update");
        assert_eq!(revived.data.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn update_rejects_status_outside_enumerated_set() {
        let fx = fixture();
        let patient = create_patient(&fx, "Sarah Williams");
        let created = fx
            .appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-10T09:30:00"))
            .expect("create");

        let err = fx
            .appointments
            .update(
                &created.id,
                AppointmentDraft {
                    status: Some("Postponed".into()),
                    ..AppointmentDraft::default()
                },
            )
            .expect_err("bad status");
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[test]
    fn operations_on_unknown_appointments_are_not_found() {
        let fx = fixture();
        let id = RecordId::new();
        assert!(matches!(
            fx.appointments.get(&id).expect_err("get"),
            ClinicError::NotFound("Appointment")
        ));
        assert!(matches!(
            fx.appointments.cancel(&id).expect_err("cancel"),
            ClinicError::NotFound("Appointment")
        ));
        assert!(matches!(
            fx.appointments.delete(&id).expect_err("delete"),
            ClinicError::NotFound("Appointment")
        ));
        assert!(matches!(
            fx.appointments
                .update(&id, AppointmentDraft::default())
                .expect_err("update"),
            ClinicError::NotFound("Appointment")
        ));
    }

    #[test]
    fn joined_reads_attach_patient_summary() {
        let fx = fixture();
        let patient = create_patient(&fx, "Sarah Williams");
        let created = fx
            .appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-10T09:30:00"))
            .expect("create");

        let joined = fx.appointments.get(&created.id).expect("get");
        let summary = joined.patient.expect("summary present");
        assert_eq!(summary.id, patient);
        assert_eq!(summary.name, "Sarah Williams");
        assert_eq!(summary.contact, "0123 456 789");
    }

    #[test]
    fn joined_reads_tolerate_deleted_patients() {
        let fx = fixture();
        let patient = create_patient(&fx, "Sarah Williams");
        let created = fx
            .appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-10T09:30:00"))
            .expect("create");

        fx.patients.delete(&patient).expect("delete patient");

        // The appointment survives with its reference intact; the summary is
        // simply absent.
        let joined = fx.appointments.get(&created.id).expect("get");
        assert!(joined.patient.is_none());
        assert_eq!(joined.appointment.data.patient, patient);
    }

    #[test]
    fn availability_reports_free_day() {
        let fx = fixture();
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date");
        let availability = fx
            .appointments
            .check_availability("Dr. Smith", date)
            .expect("availability");
        assert!(availability.available);
        assert_eq!(availability.message, "Dr. Smith is available on 2026-03-10");
        assert!(availability.conflicts.is_empty());
    }

    #[test]
    fn availability_counts_scheduled_appointments_in_window() {
        let fx = fixture();
        let patient = create_patient(&fx, "Sarah Williams");
        for time in ["2026-03-10T09:00:00", "2026-03-10T14:00:00"] {
            fx.appointments
                .create(booking(&patient, "Dr. Smith", time))
                .expect("create");
        }
        // Other doctors and other days do not count.
        fx.appointments
            .create(booking(&patient, "Dr. Jones", "2026-03-10T09:00:00"))
            .expect("create");
        fx.appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-11T09:00:00"))
            .expect("create");
        // Cancelled appointments do not count either.
        let cancelled = fx
            .appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-10T16:00:00"))
            .expect("create");
        fx.appointments.cancel(&cancelled.id).expect("cancel");

        let date = NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date");
        let availability = fx
            .appointments
            .check_availability("Dr. Smith", date)
            .expect("availability");
        assert!(!availability.available);
        assert_eq!(
            availability.message,
            "Dr. Smith has 2 appointment(s) on 2026-03-10"
        );
        assert_eq!(availability.conflicts.len(), 2);
    }

    #[test]
    fn availability_window_boundaries_are_inclusive_of_the_day_only() {
        let fx = fixture();
        let patient = create_patient(&fx, "Sarah Williams");

        // Last representable millisecond of the day counts.
        fx.appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-10T23:59:59.999"))
            .expect("create");
        // Midnight of the next day does not.
        fx.appointments
            .create(booking(&patient, "Dr. Smith", "2026-03-11T00:00:00"))
            .expect("create");

        let date = NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date");
        let availability = fx
            .appointments
            .check_availability("Dr. Smith", date)
            .expect("availability");
        assert_eq!(availability.conflicts.len(), 1);
        assert_eq!(
            availability.conflicts[0].appointment.data.date,
            NaiveDate::from_ymd_opt(2026, 3, 10)
                .expect("valid date")
                .and_hms_milli_opt(23, 59, 59, 999)
                .expect("valid time")
        );
    }

    #[test]
    fn day_window_spans_the_full_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date");
        let (start, end) = day_window(date);
        assert_eq!(start, date.and_hms_opt(0, 0, 0).expect("valid time"));
        assert_eq!(
            end,
            date.and_hms_milli_opt(23, 59, 59, 999).expect("valid time")
        );
        assert!(start < end);
    }

    #[test]
    fn appointment_dates_accept_common_iso_shapes() {
        assert_eq!(
            parse_appointment_date("2026-03-10T09:30").expect("minutes"),
            parse_appointment_date("2026-03-10T09:30:00").expect("seconds"),
        );
        let midnight = parse_appointment_date("2026-03-10").expect("bare date");
        assert_eq!(
            midnight,
            NaiveDate::from_ymd_opt(2026, 3, 10)
                .expect("valid date")
                .and_hms_opt(0, 0, 0)
                .expect("valid time")
        );
        assert!(parse_appointment_date("next tuesday").is_err());
    }
}
