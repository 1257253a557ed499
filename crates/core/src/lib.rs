//! # Clinic Core
//!
//! Core business logic for the clinic administration system.
//!
//! This crate contains pure domain operations over the document store:
//! - Patient records: create/read/update/delete, address patching, and the
//!   derived-age invariant
//! - Appointments: booking, cancellation with its state guard, and the
//!   doctor-availability query
//! - The daily age-refresh scheduler
//!
//! **No API concerns**: HTTP servers, wire models, or service interfaces
//! belong in `api-rest` and `api-shared`.

pub mod age;
pub mod appointment;
pub mod config;
pub mod error;
pub mod patient;
pub mod scheduler;

pub use appointment::{
    Appointment, AppointmentDraft, AppointmentService, AppointmentStatus, Availability,
    JoinedAppointment, PatientSummary,
};
pub use config::CoreConfig;
pub use error::{ClinicError, ClinicResult};
pub use patient::{AgeRefreshReport, Gender, Patient, PatientDraft, PatientService};
pub use scheduler::{AgeRefreshScheduler, SchedulerHandle};
