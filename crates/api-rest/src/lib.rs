//! # API REST
//!
//! REST API implementation for the clinic administration service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status mapping)
//!
//! Uses `api-shared` for wire models and the health service. The binary that
//! serves this router lives in the workspace root crate.

#![warn(rust_2018_idioms)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::NaiveDate;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    AddressUpdatedRes, AppointmentRes, AppointmentUpsertReq, AvailabilityParams, AvailabilityRes,
    CancelledAppointmentRes, ErrorRes, HealthRes, HealthService, JoinedAppointmentRes, MessageRes,
    PatientRes, PatientSummaryRes, PatientUpsertReq, UpdateAddressReq,
};
use clinic_core::{AppointmentService, ClinicError, PatientService};
use clinic_docstore::DocStore;
use clinic_uuid::RecordId;

/// Application state shared across REST API handlers.
///
/// Holds the domain services; both are cheap clones over the same store.
#[derive(Clone)]
pub struct AppState {
    pub patients: PatientService,
    pub appointments: AppointmentService,
}

impl AppState {
    /// Builds the state over an opened store.
    pub fn new(store: &DocStore) -> Self {
        Self {
            patients: PatientService::new(store),
            appointments: AppointmentService::new(store),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        create_patient,
        get_patient,
        update_patient,
        delete_patient,
        update_patient_address,
        list_appointments,
        create_appointment,
        get_appointment,
        update_appointment,
        delete_appointment,
        cancel_appointment,
        check_availability
    ),
    components(schemas(
        HealthRes,
        PatientUpsertReq,
        UpdateAddressReq,
        AppointmentUpsertReq,
        PatientRes,
        PatientSummaryRes,
        AppointmentRes,
        JoinedAppointmentRes,
        MessageRes,
        AddressUpdatedRes,
        CancelledAppointmentRes,
        AvailabilityRes,
        ErrorRes
    ))
)]
struct ApiDoc;

/// Builds the clinic REST router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/patients/:id/address", patch(update_patient_address))
        .route("/appointments/availability", get(check_availability))
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route(
            "/appointments/:id",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/appointments/:id/cancel", patch(cancel_appointment))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error wrapper mapping the core taxonomy onto HTTP statuses.
///
/// Validation and invalid-state failures are client errors (400), missing
/// records are 404, storage failures are 500. The underlying message is
/// passed through verbatim as `{"message": …}`.
struct ApiError(ClinicError);

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ClinicError::Validation(_) | ClinicError::InvalidState(_) => StatusCode::BAD_REQUEST,
            ClinicError::NotFound(_) => StatusCode::NOT_FOUND,
            ClinicError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorRes {
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Path ids must be canonical record ids; anything else is a client error.
fn parse_id(raw: &str) -> ApiResult<RecordId> {
    RecordId::parse(raw).map_err(|err| ApiError(ClinicError::Validation(err.to_string())))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Health check response", body = HealthRes))
)]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patient records", body = [PatientRes]),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
async fn list_patients(State(state): State<AppState>) -> ApiResult<Json<Vec<PatientRes>>> {
    let patients = state.patients.list()?;
    Ok(Json(patients.into_iter().map(PatientRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = PatientUpsertReq,
    responses(
        (status = 201, description = "Patient created", body = PatientRes),
        (status = 400, description = "Missing or invalid field", body = ErrorRes)
    )
)]
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<PatientUpsertReq>,
) -> ApiResult<(StatusCode, Json<PatientRes>)> {
    let created = state.patients.create(req.into())?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient record id")),
    responses(
        (status = 200, description = "Patient record", body = PatientRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PatientRes>> {
    let patient = state.patients.get(&parse_id(&id)?)?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient record id")),
    request_body = PatientUpsertReq,
    responses(
        (status = 200, description = "Patient updated", body = PatientRes),
        (status = 400, description = "Invalid field", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PatientUpsertReq>,
) -> ApiResult<Json<PatientRes>> {
    let updated = state.patients.update(&parse_id(&id)?, req.into())?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    patch,
    path = "/patients/{id}/address",
    params(("id" = String, Path, description = "Patient record id")),
    request_body = UpdateAddressReq,
    responses(
        (status = 200, description = "Address updated", body = AddressUpdatedRes),
        (status = 400, description = "Address missing or empty", body = ErrorRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
async fn update_patient_address(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAddressReq>,
) -> ApiResult<Json<AddressUpdatedRes>> {
    let updated = state.patients.update_address(&parse_id(&id)?, req.address)?;
    Ok(Json(AddressUpdatedRes {
        message: "Address updated successfully".into(),
        patient: updated.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient record id")),
    responses(
        (status = 200, description = "Patient deleted", body = MessageRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageRes>> {
    state.patients.delete(&parse_id(&id)?)?;
    Ok(Json(MessageRes {
        message: "Patient deleted".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/appointments",
    responses(
        (status = 200, description = "All appointments with patient summaries", body = [JoinedAppointmentRes]),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
async fn list_appointments(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<JoinedAppointmentRes>>> {
    let appointments = state.appointments.list()?;
    Ok(Json(
        appointments
            .into_iter()
            .map(JoinedAppointmentRes::from)
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = AppointmentUpsertReq,
    responses(
        (status = 201, description = "Appointment created", body = AppointmentRes),
        (status = 400, description = "Missing or invalid field", body = ErrorRes)
    )
)]
async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<AppointmentUpsertReq>,
) -> ApiResult<(StatusCode, Json<AppointmentRes>)> {
    let created = state.appointments.create(req.into())?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment record id")),
    responses(
        (status = 200, description = "Appointment with patient summary", body = JoinedAppointmentRes),
        (status = 404, description = "Appointment not found", body = ErrorRes)
    )
)]
async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JoinedAppointmentRes>> {
    let appointment = state.appointments.get(&parse_id(&id)?)?;
    Ok(Json(appointment.into()))
}

#[utoipa::path(
    put,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment record id")),
    request_body = AppointmentUpsertReq,
    responses(
        (status = 200, description = "Appointment updated", body = AppointmentRes),
        (status = 400, description = "Invalid field", body = ErrorRes),
        (status = 404, description = "Appointment not found", body = ErrorRes)
    )
)]
async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AppointmentUpsertReq>,
) -> ApiResult<Json<AppointmentRes>> {
    let updated = state.appointments.update(&parse_id(&id)?, req.into())?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    patch,
    path = "/appointments/{id}/cancel",
    params(("id" = String, Path, description = "Appointment record id")),
    responses(
        (status = 200, description = "Appointment cancelled", body = CancelledAppointmentRes),
        (status = 400, description = "Already cancelled", body = ErrorRes),
        (status = 404, description = "Appointment not found", body = ErrorRes)
    )
)]
async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CancelledAppointmentRes>> {
    let cancelled = state.appointments.cancel(&parse_id(&id)?)?;
    Ok(Json(CancelledAppointmentRes {
        message: "Appointment cancelled successfully".into(),
        appointment: cancelled.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment record id")),
    responses(
        (status = 200, description = "Appointment deleted", body = MessageRes),
        (status = 404, description = "Appointment not found", body = ErrorRes)
    )
)]
async fn delete_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageRes>> {
    state.appointments.delete(&parse_id(&id)?)?;
    Ok(Json(MessageRes {
        message: "Appointment deleted".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/appointments/availability",
    params(AvailabilityParams),
    responses(
        (status = 200, description = "Availability for the doctor on the date", body = AvailabilityRes),
        (status = 400, description = "Missing doctor or date", body = ErrorRes)
    )
)]
async fn check_availability(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> ApiResult<Json<AvailabilityRes>> {
    let (Some(doctor), Some(date_raw)) = (params.doctor, params.date) else {
        return Err(ApiError(ClinicError::Validation(
            "doctor and date query params are required".into(),
        )));
    };
    if doctor.trim().is_empty() || date_raw.trim().is_empty() {
        return Err(ApiError(ClinicError::Validation(
            "doctor and date query params are required".into(),
        )));
    }
    let date = NaiveDate::parse_from_str(date_raw.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError(ClinicError::Validation(format!(
            "date must be a calendar date (YYYY-MM-DD), got '{date_raw}'"
        )))
    })?;

    let availability = state.appointments.check_availability(&doctor, date)?;
    let appointments = if availability.available {
        None
    } else {
        Some(
            availability
                .conflicts
                .into_iter()
                .map(JoinedAppointmentRes::from)
                .collect(),
        )
    };
    Ok(Json(AvailabilityRes {
        available: availability.available,
        message: availability.message,
        appointments,
    }))
}
