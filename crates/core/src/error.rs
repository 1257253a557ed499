use clinic_docstore::DocStoreError;

/// Error taxonomy for clinic service operations.
///
/// Every service operation either returns its result or fails with one of
/// these kinds. The API layer maps them onto HTTP statuses
/// (Validation/InvalidState → 400, NotFound → 404, Storage → 500) and passes
/// the message through verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    /// A required field is absent or a supplied value is outside its domain.
    #[error("{0}")]
    Validation(String),
    /// The referenced record does not exist. The payload is the entity name
    /// ("Patient", "Appointment").
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The operation is not legal in the record's current state, e.g.
    /// cancelling an already-cancelled appointment.
    #[error("{0}")]
    InvalidState(String),
    /// The persistence layer failed.
    #[error("{0}")]
    Storage(#[from] DocStoreError),
}

impl ClinicError {
    /// Shorthand for a validation failure with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type for clinic service operations.
pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
