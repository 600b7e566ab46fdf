use serde::Serialize;

/// Errors surfaced by the fulfillment services.
///
/// Fatal pipeline failures (validation, stock shortfall) use dedicated
/// variants so callers can stop before any write occurs; everything the
/// backend or transport can throw maps onto the remaining variants. Non-fatal
/// stage failures are *not* errors; they travel as
/// [`crate::services::pipeline::SubmissionWarning`]s instead.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// The backend answered with a non-success status code.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// A response body did not match the envelope the endpoint family uses.
    #[error("Unexpected response shape from {endpoint}: {detail}")]
    UnexpectedShape {
        endpoint: &'static str,
        detail: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local cart persistence failed (read or write).
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Document render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

impl ServiceError {
    /// True for failures that must stop the submission pipeline before any
    /// further write: local validation and an authoritative stock shortfall.
    pub fn is_fatal_for_submission(&self) -> bool {
        matches!(
            self,
            ServiceError::ValidationError(_) | ServiceError::InsufficientStock(_)
        )
    }
}

/// Wire-level error body some endpoints return alongside a non-2xx status.
#[derive(Debug, Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}
