use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Outcomes the rules layer can refuse a request with, mapped to the
/// status codes the HTTP contract promises. Absent rows on reads and
/// deletes are not errors and never pass through here.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input failed validation: shape, length, uniqueness, or a dangling
    /// account reference. Create and update endpoints answer 400.
    #[error("request rejected: {0}")]
    Rejected(&'static str),

    /// No account matches the supplied credentials.
    #[error("invalid credentials")]
    Unauthorized,

    /// The request could not be serviced at all (blocking pool failure).
    #[error("internal error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Rejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        status.into_response()
    }
}
