//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ErrorKind};
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request the domain never saw.
    BadRequest(String),
    /// Domain rejection or failure.
    Domain(DomainError),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

/// Maps a domain error kind onto its HTTP status.
///
/// Business conflicts are reported as 400 like any other rejected request.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ValidationFailed
        | ErrorKind::ConflictOpenReceptionExists
        | ErrorKind::NoOpenReception
        | ErrorKind::NothingToRemove => StatusCode::BAD_REQUEST,
        ErrorKind::StoreUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Cancelled => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => {
                let kind = err.kind();
                let status = status_for(kind);
                if status.is_server_error() {
                    tracing::error!(error = %err, %kind, "request failed");
                }
                let message = match kind {
                    ErrorKind::StoreUnavailable => "internal server error".to_string(),
                    _ => err.to_string(),
                };
                (status, message)
            }
        };

        (status, axum::Json(ErrorBody { message })).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query: {}", rejection.body_text()))
    }
}
