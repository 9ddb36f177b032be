//! # Error Handling Middleware
//!
//! Maps domain errors to HTTP status codes and the shared `{success:false,
//! message}` envelope, so every failure looks the same to the client
//! whichever layer produced it.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use classbook_core::errors::ScheduleError;
use tracing::error;

use crate::response::ApiResponse;

/// Application error wrapper that provides HTTP status code mapping
///
/// Wraps [`ScheduleError`] so handlers can use `?` on scheduling calls and
/// still produce an enveloped response.
///
/// ```
/// use classbook_api::middleware::error_handling::AppError;
/// use classbook_core::errors::ScheduleError;
///
/// fn lookup(id: i64) -> Result<(), AppError> {
///     Err(ScheduleError::NotFound(format!("Schedule with ID {id} not found")).into())
/// }
/// # assert!(lookup(7).is_err());
/// ```
#[derive(Debug)]
pub struct AppError(pub ScheduleError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ScheduleError::NotFound(_) => StatusCode::NOT_FOUND,
            ScheduleError::Validation(_) => StatusCode::BAD_REQUEST,
            ScheduleError::Conflict(_) => StatusCode::BAD_REQUEST,
            ScheduleError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ScheduleError::Tenant(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ScheduleError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ScheduleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage failures keep their detail in the log only.
        let message = match &self.0 {
            ScheduleError::Database(_) | ScheduleError::Internal(_) => {
                error!("Request failed: {:?}", self.0);
                "Internal server error".to_string()
            }
            err if status.is_server_error() => {
                error!("Request failed: {}", err);
                err.to_string()
            }
            err => err.to_string(),
        };

        ApiResponse::failure(message).with_status(status)
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(ScheduleError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(ScheduleError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError(ScheduleError::Validation(rejection.body_text()))
    }
}
