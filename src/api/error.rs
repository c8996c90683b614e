use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::types::Envelope;
use crate::{AppError, SessionError};

/// Converts [`AppError`] into an enveloped HTTP response.
///
/// The body is always the `status: 1` envelope carrying the error text.
/// Server faults are additionally logged at `error`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self(AppError::Session(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::MalformedRequest(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(_)
            | AppError::MalformedRequest(_)
            | AppError::PasswordMismatch
            | AppError::UserAlreadyExists => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::UserNotFound => StatusCode::UNAUTHORIZED,
            AppError::PasswordHashError
            | AppError::Session(_)
            | AppError::DatabaseError(_)
            | AppError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            log::error!(target: "agrosense::api", "msg=\"request failed\" error=\"{}\"", self.0);
        } else {
            log::debug!(target: "agrosense::api", "msg=\"request rejected\" error=\"{}\"", self.0);
        }

        (status, Envelope::error(self.0.to_string())).into_response()
    }
}
