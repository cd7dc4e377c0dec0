//! Request-level errors.
//!
//! Handlers return `Result<T, AppError>`. Responses are plain text: the
//! message a user sees is the `Display` output of the variant.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::upload::UploadError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadGateway(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Upload(err) => match err {
                UploadError::NoFile | UploadError::NotPdf | UploadError::Malformed(_) => {
                    StatusCode::BAD_REQUEST
                }
                UploadError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
                UploadError::Backend(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Backend(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session store: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let message = match &self {
            Self::Backend(err) => err.message(),
            Self::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        };
        (status, message).into_response()
    }
}
