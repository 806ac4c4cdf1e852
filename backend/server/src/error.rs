use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("You cannot vouch for yourself")]
    SelfVouch,

    #[error("Users with negative reputation cannot vouch")]
    VouchingForbidden,

    /// Store refused the vouch. Carries the message shown to the user.
    #[error("{0}")]
    Rejected(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Other(error) => AppError::InternalError(error),
            rejection => AppError::Rejected(rejection.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedPayload(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload { .. } | AppError::SelfVouch => StatusCode::BAD_REQUEST,
            AppError::VouchingForbidden => StatusCode::FORBIDDEN,
            AppError::Rejected { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
