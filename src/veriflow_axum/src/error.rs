use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use veriflow_application::VerificationError;
use veriflow_core::{IdentityProviderError, VerifyRequestError};

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing token")]
    MissingToken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Verification rejected: {0}")]
    CeremonyRejected(String),

    #[error("Second factor verification failed")]
    SecondFactorFailed,

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            ApiError::InvalidInput(_) | ApiError::CeremonyRejected(_) => StatusCode::BAD_REQUEST,

            ApiError::MissingToken | ApiError::Unauthorized(_) | ApiError::SecondFactorFailed => {
                StatusCode::UNAUTHORIZED
            }

            ApiError::NotFound(_) => StatusCode::NOT_FOUND,

            ApiError::Conflict(_) => StatusCode::CONFLICT,

            ApiError::UnexpectedError(e) => {
                tracing::error!(error = %e, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status_code, body).into_response()
    }
}

impl From<VerificationError> for ApiError {
    fn from(error: VerificationError) -> Self {
        match error {
            VerificationError::Unauthorized(_) | VerificationError::IdentityResolution(_) => {
                ApiError::Unauthorized(error.to_string())
            }
            VerificationError::RequestNotFound | VerificationError::UserNotFound => {
                ApiError::NotFound(error.to_string())
            }
            VerificationError::InvalidInput(reason) => ApiError::InvalidInput(reason),
            VerificationError::SecondFactorNotEnrolled => ApiError::InvalidInput(error.to_string()),
            VerificationError::RequestClosed(_) | VerificationError::InvalidState(_) => {
                ApiError::Conflict(error.to_string())
            }
            VerificationError::SecondFactorFailed => ApiError::SecondFactorFailed,
            VerificationError::ChallengeNotFound
            | VerificationError::ChallengeExpired
            | VerificationError::ReplayDetected
            | VerificationError::NoCredentials
            | VerificationError::InvalidResponse(_) => {
                ApiError::CeremonyRejected(error.to_string())
            }
            VerificationError::RequestStore(_)
            | VerificationError::UserStore(_)
            | VerificationError::ChallengeStore(_)
            | VerificationError::IdentityProvider(_)
            | VerificationError::Totp(_)
            | VerificationError::Ceremony(_) => ApiError::UnexpectedError(error.to_string()),
        }
    }
}

impl From<VerifyRequestError> for ApiError {
    fn from(error: VerifyRequestError) -> Self {
        match error {
            VerifyRequestError::InvalidId(_) | VerifyRequestError::InvalidStatus(_) => {
                ApiError::InvalidInput(error.to_string())
            }
            VerifyRequestError::InvalidTransition { .. } | VerifyRequestError::NotPending(_) => {
                ApiError::Conflict(error.to_string())
            }
        }
    }
}

impl From<IdentityProviderError> for ApiError {
    fn from(error: IdentityProviderError) -> Self {
        VerificationError::from(error).into()
    }
}
