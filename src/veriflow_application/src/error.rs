use thiserror::Error;
use veriflow_core::{
    CeremonyError, IdentityProviderError, ProfileDirectoryError, SessionChallengeStoreError,
    TotpError, UserStoreError, VerifyRequestError, VerifyRequestStoreError, VerifyStatus,
};

/// Errors surfaced by the verification workflow and the user directory.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Could not resolve identity: {0}")]
    IdentityResolution(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Verification request not found")]
    RequestNotFound,
    #[error("Verification request is already {0}")]
    RequestClosed(VerifyStatus),
    #[error("User not found")]
    UserNotFound,
    #[error("Second factor verification failed")]
    SecondFactorFailed,
    #[error("No validated authenticator is enrolled")]
    SecondFactorNotEnrolled,
    #[error("No pending challenge for this user")]
    ChallengeNotFound,
    #[error("Challenge expired")]
    ChallengeExpired,
    #[error("Credential replay detected")]
    ReplayDetected,
    #[error("No registered credentials")]
    NoCredentials,
    #[error("Invalid ceremony response: {0}")]
    InvalidResponse(String),
    #[error("Invalid state: {0}")]
    InvalidState(#[from] VerifyRequestError),
    #[error("Verification request store error: {0}")]
    RequestStore(VerifyRequestStoreError),
    #[error("User store error: {0}")]
    UserStore(UserStoreError),
    #[error("Challenge store error: {0}")]
    ChallengeStore(#[from] SessionChallengeStoreError),
    #[error("Identity provider error: {0}")]
    IdentityProvider(IdentityProviderError),
    #[error("TOTP error: {0}")]
    Totp(#[from] TotpError),
    #[error("Ceremony error: {0}")]
    Ceremony(CeremonyError),
}

impl From<VerifyRequestStoreError> for VerificationError {
    fn from(error: VerifyRequestStoreError) -> Self {
        match error {
            VerifyRequestStoreError::RequestNotFound => Self::RequestNotFound,
            other => Self::RequestStore(other),
        }
    }
}

impl From<UserStoreError> for VerificationError {
    fn from(error: UserStoreError) -> Self {
        match error {
            UserStoreError::UserNotFound => Self::UserNotFound,
            other => Self::UserStore(other),
        }
    }
}

impl From<IdentityProviderError> for VerificationError {
    fn from(error: IdentityProviderError) -> Self {
        match error {
            IdentityProviderError::InvalidState(_)
            | IdentityProviderError::ExchangeFailed(_)
            | IdentityProviderError::Unauthorized(_) => Self::Unauthorized(error.to_string()),
            other => Self::IdentityProvider(other),
        }
    }
}

impl From<ProfileDirectoryError> for VerificationError {
    fn from(error: ProfileDirectoryError) -> Self {
        Self::IdentityResolution(error.to_string())
    }
}

impl From<CeremonyError> for VerificationError {
    fn from(error: CeremonyError) -> Self {
        match error {
            CeremonyError::InvalidResponse(reason) => Self::InvalidResponse(reason),
            CeremonyError::ReplayDetected => Self::ReplayDetected,
            other => Self::Ceremony(other),
        }
    }
}
