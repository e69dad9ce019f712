use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::Secret;
use thiserror::Error;

use crate::domain::{
    action::{ActionPurpose, ActionState},
    identity::{AccessToken, Identity},
    message_ref::MessageRef,
    user::{StoredCredential, User, UserProfile},
    verify_request::VerifyRequest,
};

// IdentityProvider port trait and errors
#[derive(Debug, Error)]
pub enum IdentityProviderError {
    #[error("Invalid authorization state: {0}")]
    InvalidState(String),
    #[error("Authorization code exchange failed: {0}")]
    ExchangeFailed(String),
    #[error("Access token rejected: {0}")]
    Unauthorized(String),
    #[error("No identity provider is configured")]
    NotConfigured,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authorization URL whose state is bound to `purpose` and `subject`.
    fn generate_auth_link(
        &self,
        purpose: ActionPurpose,
        subject: &str,
    ) -> Result<String, IdentityProviderError>;
    fn decode_state(&self, state: &str) -> Result<ActionState, IdentityProviderError>;
    async fn exchange_code(
        &self,
        code: &str,
    ) -> Result<(Identity, AccessToken), IdentityProviderError>;
    async fn introspect(&self, token: &Secret<String>) -> Result<Identity, IdentityProviderError>;
}

// Notifier port trait and errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
    #[error("Channel rejected the call: {0}")]
    ChannelError(String),
}

/// A notification channel. Returned message references of `on_initiated` and
/// `on_sent` are ephemeral and get deleted once the request is terminal.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn on_initiated(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError>;
    async fn on_sent(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError>;
    async fn on_completed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError>;
    async fn on_failed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError>;

    async fn delete_ephemeral_artifact(&self, _artifact: &MessageRef) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn fetch_permanent_reference(
        &self,
        _artifact: &MessageRef,
    ) -> Result<Option<String>, NotifyError> {
        Ok(None)
    }
}

// ProfileDirectory port trait and errors
#[derive(Debug, Error)]
pub enum ProfileDirectoryError {
    #[error("No user found for {0}")]
    UserNotFound(String),
    #[error("Profile lookup failed: {0}")]
    LookupFailed(String),
}

/// Resolves a channel-specific user id to a profile.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn lookup(&self, external_id: &str) -> Result<UserProfile, ProfileDirectoryError>;
}

// TotpVerifier port trait and errors
#[derive(Debug, Error)]
pub enum TotpError {
    #[error("Invalid TOTP secret: {0}")]
    InvalidSecret(String),
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

#[derive(Debug, Clone)]
pub struct TotpEnrollment {
    pub secret: Secret<String>,
    pub provisioning_uri: String,
}

pub trait TotpVerifier: Send + Sync {
    fn enroll(&self, account: &str) -> Result<TotpEnrollment, TotpError>;
    fn provisioning_uri(&self, secret: &Secret<String>, account: &str) -> Result<String, TotpError>;
    /// Checks the code for the window containing `at` and its neighbours.
    /// Verification is stateless: a code may be replayed for as long as its
    /// window stays valid.
    fn verify(
        &self,
        secret: &Secret<String>,
        code: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, TotpError>;
}

// PublicKeyCeremony port trait and errors
#[derive(Debug, Error)]
pub enum CeremonyError {
    #[error("Invalid ceremony response: {0}")]
    InvalidResponse(String),
    #[error("Credential counter did not advance, possible cloned authenticator")]
    ReplayDetected,
    #[error("Corrupt ceremony state: {0}")]
    InvalidState(String),
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

/// Client options to hand to the browser and the server state to keep until
/// the finish step.
#[derive(Debug, Clone, PartialEq)]
pub struct CeremonyStart {
    pub options: serde_json::Value,
    pub state: serde_json::Value,
}

pub trait PublicKeyCeremony: Send + Sync {
    fn start_registration(&self, user: &User) -> Result<CeremonyStart, CeremonyError>;
    fn finish_registration(
        &self,
        user: &User,
        response: &serde_json::Value,
        state: &serde_json::Value,
    ) -> Result<StoredCredential, CeremonyError>;
    fn start_login(&self, user: &User) -> Result<CeremonyStart, CeremonyError>;
    /// Returns the user's credential list with updated counters.
    fn finish_login(
        &self,
        user: &User,
        response: &serde_json::Value,
        state: &serde_json::Value,
    ) -> Result<Vec<StoredCredential>, CeremonyError>;
}
