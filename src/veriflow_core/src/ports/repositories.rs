use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    email::Email,
    message_ref::MessageRef,
    session_challenge::SessionChallenge,
    user::{User, UserId},
    verify_request::{VerifyRequest, VerifyRequestId, VerifyStatus},
};

// UserStore port trait and errors
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("User not found")]
    UserNotFound,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for UserStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::UserNotFound, Self::UserNotFound)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert or replace the user keyed by its id.
    async fn save_user(&self, user: User) -> Result<(), UserStoreError>;
    async fn get_user(&self, id: &UserId) -> Result<User, UserStoreError>;
    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError>;
}

// VerifyRequestStore port trait and errors
#[derive(Debug, Error)]
pub enum VerifyRequestStoreError {
    #[error("Verification request not found")]
    RequestNotFound,
    #[error("Verification request already exists")]
    RequestAlreadyExists,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for VerifyRequestStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::RequestNotFound, Self::RequestNotFound)
                | (Self::RequestAlreadyExists, Self::RequestAlreadyExists)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Applied,
    /// The stored status differed from the expected one. Carries the stored
    /// request as it is now.
    Rejected(Box<VerifyRequest>),
}

#[async_trait]
pub trait VerifyRequestStore: Send + Sync {
    async fn insert_request(&self, request: VerifyRequest) -> Result<(), VerifyRequestStoreError>;
    async fn get_request(&self, id: &VerifyRequestId)
    -> Result<VerifyRequest, VerifyRequestStoreError>;
    /// Requests created by the given requestor, newest first.
    async fn list_by_requestor(
        &self,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError>;
    /// Requests addressed to the given recipient, newest first.
    async fn list_by_recipient(
        &self,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError>;
    /// Replace the stored request only if its stored status is `expected`.
    ///
    /// Artifacts and permalink are kept from the stored copy.
    async fn update_if_status(
        &self,
        expected: VerifyStatus,
        request: &VerifyRequest,
    ) -> Result<StatusUpdate, VerifyRequestStoreError>;
    async fn attach_artifacts(
        &self,
        id: &VerifyRequestId,
        artifacts: Vec<MessageRef>,
    ) -> Result<(), VerifyRequestStoreError>;
    async fn set_permalink(
        &self,
        id: &VerifyRequestId,
        permalink: String,
    ) -> Result<(), VerifyRequestStoreError>;
}

// SessionChallengeStore port trait and errors
#[derive(Debug, Error)]
pub enum SessionChallengeStoreError {
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

#[async_trait]
pub trait SessionChallengeStore: Send + Sync {
    /// Store the challenge, replacing any live challenge of the same user.
    async fn put_challenge(
        &self,
        challenge: SessionChallenge,
    ) -> Result<(), SessionChallengeStoreError>;
    /// Atomically remove and return the user's challenge.
    async fn take_challenge(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SessionChallenge>, SessionChallengeStoreError>;
    async fn delete_challenge(&self, user_id: &UserId) -> Result<(), SessionChallengeStoreError>;
}
