use chrono::{DateTime, Duration, Utc};
use secrecy::Secret;
use veriflow_core::{
    CeremonyKind, Email, Identity, SessionChallenge, SessionChallengeStore, StoredCredential,
    User, UserId, UserProfile, UserStore, UserStoreError,
};

use crate::error::VerificationError;

/// Lifetime of a public-key ceremony challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengePolicy {
    pub ttl: Duration,
}

impl Default for ChallengePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(300),
        }
    }
}

/// Owns every mutation of users and their session challenges.
#[derive(Clone)]
pub struct UserDirectory<U, C>
where
    U: UserStore,
    C: SessionChallengeStore,
{
    users: U,
    challenges: C,
}

impl<U, C> UserDirectory<U, C>
where
    U: UserStore,
    C: SessionChallengeStore,
{
    pub fn new(users: U, challenges: C) -> Self {
        Self { users, challenges }
    }

    pub async fn get(&self, id: &UserId) -> Result<User, VerificationError> {
        Ok(self.users.get_user(id).await?)
    }

    pub async fn find_by_email(&self, email: &Email) -> Result<User, VerificationError> {
        Ok(self.users.get_user_by_email(email).await?)
    }

    /// Create the user on first contact, otherwise refresh its profile.
    ///
    /// A user first seen under its e-mail keeps that id when it later shows
    /// up through a channel.
    #[tracing::instrument(
        name = "UserDirectory::ensure_user",
        skip_all,
        fields(user_id = %profile.id)
    )]
    pub async fn ensure_user(&self, profile: UserProfile) -> Result<User, VerificationError> {
        let existing = match self.users.get_user(&profile.id).await {
            Ok(user) => Some(user),
            Err(UserStoreError::UserNotFound) => {
                match self.users.get_user_by_email(&profile.email).await {
                    Ok(user) => Some(user),
                    Err(UserStoreError::UserNotFound) => None,
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        let user = match existing {
            Some(mut user) => {
                if user.profile().email == profile.email
                    && user.profile().name == profile.name
                    && user.profile().image == profile.image
                {
                    return Ok(user);
                }
                user.refresh_profile(profile);
                user
            }
            None => {
                tracing::info!("Registering new user");
                User::new(profile)
            }
        };

        self.users.save_user(user.clone()).await?;
        Ok(user)
    }

    /// Find the user bound to an authenticated identity, creating one keyed
    /// by e-mail when none exists.
    pub async fn ensure_user_for_identity(
        &self,
        identity: &Identity,
    ) -> Result<User, VerificationError> {
        match self.users.get_user_by_email(&identity.email).await {
            Ok(user) => Ok(user),
            Err(UserStoreError::UserNotFound) => {
                let user = User::new(UserProfile {
                    id: UserId::new(identity.email.as_str()),
                    email: identity.email.clone(),
                    name: identity
                        .name
                        .clone()
                        .unwrap_or_else(|| identity.email.to_string()),
                    image: None,
                });
                self.users.save_user(user.clone()).await?;
                Ok(user)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn enroll_second_factor(
        &self,
        id: &UserId,
        secret: Secret<String>,
    ) -> Result<User, VerificationError> {
        let mut user = self.users.get_user(id).await?;
        user.enroll_second_factor(secret);
        self.users.save_user(user.clone()).await?;
        Ok(user)
    }

    /// Returns true when this call validated the factor.
    pub async fn mark_second_factor_validated(
        &self,
        id: &UserId,
    ) -> Result<bool, VerificationError> {
        let mut user = self.users.get_user(id).await?;
        if !user.mark_second_factor_validated() {
            return Ok(false);
        }
        self.users.save_user(user).await?;
        Ok(true)
    }

    pub async fn add_credential(
        &self,
        id: &UserId,
        credential: StoredCredential,
    ) -> Result<User, VerificationError> {
        let mut user = self.users.get_user(id).await?;
        user.add_credential(credential);
        self.users.save_user(user.clone()).await?;
        Ok(user)
    }

    pub async fn replace_credentials(
        &self,
        id: &UserId,
        credentials: Vec<StoredCredential>,
    ) -> Result<(), VerificationError> {
        let mut user = self.users.get_user(id).await?;
        user.replace_credentials(credentials);
        self.users.save_user(user).await?;
        Ok(())
    }

    pub async fn store_challenge(
        &self,
        challenge: SessionChallenge,
    ) -> Result<(), VerificationError> {
        Ok(self.challenges.put_challenge(challenge).await?)
    }

    pub async fn discard_challenge(&self, id: &UserId) -> Result<(), VerificationError> {
        Ok(self.challenges.delete_challenge(id).await?)
    }

    /// Consume the user's challenge. The challenge is gone after this call,
    /// whatever is returned.
    pub async fn take_challenge(
        &self,
        id: &UserId,
        kind: CeremonyKind,
        now: DateTime<Utc>,
    ) -> Result<SessionChallenge, VerificationError> {
        let challenge = self
            .challenges
            .take_challenge(id)
            .await?
            .ok_or(VerificationError::ChallengeNotFound)?;

        if challenge.kind != kind {
            tracing::warn!(expected = ?kind, found = ?challenge.kind, "Challenge kind mismatch");
            return Err(VerificationError::ChallengeNotFound);
        }
        if challenge.is_expired(now) {
            return Err(VerificationError::ChallengeExpired);
        }
        Ok(challenge)
    }
}
