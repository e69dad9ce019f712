use chrono::Utc;
use veriflow_core::{
    CeremonyKind, PublicKeyCeremony, SessionChallenge, SessionChallengeStore, StoredCredential,
    User, UserStore,
};

use crate::{
    directory::{ChallengePolicy, UserDirectory},
    error::VerificationError,
};

/// Passkey registration use case - adds a public-key credential to a user
pub struct PasskeyRegistrationUseCase<U, C, P>
where
    U: UserStore,
    C: SessionChallengeStore,
    P: PublicKeyCeremony,
{
    directory: UserDirectory<U, C>,
    ceremony: P,
    policy: ChallengePolicy,
}

impl<U, C, P> PasskeyRegistrationUseCase<U, C, P>
where
    U: UserStore,
    C: SessionChallengeStore,
    P: PublicKeyCeremony,
{
    pub fn new(directory: UserDirectory<U, C>, ceremony: P, policy: ChallengePolicy) -> Self {
        Self {
            directory,
            ceremony,
            policy,
        }
    }

    /// Returns the creation options for the browser. Existing credentials
    /// are excluded. Replaces any pending challenge of the user.
    #[tracing::instrument(
        name = "PasskeyRegistrationUseCase::begin",
        skip_all,
        fields(user_id = %actor.id())
    )]
    pub async fn begin(&self, actor: &User) -> Result<serde_json::Value, VerificationError> {
        let user = self.directory.get(actor.id()).await?;
        let start = self.ceremony.start_registration(&user)?;

        self.directory
            .store_challenge(SessionChallenge::new(
                user.id().clone(),
                CeremonyKind::Registration,
                start.state,
                Utc::now(),
                self.policy.ttl,
            ))
            .await?;

        Ok(start.options)
    }

    /// The challenge is consumed before the response is checked, so a
    /// failed attempt cannot be retried against it.
    #[tracing::instrument(
        name = "PasskeyRegistrationUseCase::finish",
        skip_all,
        fields(user_id = %actor.id())
    )]
    pub async fn finish(
        &self,
        actor: &User,
        response: &serde_json::Value,
    ) -> Result<StoredCredential, VerificationError> {
        let challenge = self
            .directory
            .take_challenge(actor.id(), CeremonyKind::Registration, Utc::now())
            .await?;
        let user = self.directory.get(actor.id()).await?;

        let credential = self
            .ceremony
            .finish_registration(&user, response, &challenge.state)
            .inspect_err(|e| tracing::warn!(error = %e, "Passkey registration rejected"))?;

        self.directory
            .add_credential(user.id(), credential.clone())
            .await?;
        tracing::info!(credential_id = %credential.id, "Passkey registered");

        Ok(credential)
    }
}
