use chrono::Utc;
use veriflow_core::{
    CeremonyKind, PublicKeyCeremony, SessionChallenge, SessionChallengeStore, User, UserStore,
};

use crate::{
    directory::{ChallengePolicy, UserDirectory},
    error::VerificationError,
};

/// Passkey login use case - proves possession of a registered credential
pub struct PasskeyLoginUseCase<U, C, P>
where
    U: UserStore,
    C: SessionChallengeStore,
    P: PublicKeyCeremony,
{
    directory: UserDirectory<U, C>,
    ceremony: P,
    policy: ChallengePolicy,
}

impl<U, C, P> PasskeyLoginUseCase<U, C, P>
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

    #[tracing::instrument(
        name = "PasskeyLoginUseCase::begin",
        skip_all,
        fields(user_id = %actor.id())
    )]
    pub async fn begin(&self, actor: &User) -> Result<serde_json::Value, VerificationError> {
        let user = self.directory.get(actor.id()).await?;
        if user.credentials().is_empty() {
            return Err(VerificationError::NoCredentials);
        }

        let start = self.ceremony.start_login(&user)?;
        self.directory
            .store_challenge(SessionChallenge::new(
                user.id().clone(),
                CeremonyKind::Login,
                start.state,
                Utc::now(),
                self.policy.ttl,
            ))
            .await?;

        Ok(start.options)
    }

    /// Consumes the challenge, validates the assertion and stores the
    /// updated signature counters.
    #[tracing::instrument(
        name = "PasskeyLoginUseCase::finish",
        skip_all,
        fields(user_id = %actor.id())
    )]
    pub async fn finish(
        &self,
        actor: &User,
        response: &serde_json::Value,
    ) -> Result<(), VerificationError> {
        let challenge = self
            .directory
            .take_challenge(actor.id(), CeremonyKind::Login, Utc::now())
            .await?;
        let user = self.directory.get(actor.id()).await?;

        let credentials = self
            .ceremony
            .finish_login(&user, response, &challenge.state)
            .inspect_err(|e| tracing::warn!(error = %e, "Passkey assertion rejected"))?;

        self.directory
            .replace_credentials(user.id(), credentials)
            .await
    }

    /// Drop a pending login challenge without checking it.
    pub async fn abandon(&self, actor: &User) -> Result<(), VerificationError> {
        self.directory.discard_challenge(actor.id()).await
    }
}
