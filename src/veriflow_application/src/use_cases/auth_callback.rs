use veriflow_core::{
    AccessToken, ActionPurpose, FailureReason, IdentityProvider, Party, ProfileDirectory,
    SessionChallengeStore, User, UserId, UserStore, VerifyRequestId, VerifyRequestStore,
    VerifyStatus,
};

use crate::{
    directory::UserDirectory, error::VerificationError, transitions::RequestTransitions,
};

/// Where the browser goes after a successful callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackDestination {
    Home,
    Configure(UserId),
    Request(VerifyRequestId),
}

#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub destination: CallbackDestination,
    pub access_token: AccessToken,
    pub user: User,
}

/// Auth callback use case - handles the identity provider redirect for every
/// link purpose
pub struct AuthCallbackUseCase<I, R, U, C, D>
where
    I: IdentityProvider,
    R: VerifyRequestStore,
    U: UserStore,
    C: SessionChallengeStore,
    D: ProfileDirectory,
{
    identity_provider: I,
    transitions: RequestTransitions<R>,
    directory: UserDirectory<U, C>,
    profiles: D,
}

impl<I, R, U, C, D> AuthCallbackUseCase<I, R, U, C, D>
where
    I: IdentityProvider,
    R: VerifyRequestStore,
    U: UserStore,
    C: SessionChallengeStore,
    D: ProfileDirectory,
{
    pub fn new(
        identity_provider: I,
        transitions: RequestTransitions<R>,
        directory: UserDirectory<U, C>,
        profiles: D,
    ) -> Self {
        Self {
            identity_provider,
            transitions,
            directory,
            profiles,
        }
    }

    #[tracing::instrument(name = "AuthCallbackUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        code: &str,
        state: &str,
    ) -> Result<CallbackOutcome, VerificationError> {
        let state = self.identity_provider.decode_state(state)?;
        let (identity, access_token) = self.identity_provider.exchange_code(code).await?;
        tracing::info!(
            purpose = %state.purpose,
            email = %identity.email,
            "Identity provider callback"
        );

        let (destination, user) = match state.purpose {
            ActionPurpose::Login => {
                let user = self.directory.ensure_user_for_identity(&identity).await?;
                (CallbackDestination::Home, user)
            }
            ActionPurpose::Configure => {
                let user = self.configured_user(&state.subject).await?;
                if user.email() != &identity.email {
                    tracing::warn!(
                        user_id = %user.id(),
                        expected = %user.email(),
                        actual = %identity.email,
                        "Configure link used by another identity"
                    );
                    return Err(VerificationError::Unauthorized(
                        "mismatched emails".to_string(),
                    ));
                }
                (CallbackDestination::Configure(user.id().clone()), user)
            }
            ActionPurpose::Authenticate | ActionPurpose::Report | ActionPurpose::Status => {
                let request_id = VerifyRequestId::parse(&state.subject)
                    .map_err(|e| VerificationError::Unauthorized(e.to_string()))?;
                let request = self.transitions.load(&request_id).await?;

                let Some(party) = request.party_of(&identity.email) else {
                    return Err(self.transitions.reject_actor(request, &identity.email).await);
                };

                match (state.purpose, request.status(), party) {
                    (ActionPurpose::Report, VerifyStatus::Sent, Party::Recipient) => {
                        tracing::warn!(request_id = %request_id, "Reported through action link");
                        self.transitions
                            .fail(request, FailureReason::ReportedByRecipient)
                            .await?;
                    }
                    (ActionPurpose::Authenticate, VerifyStatus::Sent, Party::Recipient) => {
                        self.transitions
                            .record_identity_proof(request, identity.claims.clone())
                            .await?;
                    }
                    _ => {}
                }

                let user = self.directory.ensure_user_for_identity(&identity).await?;
                (CallbackDestination::Request(request_id), user)
            }
        };

        Ok(CallbackOutcome {
            destination,
            access_token,
            user,
        })
    }

    async fn configured_user(&self, subject: &str) -> Result<User, VerificationError> {
        let id = UserId::new(subject);
        match self.directory.get(&id).await {
            Ok(user) => Ok(user),
            Err(VerificationError::UserNotFound) => {
                let profile = self.profiles.lookup(subject).await?;
                self.directory.ensure_user(profile).await
            }
            Err(e) => Err(e),
        }
    }
}
