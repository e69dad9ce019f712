use chrono::Utc;
use veriflow_core::{
    ActionLinks, ActionPurpose, CommunicationTool, IdentityProvider, ProfileDirectory,
    SessionChallengeStore, UserProfile, UserStore, VerifyRequest, VerifyRequestStore,
};

use crate::{
    directory::UserDirectory, error::VerificationError, transitions::RequestTransitions,
};

/// How a party of a new request is identified.
#[derive(Debug, Clone)]
pub enum PartyRef {
    /// Channel-specific user id, resolved through the profile directory.
    External(String),
    /// Already resolved, e.g. the authenticated caller of the API.
    Known(UserProfile),
}

#[derive(Debug, Clone)]
pub struct NewVerification {
    pub requestor: PartyRef,
    pub recipient: PartyRef,
    pub message: Option<String>,
    pub communication_tool: CommunicationTool,
}

/// Initiate verification use case - creates a request and sends it out
pub struct InitiateVerificationUseCase<R, U, C, D, I>
where
    R: VerifyRequestStore,
    U: UserStore,
    C: SessionChallengeStore,
    D: ProfileDirectory,
    I: IdentityProvider,
{
    transitions: RequestTransitions<R>,
    directory: UserDirectory<U, C>,
    profiles: D,
    identity_provider: I,
}

impl<R, U, C, D, I> InitiateVerificationUseCase<R, U, C, D, I>
where
    R: VerifyRequestStore,
    U: UserStore,
    C: SessionChallengeStore,
    D: ProfileDirectory,
    I: IdentityProvider,
{
    pub fn new(
        transitions: RequestTransitions<R>,
        directory: UserDirectory<U, C>,
        profiles: D,
        identity_provider: I,
    ) -> Self {
        Self {
            transitions,
            directory,
            profiles,
            identity_provider,
        }
    }

    /// Resolve both parties, persist the request and move it to SENT.
    ///
    /// Nothing is persisted when a party cannot be resolved.
    #[tracing::instrument(name = "InitiateVerificationUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        new_verification: NewVerification,
    ) -> Result<VerifyRequest, VerificationError> {
        let requestor = self.resolve(new_verification.requestor).await?;
        let recipient = self.resolve(new_verification.recipient).await?;

        if requestor.email == recipient.email {
            return Err(VerificationError::InvalidInput(
                "requestor and recipient must be different users".to_string(),
            ));
        }

        let requestor = self.directory.ensure_user(requestor).await?;
        let recipient = self.directory.ensure_user(recipient).await?;

        let request = VerifyRequest::new(
            requestor.profile().clone(),
            recipient.profile().clone(),
            new_verification.message,
            new_verification.communication_tool,
            Utc::now(),
        );
        let links = self.action_links(&request)?;

        self.transitions
            .store()
            .insert_request(request.clone())
            .await?;
        tracing::info!(request_id = %request.id(), "Verification request received");

        let outcome = self.transitions.dispatch(request, links).await?;
        Ok(outcome.into_request())
    }

    async fn resolve(&self, party: PartyRef) -> Result<UserProfile, VerificationError> {
        match party {
            PartyRef::Known(profile) => Ok(profile),
            PartyRef::External(id) => self.profiles.lookup(&id).await.map_err(|e| {
                tracing::warn!(external_id = %id, error = %e, "Identity lookup failed");
                VerificationError::from(e)
            }),
        }
    }

    fn action_links(&self, request: &VerifyRequest) -> Result<ActionLinks, VerificationError> {
        let subject = request.id().to_string();
        Ok(ActionLinks {
            authenticate: self
                .identity_provider
                .generate_auth_link(ActionPurpose::Authenticate, &subject)?,
            report: self
                .identity_provider
                .generate_auth_link(ActionPurpose::Report, &subject)?,
            status: self
                .identity_provider
                .generate_auth_link(ActionPurpose::Status, &subject)?,
        })
    }
}
