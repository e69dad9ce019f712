use veriflow_core::{
    PublicKeyCeremony, SessionChallengeStore, User, UserStore, VerifyRequestId,
    VerifyRequestStore,
};

use crate::{
    error::VerificationError,
    transitions::{RequestTransitions, TransitionOutcome},
    use_cases::passkey_login::PasskeyLoginUseCase,
};

/// Passkey approval use case - completes a request with a passkey assertion
/// of the recipient
pub struct PasskeyApprovalUseCase<R, U, C, P>
where
    R: VerifyRequestStore,
    U: UserStore,
    C: SessionChallengeStore,
    P: PublicKeyCeremony,
{
    transitions: RequestTransitions<R>,
    login: PasskeyLoginUseCase<U, C, P>,
}

impl<R, U, C, P> PasskeyApprovalUseCase<R, U, C, P>
where
    R: VerifyRequestStore,
    U: UserStore,
    C: SessionChallengeStore,
    P: PublicKeyCeremony,
{
    pub fn new(transitions: RequestTransitions<R>, login: PasskeyLoginUseCase<U, C, P>) -> Self {
        Self { transitions, login }
    }

    #[tracing::instrument(
        name = "PasskeyApprovalUseCase::begin",
        skip_all,
        fields(request_id = %request_id, actor = %actor.email())
    )]
    pub async fn begin(
        &self,
        actor: &User,
        request_id: &VerifyRequestId,
    ) -> Result<serde_json::Value, VerificationError> {
        let request = self.transitions.load(request_id).await?;

        if !request.is_recipient(actor.email()) {
            return Err(self.transitions.reject_actor(request, actor.email()).await);
        }
        if request.is_terminal() {
            return Err(VerificationError::RequestClosed(request.status()));
        }

        self.login.begin(actor).await
    }

    /// A rejected assertion leaves the request SENT.
    #[tracing::instrument(
        name = "PasskeyApprovalUseCase::finish",
        skip_all,
        fields(request_id = %request_id, actor = %actor.email())
    )]
    pub async fn finish(
        &self,
        actor: &User,
        request_id: &VerifyRequestId,
        response: &serde_json::Value,
    ) -> Result<TransitionOutcome, VerificationError> {
        let request = self.transitions.load(request_id).await?;

        if !request.is_recipient(actor.email()) {
            return Err(self.transitions.reject_actor(request, actor.email()).await);
        }
        if request.is_terminal() {
            self.login.abandon(actor).await?;
            return Ok(TransitionOutcome::Unchanged(request));
        }

        self.login.finish(actor, response).await?;
        self.transitions.complete(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        directory::ChallengePolicy,
        testing::{Harness, StubCeremony},
    };
    use chrono::Utc;
    use veriflow_core::{StoredCredential, UserId, VerifyStatus};

    async fn bob_with_key(harness: &Harness) -> User {
        harness
            .directory()
            .add_credential(
                &UserId::new("UBOB"),
                StoredCredential {
                    id: "key-1".to_string(),
                    registered_at: Utc::now(),
                    data: serde_json::json!({ "counter": 0 }),
                },
            )
            .await
            .unwrap()
    }

    fn use_case(
        harness: &Harness,
    ) -> PasskeyApprovalUseCase<
        crate::testing::InMemoryRequests,
        crate::testing::InMemoryUsers,
        crate::testing::InMemoryChallenges,
        StubCeremony,
    > {
        PasskeyApprovalUseCase::new(
            harness.transitions.clone(),
            PasskeyLoginUseCase::new(harness.directory(), StubCeremony, ChallengePolicy::default()),
        )
    }

    #[tokio::test]
    async fn test_passkey_completes_request() {
        let harness = Harness::new();
        let request = harness.seed_sent_request().await;
        let bob = bob_with_key(&harness).await;
        let use_case = use_case(&harness);

        use_case.begin(&bob, request.id()).await.unwrap();
        let outcome = use_case
            .finish(&bob, request.id(), &serde_json::json!({"valid": true}))
            .await
            .unwrap();

        assert_eq!(outcome.request().status(), VerifyStatus::Completed);
    }

    #[tokio::test]
    async fn test_rejected_assertion_keeps_request_sent() {
        let harness = Harness::new();
        let request = harness.seed_sent_request().await;
        let bob = bob_with_key(&harness).await;
        let use_case = use_case(&harness);

        use_case.begin(&bob, request.id()).await.unwrap();
        let result = use_case
            .finish(&bob, request.id(), &serde_json::json!({"valid": false}))
            .await;

        assert!(matches!(result, Err(VerificationError::InvalidResponse(_))));
        assert_eq!(harness.stored(&request).await.status(), VerifyStatus::Sent);
    }

    #[tokio::test]
    async fn test_stranger_cannot_begin() {
        let harness = Harness::new();
        let request = harness.seed_sent_request().await;
        let eve = harness.user("UEVE").await;

        let result = use_case(&harness).begin(&eve, request.id()).await;

        assert!(matches!(result, Err(VerificationError::Unauthorized(_))));
        assert_eq!(harness.stored(&request).await.status(), VerifyStatus::Failed);
    }
}
