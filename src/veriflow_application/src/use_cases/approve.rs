use veriflow_core::{User, VerifyRequestId, VerifyRequestStore};

use crate::{
    error::VerificationError,
    transitions::{RequestTransitions, TransitionOutcome, WorkflowPolicy},
};

/// Approve use case - the recipient confirms the verification request
pub struct ApproveUseCase<R>
where
    R: VerifyRequestStore,
{
    transitions: RequestTransitions<R>,
    policy: WorkflowPolicy,
}

impl<R> ApproveUseCase<R>
where
    R: VerifyRequestStore,
{
    pub fn new(transitions: RequestTransitions<R>, policy: WorkflowPolicy) -> Self {
        Self {
            transitions,
            policy,
        }
    }

    /// Only the recipient may approve. Anyone else fails a pending request
    /// and gets `Unauthorized`. With the second-factor policy on, the
    /// request stays SENT and waits for a code or a passkey.
    #[tracing::instrument(
        name = "ApproveUseCase::execute",
        skip_all,
        fields(request_id = %request_id, actor = %actor.email())
    )]
    pub async fn execute(
        &self,
        actor: &User,
        request_id: &VerifyRequestId,
    ) -> Result<TransitionOutcome, VerificationError> {
        let request = self.transitions.load(request_id).await?;

        if !request.is_recipient(actor.email()) {
            return Err(self.transitions.reject_actor(request, actor.email()).await);
        }
        if request.is_terminal() {
            return Ok(TransitionOutcome::Unchanged(request));
        }
        if self.policy.second_factor_required {
            return self.transitions.await_second_factor(request).await;
        }

        self.transitions.complete(request).await
    }
}
