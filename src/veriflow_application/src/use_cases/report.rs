use veriflow_core::{FailureReason, User, VerifyRequestId, VerifyRequestStore};

use crate::{
    error::VerificationError,
    transitions::{RequestTransitions, TransitionOutcome},
};

/// Report use case - the recipient flags the request as suspicious
pub struct ReportUseCase<R>
where
    R: VerifyRequestStore,
{
    transitions: RequestTransitions<R>,
}

impl<R> ReportUseCase<R>
where
    R: VerifyRequestStore,
{
    pub fn new(transitions: RequestTransitions<R>) -> Self {
        Self { transitions }
    }

    #[tracing::instrument(
        name = "ReportUseCase::execute",
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

        tracing::warn!("Verification request reported by recipient");
        self.transitions
            .fail(request, FailureReason::ReportedByRecipient)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::Harness,
        transitions::WorkflowPolicy,
        use_cases::approve::ApproveUseCase,
    };
    use veriflow_core::VerifyStatus;

    #[tokio::test]
    async fn test_report_then_approve_is_a_no_op() {
        let mut harness = Harness::new();
        let request = harness.seed_sent_request().await;
        let bob = harness.user("UBOB").await;

        let reported = ReportUseCase::new(harness.transitions.clone())
            .execute(&bob, request.id())
            .await
            .unwrap();
        let reported = reported.into_request();
        assert_eq!(reported.status(), VerifyStatus::Failed);
        assert!(
            reported
                .error()
                .unwrap()
                .to_lowercase()
                .contains("reported by recipient")
        );

        let outcome = ApproveUseCase::new(harness.transitions.clone(), WorkflowPolicy::default())
            .execute(&bob, request.id())
            .await
            .unwrap();

        let TransitionOutcome::Unchanged(current) = outcome else {
            panic!("expected no change, got {outcome:?}");
        };
        assert_eq!(current.status(), VerifyStatus::Failed);
        assert_eq!(current.error(), reported.error());

        harness.worker.drain().await;
        assert_eq!(harness.notifier.terminal_events(), 1);
    }

    #[tokio::test]
    async fn test_stranger_report_on_terminal_request_writes_nothing() {
        let harness = Harness::new();
        let request = harness.seed_sent_request().await;
        let bob = harness.user("UBOB").await;
        let eve = harness.user("UEVE").await;
        ReportUseCase::new(harness.transitions.clone())
            .execute(&bob, request.id())
            .await
            .unwrap();
        let before = harness.stored(&request).await;

        let result = ReportUseCase::new(harness.transitions.clone())
            .execute(&eve, request.id())
            .await;

        assert!(matches!(result, Err(VerificationError::Unauthorized(_))));
        assert_eq!(harness.stored(&request).await, before);
    }
}
