use veriflow_core::{User, VerifyRequest, VerifyRequestStore};

use crate::error::VerificationError;

#[derive(Debug, Clone, Default)]
pub struct RequestsOverview {
    pub sent: Vec<VerifyRequest>,
    pub received: Vec<VerifyRequest>,
}

/// List requests use case - the actor's requests on both sides
pub struct ListRequestsUseCase<R>
where
    R: VerifyRequestStore,
{
    requests: R,
}

impl<R> ListRequestsUseCase<R>
where
    R: VerifyRequestStore,
{
    pub fn new(requests: R) -> Self {
        Self { requests }
    }

    #[tracing::instrument(
        name = "ListRequestsUseCase::execute",
        skip_all,
        fields(actor = %actor.email())
    )]
    pub async fn execute(&self, actor: &User) -> Result<RequestsOverview, VerificationError> {
        let mut sent = self.requests.list_by_requestor(actor.email()).await?;
        let mut received = self.requests.list_by_recipient(actor.email()).await?;
        sent.sort_by_key(|r| std::cmp::Reverse(r.start()));
        received.sort_by_key(|r| std::cmp::Reverse(r.start()));

        Ok(RequestsOverview { sent, received })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[tokio::test]
    async fn test_overview_per_side() {
        let harness = Harness::new();
        harness.seed_sent_request().await;
        let use_case = ListRequestsUseCase::new(harness.requests.clone());

        let alice = use_case.execute(&harness.user("UALICE").await).await.unwrap();
        let bob = use_case.execute(&harness.user("UBOB").await).await.unwrap();
        let eve = use_case.execute(&harness.user("UEVE").await).await.unwrap();

        assert_eq!((alice.sent.len(), alice.received.len()), (1, 0));
        assert_eq!((bob.sent.len(), bob.received.len()), (0, 1));
        assert!(eve.sent.is_empty() && eve.received.is_empty());
    }
}
