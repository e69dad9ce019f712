use veriflow_core::{User, VerifyRequest, VerifyRequestId, VerifyRequestStore};

use crate::error::VerificationError;

/// View request use case - either party may read the request
pub struct ViewRequestUseCase<R>
where
    R: VerifyRequestStore,
{
    requests: R,
}

impl<R> ViewRequestUseCase<R>
where
    R: VerifyRequestStore,
{
    pub fn new(requests: R) -> Self {
        Self { requests }
    }

    /// Reading never changes the request, not even for a stranger.
    #[tracing::instrument(
        name = "ViewRequestUseCase::execute",
        skip_all,
        fields(request_id = %request_id, actor = %actor.email())
    )]
    pub async fn execute(
        &self,
        actor: &User,
        request_id: &VerifyRequestId,
    ) -> Result<VerifyRequest, VerificationError> {
        let request = self.requests.get_request(request_id).await?;
        if request.party_of(actor.email()).is_none() {
            return Err(VerificationError::Unauthorized(
                "not a party of this verification request".to_string(),
            ));
        }
        Ok(request)
    }
}
