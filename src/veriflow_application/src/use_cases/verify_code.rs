use chrono::Utc;
use veriflow_core::{TotpVerifier, User, VerifyRequestId, VerifyRequestStore};

use crate::{
    error::VerificationError,
    transitions::{RequestTransitions, TransitionOutcome},
};

/// Verify code use case - completes a request with the recipient's TOTP code
pub struct VerifyCodeUseCase<R, T>
where
    R: VerifyRequestStore,
    T: TotpVerifier,
{
    transitions: RequestTransitions<R>,
    totp: T,
}

impl<R, T> VerifyCodeUseCase<R, T>
where
    R: VerifyRequestStore,
    T: TotpVerifier,
{
    pub fn new(transitions: RequestTransitions<R>, totp: T) -> Self {
        Self { transitions, totp }
    }

    /// A wrong code leaves the request SENT.
    #[tracing::instrument(
        name = "VerifyCodeUseCase::execute",
        skip_all,
        fields(request_id = %request_id, actor = %actor.email())
    )]
    pub async fn execute(
        &self,
        actor: &User,
        request_id: &VerifyRequestId,
        code: &str,
    ) -> Result<TransitionOutcome, VerificationError> {
        let request = self.transitions.load(request_id).await?;

        if !request.is_recipient(actor.email()) {
            return Err(self.transitions.reject_actor(request, actor.email()).await);
        }
        if request.is_terminal() {
            return Ok(TransitionOutcome::Unchanged(request));
        }

        let factor = actor
            .second_factor()
            .filter(|factor| factor.is_validated())
            .ok_or(VerificationError::SecondFactorNotEnrolled)?;

        if !self.totp.verify(factor.secret(), code, Utc::now())? {
            tracing::warn!("Invalid TOTP code for verification request");
            return Err(VerificationError::SecondFactorFailed);
        }

        self.transitions.complete(request).await
    }
}
