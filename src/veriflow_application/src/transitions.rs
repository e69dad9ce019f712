use chrono::Utc;
use veriflow_core::{
    ActionLinks, Email, FailureReason, StatusUpdate, VerifyRequest, VerifyRequestId,
    VerifyRequestStore, VerifyStatus,
};

use crate::{
    error::VerificationError,
    notifications::{NotificationEvent, NotificationQueue},
};

/// Whether approval must be confirmed by a second factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowPolicy {
    pub second_factor_required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The status changed. Holds the new snapshot.
    Transitioned(VerifyRequest),
    /// Nothing was written, the request was terminal or lost a race.
    /// Holds the current snapshot.
    Unchanged(VerifyRequest),
    /// Approval accepted, completion waits for a second factor.
    AwaitingSecondFactor(VerifyRequest),
}

impl TransitionOutcome {
    pub fn request(&self) -> &VerifyRequest {
        match self {
            Self::Transitioned(request)
            | Self::Unchanged(request)
            | Self::AwaitingSecondFactor(request) => request,
        }
    }

    pub fn into_request(self) -> VerifyRequest {
        match self {
            Self::Transitioned(request)
            | Self::Unchanged(request)
            | Self::AwaitingSecondFactor(request) => request,
        }
    }
}

/// Status changes of verification requests.
///
/// Every write is conditional on the status the change was computed from,
/// so concurrent callers on one request cannot both win. A successful write
/// is followed by a notification submission.
#[derive(Clone)]
pub struct RequestTransitions<R>
where
    R: VerifyRequestStore,
{
    requests: R,
    queue: NotificationQueue,
}

impl<R> RequestTransitions<R>
where
    R: VerifyRequestStore,
{
    pub fn new(requests: R, queue: NotificationQueue) -> Self {
        Self { requests, queue }
    }

    pub fn store(&self) -> &R {
        &self.requests
    }

    pub async fn load(&self, id: &VerifyRequestId) -> Result<VerifyRequest, VerificationError> {
        Ok(self.requests.get_request(id).await?)
    }

    pub async fn dispatch(
        &self,
        request: VerifyRequest,
        links: ActionLinks,
    ) -> Result<TransitionOutcome, VerificationError> {
        let mut next = request.clone();
        next.mark_sent(links)?;

        match self
            .requests
            .update_if_status(VerifyStatus::Received, &next)
            .await?
        {
            StatusUpdate::Applied => {
                self.queue.submit(NotificationEvent::Initiated, &next);
                self.queue.submit(NotificationEvent::Sent, &next);
                Ok(TransitionOutcome::Transitioned(next))
            }
            StatusUpdate::Rejected(current) => Ok(TransitionOutcome::Unchanged(*current)),
        }
    }

    pub async fn complete(
        &self,
        request: VerifyRequest,
    ) -> Result<TransitionOutcome, VerificationError> {
        let expected = request.status();
        let mut next = request.clone();
        if next.complete(Utc::now()).is_err() {
            return Ok(TransitionOutcome::Unchanged(request));
        }
        self.commit(expected, next, NotificationEvent::Completed)
            .await
    }

    pub async fn fail(
        &self,
        request: VerifyRequest,
        reason: FailureReason,
    ) -> Result<TransitionOutcome, VerificationError> {
        let expected = request.status();
        let mut next = request.clone();
        if next.fail(&reason, Utc::now()).is_err() {
            return Ok(TransitionOutcome::Unchanged(request));
        }
        self.commit(expected, next, NotificationEvent::Failed).await
    }

    pub async fn await_second_factor(
        &self,
        request: VerifyRequest,
    ) -> Result<TransitionOutcome, VerificationError> {
        let mut next = request.clone();
        if next.await_second_factor(Utc::now()).is_err() {
            return Ok(TransitionOutcome::Unchanged(request));
        }
        match self
            .requests
            .update_if_status(VerifyStatus::Sent, &next)
            .await?
        {
            StatusUpdate::Applied => Ok(TransitionOutcome::AwaitingSecondFactor(next)),
            StatusUpdate::Rejected(current) => Ok(TransitionOutcome::Unchanged(*current)),
        }
    }

    pub async fn record_identity_proof(
        &self,
        request: VerifyRequest,
        claims: serde_json::Value,
    ) -> Result<VerifyRequest, VerificationError> {
        let mut next = request.clone();
        if next.record_identity_proof(claims).is_err() {
            return Ok(request);
        }
        match self
            .requests
            .update_if_status(VerifyStatus::Sent, &next)
            .await?
        {
            StatusUpdate::Applied => Ok(next),
            StatusUpdate::Rejected(current) => Ok(*current),
        }
    }

    /// Deny an actor that is not allowed to act on the request. A
    /// non-terminal request is failed with a reason naming the actor.
    ///
    /// Returns the error to hand back to the caller: `Unauthorized`, or the
    /// store error if the forced failure could not be written.
    pub async fn reject_actor(&self, request: VerifyRequest, actor: &Email) -> VerificationError {
        tracing::warn!(
            request_id = %request.id(),
            actor = %actor,
            recipient = %request.recipient().email,
            "Identity mismatch on verification request"
        );

        if !request.is_terminal() {
            let reason = request.mismatch(actor);
            if let Err(e) = self.fail(request, reason).await {
                return e;
            }
        }

        VerificationError::Unauthorized(format!(
            "{actor} is not allowed to act on this verification request"
        ))
    }

    async fn commit(
        &self,
        expected: VerifyStatus,
        next: VerifyRequest,
        event: NotificationEvent,
    ) -> Result<TransitionOutcome, VerificationError> {
        match self.requests.update_if_status(expected, &next).await? {
            StatusUpdate::Applied => {
                tracing::info!(
                    request_id = %next.id(),
                    from = %expected,
                    to = %next.status(),
                    "Verification request transitioned"
                );
                self.queue.submit(event, &next);
                Ok(TransitionOutcome::Transitioned(next))
            }
            StatusUpdate::Rejected(current) => {
                tracing::info!(
                    request_id = %next.id(),
                    current = %current.status(),
                    "Lost transition race"
                );
                Ok(TransitionOutcome::Unchanged(*current))
            }
        }
    }
}
