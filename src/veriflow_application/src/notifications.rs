use tokio::sync::mpsc;
use veriflow_core::{MessageRef, Notifier, VerifyRequest, VerifyRequestStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    Initiated,
    Sent,
    Completed,
    Failed,
}

impl NotificationEvent {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub event: NotificationEvent,
    pub request: VerifyRequest,
}

/// Sending half handed to the workflow. Submitting never blocks and never
/// fails the caller.
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::UnboundedSender<NotificationJob>,
}

impl NotificationQueue {
    pub fn submit(&self, event: NotificationEvent, request: &VerifyRequest) {
        let job = NotificationJob {
            event,
            request: request.clone(),
        };
        if self.sender.send(job).is_err() {
            tracing::warn!(
                request_id = %request.id(),
                ?event,
                "Notification worker is gone, dropping notification"
            );
        }
    }
}

/// Create a queue and the worker that drains it.
pub fn notification_queue<N, R>(
    notifier: N,
    requests: R,
) -> (NotificationQueue, NotificationWorker<N, R>)
where
    N: Notifier,
    R: VerifyRequestStore,
{
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        NotificationQueue { sender },
        NotificationWorker {
            receiver,
            notifier,
            requests,
        },
    )
}

/// Delivers workflow events to the notifier and records what came back.
///
/// Every failure here is logged and swallowed: a notification problem must
/// never undo or block a status change.
pub struct NotificationWorker<N, R> {
    receiver: mpsc::UnboundedReceiver<NotificationJob>,
    notifier: N,
    requests: R,
}

impl<N, R> NotificationWorker<N, R>
where
    N: Notifier,
    R: VerifyRequestStore,
{
    /// Process jobs until every queue handle is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            self.process(job).await;
        }
        tracing::info!("Notification queue closed");
    }

    /// Process the jobs already queued and return how many there were.
    pub async fn drain(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(job) = self.receiver.try_recv() {
            self.process(job).await;
            processed += 1;
        }
        processed
    }

    #[tracing::instrument(
        name = "NotificationWorker::process",
        skip_all,
        fields(request_id = %job.request.id(), event = ?job.event)
    )]
    async fn process(&self, job: NotificationJob) {
        let request = &job.request;
        let delivered = match job.event {
            NotificationEvent::Initiated => self.notifier.on_initiated(request).await,
            NotificationEvent::Sent => self.notifier.on_sent(request).await,
            NotificationEvent::Completed => self.notifier.on_completed(request).await,
            NotificationEvent::Failed => self.notifier.on_failed(request).await,
        };

        let messages = match delivered {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "Notification delivery failed");
                Vec::new()
            }
        };

        if job.event.is_terminal() {
            self.supersede_artifacts(request, messages.first()).await;
        } else if !messages.is_empty() {
            if let Err(e) = self.requests.attach_artifacts(request.id(), messages).await {
                tracing::warn!(error = %e, "Failed to record notification artifacts");
            }
        }
    }

    /// Remove in-progress messages and keep a durable link to the final one.
    async fn supersede_artifacts(&self, request: &VerifyRequest, last: Option<&MessageRef>) {
        let artifacts = match self.requests.get_request(request.id()).await {
            Ok(stored) => stored.artifacts().to_vec(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load artifacts for clean-up");
                request.artifacts().to_vec()
            }
        };

        for artifact in &artifacts {
            if let Err(e) = self.notifier.delete_ephemeral_artifact(artifact).await {
                tracing::warn!(
                    error = %e,
                    channel = %artifact.channel,
                    message_id = %artifact.message_id,
                    "Failed to delete notification artifact"
                );
            }
        }

        let Some(last) = last else {
            return;
        };
        match self.notifier.fetch_permanent_reference(last).await {
            Ok(Some(permalink)) => {
                if let Err(e) = self.requests.set_permalink(request.id(), permalink).await {
                    tracing::warn!(error = %e, "Failed to store permalink");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to fetch permalink"),
        }
    }
}
