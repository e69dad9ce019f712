use std::sync::Arc;

use veriflow_core::{MessageRef, Notifier, NotifyError, VerifyRequest};

#[derive(Debug, Clone, Copy)]
enum Event {
    Initiated,
    Sent,
    Completed,
    Failed,
}

/// Fans every event out to all configured channels.
///
/// One failing channel does not stop the others; the event only fails when
/// every channel failed.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    channels: Vec<(&'static str, Arc<dyn Notifier>)>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, name: &'static str, notifier: Arc<dyn Notifier>) -> Self {
        self.channels.push((name, notifier));
        self
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|(name, _)| *name).collect()
    }

    async fn fan_out(
        &self,
        event: Event,
        request: &VerifyRequest,
    ) -> Result<Vec<MessageRef>, NotifyError> {
        let mut messages = Vec::new();
        let mut last_error = None;
        let mut delivered = 0;

        for (name, notifier) in &self.channels {
            let outcome = match event {
                Event::Initiated => notifier.on_initiated(request).await,
                Event::Sent => notifier.on_sent(request).await,
                Event::Completed => notifier.on_completed(request).await,
                Event::Failed => notifier.on_failed(request).await,
            };
            match outcome {
                Ok(refs) => {
                    delivered += 1;
                    messages.extend(refs);
                }
                Err(e) => {
                    tracing::warn!(channel = name, ?event, error = %e, "Channel failed to deliver");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if delivered == 0 => Err(e),
            _ => Ok(messages),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for NotificationDispatcher {
    async fn on_initiated(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        self.fan_out(Event::Initiated, request).await
    }

    async fn on_sent(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        self.fan_out(Event::Sent, request).await
    }

    async fn on_completed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        self.fan_out(Event::Completed, request).await
    }

    async fn on_failed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        self.fan_out(Event::Failed, request).await
    }

    async fn delete_ephemeral_artifact(&self, artifact: &MessageRef) -> Result<(), NotifyError> {
        let mut result = Ok(());
        for (_, notifier) in &self.channels {
            if let Err(e) = notifier.delete_ephemeral_artifact(artifact).await {
                result = Err(e);
            }
        }
        result
    }

    async fn fetch_permanent_reference(
        &self,
        artifact: &MessageRef,
    ) -> Result<Option<String>, NotifyError> {
        for (_, notifier) in &self.channels {
            if let Some(permalink) = notifier.fetch_permanent_reference(artifact).await? {
                return Ok(Some(permalink));
            }
        }
        Ok(None)
    }
}
