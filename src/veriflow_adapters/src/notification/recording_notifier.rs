use std::sync::{Arc, Mutex};

use veriflow_core::{MessageRef, Notifier, NotifyError, VerifyRequest, VerifyStatus};

/// A delivered event as seen by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub event: &'static str,
    pub request_id: String,
    pub status: VerifyStatus,
}

/// Notifier that only remembers what it was asked to send. Every message gets
/// an in-memory reference so the artifact clean-up path runs as well.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
    deleted: Arc<Mutex<Vec<MessageRef>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.event == event).count()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn record(&self, event: &'static str, request: &VerifyRequest) -> Vec<MessageRef> {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEvent {
                event,
                request_id: request.id().to_string(),
                status: request.status(),
            });
        }
        vec![MessageRef::new("memory", format!("{}:{}", event, request.id()))]
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn on_initiated(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        Ok(self.record("initiated", request))
    }

    async fn on_sent(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        Ok(self.record("sent", request))
    }

    async fn on_completed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        Ok(self.record("completed", request))
    }

    async fn on_failed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        Ok(self.record("failed", request))
    }

    async fn delete_ephemeral_artifact(&self, artifact: &MessageRef) -> Result<(), NotifyError> {
        if let Ok(mut deleted) = self.deleted.lock() {
            deleted.push(artifact.clone());
        }
        Ok(())
    }
}
