use serde::{Deserialize, Serialize};

/// Reference to a message delivered by a notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel: String,
    pub message_id: String,
}

impl MessageRef {
    pub fn new(channel: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            message_id: message_id.into(),
        }
    }
}
