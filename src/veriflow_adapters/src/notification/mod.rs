pub mod dispatcher;
pub mod email_profile_directory;
pub mod postmark_email_notifier;
pub mod recording_notifier;
pub mod slack_notifier;
pub mod templates;

pub use dispatcher::NotificationDispatcher;
pub use email_profile_directory::EmailProfileDirectory;
pub use postmark_email_notifier::PostmarkEmailNotifier;
pub use recording_notifier::{RecordedEvent, RecordingNotifier};
pub use slack_notifier::SlackNotifier;
pub use templates::MessageTemplates;

use veriflow_core::{ProfileDirectory, ProfileDirectoryError, UserProfile};

/// The profile directory selected by `communication.active_service`.
#[derive(Clone)]
pub enum ConfiguredProfileDirectory {
    Slack(SlackNotifier),
    Email(EmailProfileDirectory),
}

#[async_trait::async_trait]
impl ProfileDirectory for ConfiguredProfileDirectory {
    async fn lookup(&self, external_id: &str) -> Result<UserProfile, ProfileDirectoryError> {
        match self {
            Self::Slack(directory) => directory.lookup(external_id).await,
            Self::Email(directory) => directory.lookup(external_id).await,
        }
    }
}
