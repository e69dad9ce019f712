use chrono::{DateTime, Utc};
use serde::Deserialize;
use veriflow_core::VerifyRequest;

const TIME_FORMAT: &str = "%Y-%m-%d %I:%M %p";

/// Message texts shared by every channel.
///
/// Placeholders: `{requestor}`, `{recipient}`, `{time}` and `{error}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub verification_message: String,
    pub request_confirmation_message: String,
    pub requestor_completion_message: String,
    pub recipient_completion_message: String,
    pub requestor_verification_failure_message: String,
    pub recipient_verification_failure_message: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            verification_message: "Hi {recipient}, {requestor} asked you to verify your identity. \
                Authenticate with the button below, or report the request if you did not expect it."
                .to_string(),
            request_confirmation_message:
                "Hi {requestor}, your verification request to {recipient} was sent at {time}."
                    .to_string(),
            requestor_completion_message:
                "Hi {requestor}, {recipient} verified their identity at {time}.".to_string(),
            recipient_completion_message:
                "Hi {recipient}, thank you for verifying your identity for {requestor} at {time}."
                    .to_string(),
            requestor_verification_failure_message:
                "Hi {requestor}, the verification of {recipient} failed at {time}. {error}"
                    .to_string(),
            recipient_verification_failure_message:
                "Hi {recipient}, the verification requested by {requestor} failed at {time}. {error}"
                    .to_string(),
        }
    }
}

impl MessageTemplates {
    pub fn render(template: &str, request: &VerifyRequest, now: DateTime<Utc>) -> String {
        template
            .replace("{requestor}", &request.requestor().name)
            .replace("{recipient}", &request.recipient().name)
            .replace("{time}", &now.format(TIME_FORMAT).to_string())
            .replace("{error}", request.error().unwrap_or_default())
    }
}
