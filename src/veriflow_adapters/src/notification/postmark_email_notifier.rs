use chrono::Utc;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use veriflow_core::{Email, MessageRef, Notifier, NotifyError, VerifyRequest};

use super::templates::MessageTemplates;

/// Sends workflow e-mails through Postmark. E-mails cannot be recalled, so no
/// message references are returned.
#[derive(Clone)]
pub struct PostmarkEmailNotifier {
    http_client: Client,
    base_url: String,
    sender: Email,
    authorization_token: Secret<String>,
    templates: MessageTemplates,
}

impl PostmarkEmailNotifier {
    pub fn new(
        base_url: String,
        sender: Email,
        authorization_token: Secret<String>,
        templates: MessageTemplates,
        http_client: Client,
    ) -> Self {
        Self {
            http_client,
            base_url,
            sender,
            authorization_token,
            templates,
        }
    }

    #[tracing::instrument(name = "Sending email", skip_all, fields(subject = subject))]
    async fn send_email(
        &self,
        recipients: &[&Email],
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), NotifyError> {
        let base = Url::parse(&self.base_url).map_err(delivery)?;
        let url = base.join("/email").map_err(delivery)?;

        let to = recipients
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let request_body = SendEmailRequest {
            from: self.sender.as_str(),
            to: &to,
            subject,
            html_body: html,
            text_body: text,
            message_stream: MESSAGE_STREAM,
        };

        let request = self
            .http_client
            .post(url)
            .header(
                POSTMARK_AUTH_HEADER,
                self.authorization_token.expose_secret(),
            )
            .json(&request_body);

        request
            .send()
            .await
            .map_err(delivery)?
            .error_for_status()
            .map_err(delivery)?;

        Ok(())
    }
}

fn delivery(e: impl ToString) -> NotifyError {
    NotifyError::DeliveryFailed(e.to_string())
}

fn html_paragraph(text: &str) -> String {
    format!("<p>{}</p>", html_escape(text))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[async_trait::async_trait]
impl Notifier for PostmarkEmailNotifier {
    async fn on_initiated(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        let text = MessageTemplates::render(
            &self.templates.request_confirmation_message,
            request,
            Utc::now(),
        );
        self.send_email(
            &[&request.requestor().email],
            "Verification Request Initiated",
            &text,
            &html_paragraph(&text),
        )
        .await?;
        Ok(Vec::new())
    }

    async fn on_sent(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        let text =
            MessageTemplates::render(&self.templates.verification_message, request, Utc::now());
        let mut html = html_paragraph(&text);
        if let Some(links) = request.action_links() {
            html.push_str(&format!(
                "<div class=\"buttons\"><a href=\"{}\">Verify</a> <a href=\"{}\">Report</a></div>",
                html_escape(&links.authenticate),
                html_escape(&links.report),
            ));
        }

        self.send_email(
            &[&request.recipient().email],
            "Verification Request",
            &text,
            &html,
        )
        .await?;
        Ok(Vec::new())
    }

    async fn on_completed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        let text = MessageTemplates::render(
            &self.templates.requestor_completion_message,
            request,
            Utc::now(),
        );
        self.send_email(
            &[&request.recipient().email, &request.requestor().email],
            "Verification Completed",
            &text,
            &html_paragraph(&text),
        )
        .await?;
        Ok(Vec::new())
    }

    async fn on_failed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        let text = MessageTemplates::render(
            &self.templates.requestor_verification_failure_message,
            request,
            Utc::now(),
        );
        self.send_email(
            &[&request.requestor().email],
            "Verification Failed",
            &text,
            &html_paragraph(&text),
        )
        .await?;
        Ok(Vec::new())
    }
}

const MESSAGE_STREAM: &str = "outbound";
const POSTMARK_AUTH_HEADER: &str = "X-Postmark-Server-Token";

#[derive(serde::Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    message_stream: &'a str,
}
