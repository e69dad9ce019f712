use chrono::Utc;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::{Value, json};
use veriflow_core::{
    Email, MessageRef, Notifier, NotifyError, ProfileDirectory, ProfileDirectoryError,
    UserId, UserProfile, VerifyRequest,
};

use super::templates::MessageTemplates;

/// Slack Web API client. Sends the workflow messages as direct messages and
/// resolves slash-command user ids to profiles.
#[derive(Clone)]
pub struct SlackNotifier {
    http_client: Client,
    base_url: String,
    bot_token: Secret<String>,
    templates: MessageTemplates,
}

struct Button<'a> {
    action_id: &'a str,
    text: &'a str,
    url: &'a str,
    style: &'a str,
}

#[derive(Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
    #[serde(flatten)]
    body: Value,
}

impl SlackNotifier {
    pub fn new(
        base_url: String,
        bot_token: Secret<String>,
        templates: MessageTemplates,
        http_client: Client,
    ) -> Self {
        Self {
            http_client,
            base_url,
            bot_token,
            templates,
        }
    }

    fn method_url(&self, method: &str) -> Result<Url, String> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .and_then(|url| url.join(method))
            .map_err(|e| e.to_string())
    }

    /// Slack answers 200 for most failures and reports them in `ok`/`error`.
    async fn read(response: reqwest::Response) -> Result<Value, NotifyError> {
        let response = response
            .error_for_status()
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?
            .json::<SlackResponse>()
            .await
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?;

        if !response.ok {
            return Err(NotifyError::ChannelError(
                response.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        Ok(response.body)
    }

    async fn post(&self, method: &str, body: Value) -> Result<Value, NotifyError> {
        let url = self.method_url(method).map_err(NotifyError::DeliveryFailed)?;
        let response = self
            .http_client
            .post(url)
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?;

        Self::read(response).await
    }

    async fn get(&self, method: &str, query: &[(&str, &str)]) -> Result<Value, NotifyError> {
        let url = self.method_url(method).map_err(NotifyError::DeliveryFailed)?;
        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.bot_token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?;

        Self::read(response).await
    }

    async fn open_conversation(&self, user: &UserId) -> Result<String, NotifyError> {
        let body = self
            .post("conversations.open", json!({ "users": user.as_str() }))
            .await?;
        body["channel"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| NotifyError::ChannelError("conversation has no channel id".to_string()))
    }

    async fn send_message(
        &self,
        to: &UserProfile,
        request: &VerifyRequest,
        header: &str,
        text: String,
        image: Option<&str>,
        buttons: &[Button<'_>],
    ) -> Result<MessageRef, NotifyError> {
        let channel = self.open_conversation(&to.id).await?;
        let blocks = message_blocks(request, header, &text, image, buttons);

        let body = self
            .post(
                "chat.postMessage",
                json!({ "channel": channel, "text": text, "blocks": blocks }),
            )
            .await?;

        let channel = body["channel"].as_str().unwrap_or(&channel).to_string();
        let ts = body["ts"]
            .as_str()
            .ok_or_else(|| NotifyError::ChannelError("message has no timestamp".to_string()))?;
        Ok(MessageRef::new(channel, ts))
    }

    fn status_button(request: &VerifyRequest) -> Vec<Button<'_>> {
        request
            .action_links()
            .map(|links| Button {
                action_id: "status",
                text: "Request Status",
                url: &links.status,
                style: "primary",
            })
            .into_iter()
            .collect()
    }
}

fn message_blocks(
    request: &VerifyRequest,
    header: &str,
    text: &str,
    image: Option<&str>,
    buttons: &[Button<'_>],
) -> Vec<Value> {
    let mut section = json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text },
    });
    if let Some(image) = image {
        section["accessory"] = json!({ "type": "image", "image_url": image, "alt_text": image });
    }

    let mut blocks = vec![
        json!({ "type": "header", "text": { "type": "plain_text", "text": header } }),
        section,
    ];

    if !buttons.is_empty() {
        let elements: Vec<Value> = buttons
            .iter()
            .map(|b| {
                json!({
                    "type": "button",
                    "action_id": b.action_id,
                    "value": request.id().to_string(),
                    "text": { "type": "plain_text", "text": b.text },
                    "url": b.url,
                    "style": b.style,
                })
            })
            .collect();
        blocks.push(json!({ "type": "actions", "elements": elements }));
    }

    blocks.push(json!({
        "type": "context",
        "elements": [{
            "type": "mrkdwn",
            "text": format!("*Powered by Veriflow* | {}", request.status()),
        }],
    }));
    blocks
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    #[tracing::instrument(name = "Slack: request initiated", skip_all)]
    async fn on_initiated(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        let text = MessageTemplates::render(
            &self.templates.request_confirmation_message,
            request,
            Utc::now(),
        );
        let message = self
            .send_message(
                request.requestor(),
                request,
                "Verification Request Initiated",
                text,
                request.recipient().image.as_deref(),
                &Self::status_button(request),
            )
            .await?;
        Ok(vec![message])
    }

    #[tracing::instrument(name = "Slack: request sent", skip_all)]
    async fn on_sent(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        let text =
            MessageTemplates::render(&self.templates.verification_message, request, Utc::now());
        let buttons: Vec<Button<'_>> = request
            .action_links()
            .map(|links| {
                vec![
                    Button {
                        action_id: "authenticate",
                        text: "Authenticate",
                        url: &links.authenticate,
                        style: "primary",
                    },
                    Button {
                        action_id: "report_issue",
                        text: "Report Issue",
                        url: &links.report,
                        style: "danger",
                    },
                ]
            })
            .unwrap_or_default();

        let message = self
            .send_message(
                request.recipient(),
                request,
                "Request for Verification",
                text,
                request.requestor().image.as_deref(),
                &buttons,
            )
            .await?;
        Ok(vec![message])
    }

    /// The recipient's message comes first; its permalink is kept.
    #[tracing::instrument(name = "Slack: request completed", skip_all)]
    async fn on_completed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        let now = Utc::now();
        let buttons = Self::status_button(request);

        let to_recipient = self
            .send_message(
                request.recipient(),
                request,
                "Thank you! Verification Completed",
                MessageTemplates::render(
                    &self.templates.recipient_completion_message,
                    request,
                    now,
                ),
                request.requestor().image.as_deref(),
                &buttons,
            )
            .await?;

        let mut messages = vec![to_recipient];
        match self
            .send_message(
                request.requestor(),
                request,
                "Verification Completed",
                MessageTemplates::render(
                    &self.templates.requestor_completion_message,
                    request,
                    now,
                ),
                request.recipient().image.as_deref(),
                &buttons,
            )
            .await
        {
            Ok(message) => messages.push(message),
            Err(e) => tracing::warn!(error = %e, "Failed to notify requestor of completion"),
        }
        Ok(messages)
    }

    /// The requestor's message comes first; its permalink is kept.
    #[tracing::instrument(name = "Slack: request failed", skip_all)]
    async fn on_failed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        let now = Utc::now();

        let to_requestor = self
            .send_message(
                request.requestor(),
                request,
                "Verification Failed",
                MessageTemplates::render(
                    &self.templates.requestor_verification_failure_message,
                    request,
                    now,
                ),
                request.recipient().image.as_deref(),
                &[],
            )
            .await?;

        let mut messages = vec![to_requestor];
        match self
            .send_message(
                request.recipient(),
                request,
                "Verification Failed",
                MessageTemplates::render(
                    &self.templates.recipient_verification_failure_message,
                    request,
                    now,
                ),
                request.requestor().image.as_deref(),
                &[],
            )
            .await
        {
            Ok(message) => messages.push(message),
            Err(e) => tracing::warn!(error = %e, "Failed to notify recipient of failure"),
        }
        Ok(messages)
    }

    async fn delete_ephemeral_artifact(&self, artifact: &MessageRef) -> Result<(), NotifyError> {
        self.post(
            "chat.delete",
            json!({ "channel": artifact.channel, "ts": artifact.message_id }),
        )
        .await
        .map(|_| ())
    }

    async fn fetch_permanent_reference(
        &self,
        artifact: &MessageRef,
    ) -> Result<Option<String>, NotifyError> {
        let body = self
            .get(
                "chat.getPermalink",
                &[
                    ("channel", artifact.channel.as_str()),
                    ("message_ts", artifact.message_id.as_str()),
                ],
            )
            .await?;
        Ok(body["permalink"].as_str().map(str::to_string))
    }
}

#[async_trait::async_trait]
impl ProfileDirectory for SlackNotifier {
    #[tracing::instrument(name = "Slack: users.info", skip(self))]
    async fn lookup(&self, external_id: &str) -> Result<UserProfile, ProfileDirectoryError> {
        let body = self
            .get("users.info", &[("user", external_id)])
            .await
            .map_err(|e| match e {
                NotifyError::ChannelError(code) if code == "user_not_found" => {
                    ProfileDirectoryError::UserNotFound(external_id.to_string())
                }
                e => ProfileDirectoryError::LookupFailed(e.to_string()),
            })?;

        let user = &body["user"];
        let profile = &user["profile"];
        let email = profile["email"]
            .as_str()
            .ok_or_else(|| {
                ProfileDirectoryError::LookupFailed(format!("{external_id} has no e-mail"))
            })
            .and_then(|raw| {
                Email::parse(raw).map_err(|e| ProfileDirectoryError::LookupFailed(e.to_string()))
            })?;

        let name = profile["real_name"]
            .as_str()
            .filter(|n| !n.is_empty())
            .or_else(|| user["name"].as_str())
            .unwrap_or(external_id)
            .to_string();

        Ok(UserProfile {
            id: UserId::new(user["id"].as_str().unwrap_or(external_id)),
            email,
            name,
            image: profile["image_192"].as_str().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriflow_core::{ActionLinks, CommunicationTool, FailureReason};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path, query_param},
    };

    fn notifier(server: &MockServer) -> SlackNotifier {
        SlackNotifier::new(
            server.uri(),
            Secret::new("xoxb-test".to_string()),
            MessageTemplates::default(),
            Client::new(),
        )
    }

    fn profile(id: &str, name: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            email: Email::parse(format!("{}@x.com", name.to_lowercase())).unwrap(),
            name: name.to_string(),
            image: None,
        }
    }

    fn sent_request() -> VerifyRequest {
        let mut request = VerifyRequest::new(
            profile("UALICE", "Alice"),
            profile("UBOB", "Bob"),
            None,
            CommunicationTool::Slack,
            Utc::now(),
        );
        request
            .mark_sent(ActionLinks {
                authenticate: "https://idp/auth".to_string(),
                report: "https://idp/report".to_string(),
                status: "https://idp/status".to_string(),
            })
            .unwrap();
        request
    }

    async fn mount_conversation(server: &MockServer, user: &str, channel: &str) {
        Mock::given(method("POST"))
            .and(path("/conversations.open"))
            .and(body_partial_json(json!({ "users": user })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": true, "channel": { "id": channel } })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_sent_message_goes_to_recipient_with_action_buttons() {
        let server = MockServer::start().await;
        mount_conversation(&server, "UBOB", "DBOB").await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_partial_json(json!({ "channel": "DBOB" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "DBOB", "ts": "1700000000.0001"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messages = notifier(&server).on_sent(&sent_request()).await.unwrap();
        assert_eq!(messages, vec![MessageRef::new("DBOB", "1700000000.0001")]);
    }

    #[tokio::test]
    async fn test_failed_message_is_addressed_to_requestor_first() {
        let server = MockServer::start().await;
        mount_conversation(&server, "UALICE", "DALICE").await;
        mount_conversation(&server, "UBOB", "DBOB").await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(body_partial_json(json!({ "channel": "DALICE" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "DALICE", "ts": "1.1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(body_partial_json(json!({ "channel": "DBOB" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "DBOB", "ts": "2.2"
            })))
            .mount(&server)
            .await;

        let mut request = sent_request();
        request
            .fail(&FailureReason::ReportedByRecipient, Utc::now())
            .unwrap();
        let messages = notifier(&server).on_failed(&request).await.unwrap();

        assert_eq!(messages.first(), Some(&MessageRef::new("DALICE", "1.1")));
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_slack_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/conversations.open"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": false, "error": "invalid_auth" })),
            )
            .mount(&server)
            .await;

        let result = notifier(&server).on_initiated(&sent_request()).await;
        assert!(matches!(result, Err(NotifyError::ChannelError(e)) if e == "invalid_auth"));
    }

    #[tokio::test]
    async fn test_delete_and_permalink() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.delete"))
            .and(body_partial_json(json!({ "channel": "D1", "ts": "1.1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chat.getPermalink"))
            .and(query_param("message_ts", "1.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "permalink": "https://team.slack.com/archives/D1/p11"
            })))
            .mount(&server)
            .await;

        let notifier = notifier(&server);
        let artifact = MessageRef::new("D1", "1.1");
        notifier.delete_ephemeral_artifact(&artifact).await.unwrap();
        assert_eq!(
            notifier.fetch_permanent_reference(&artifact).await.unwrap(),
            Some("https://team.slack.com/archives/D1/p11".to_string())
        );
    }

    #[tokio::test]
    async fn test_lookup_builds_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users.info"))
            .and(query_param("user", "UBOB"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "user": {
                    "id": "UBOB",
                    "name": "bob",
                    "profile": {
                        "real_name": "Bob Builder",
                        "email": "Bob@X.com",
                        "image_192": "https://img/bob.png"
                    }
                }
            })))
            .mount(&server)
            .await;

        let profile = notifier(&server).lookup("UBOB").await.unwrap();
        assert_eq!(profile.id, UserId::new("UBOB"));
        assert_eq!(profile.email.as_str(), "bob@x.com");
        assert_eq!(profile.name, "Bob Builder");
        assert_eq!(profile.image.as_deref(), Some("https://img/bob.png"));
    }

    #[tokio::test]
    async fn test_lookup_of_unknown_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users.info"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": false, "error": "user_not_found" })),
            )
            .mount(&server)
            .await;

        let result = notifier(&server).lookup("UNOPE").await;
        assert!(matches!(result, Err(ProfileDirectoryError::UserNotFound(_))));
    }
}
