use axum::{Form, Json, extract::State};
use serde::{Deserialize, Serialize};
use veriflow_adapters::{SlackCommand, slack_command::USAGE};
use veriflow_application::{
    ConfigureUserUseCase, InitiateVerificationUseCase, NewVerification, PartyRef,
    VerificationError,
};
use veriflow_core::CommunicationTool;

use crate::state::{AppState, Backend};

/// Fields of a slash command invocation. Slack sends more, only these matter.
#[derive(Debug, Deserialize)]
pub struct SlashCommandForm {
    pub user_id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SlashCommandReply {
    pub response_type: &'static str,
    pub text: String,
}

impl SlashCommandReply {
    fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: "ephemeral",
            text: text.into(),
        }
    }
}

/// `/veriflow` slash command. Slack shows whatever comes back to the caller
/// only, so failures are replied as text with a 200.
#[tracing::instrument(name = "Slack command", skip_all, fields(user_id = %form.user_id))]
pub async fn slack_command<B: Backend>(
    State(state): State<AppState<B>>,
    Form(form): Form<SlashCommandForm>,
) -> Json<SlashCommandReply> {
    let reply = match SlackCommand::parse(&form.text) {
        SlackCommand::Help => USAGE.to_string(),
        SlackCommand::MissingMention => {
            format!("Please mention the user to verify.\n{USAGE}")
        }
        SlackCommand::Unknown(name) => format!("Unknown command `{name}`.\n{USAGE}"),
        SlackCommand::Configure => configure(&state, &form.user_id).await,
        SlackCommand::Verify(recipient) => verify(&state, &form.user_id, recipient).await,
    };

    Json(SlashCommandReply::ephemeral(reply))
}

async fn configure<B: Backend>(state: &AppState<B>, user_id: &str) -> String {
    let use_case = ConfigureUserUseCase::new(
        state.directory.clone(),
        state.profiles.clone(),
        state.identity.clone(),
    );

    match use_case.execute(user_id).await {
        Ok(configure) => format!(
            "<{}|Open your Veriflow settings> to set up an authenticator app or a passkey.",
            configure.link
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Configure command failed");
            failure_text(&e)
        }
    }
}

async fn verify<B: Backend>(state: &AppState<B>, requestor: &str, recipient: String) -> String {
    let use_case = InitiateVerificationUseCase::new(
        state.transitions.clone(),
        state.directory.clone(),
        state.profiles.clone(),
        state.identity.clone(),
    );

    let result = use_case
        .execute(NewVerification {
            requestor: PartyRef::External(requestor.to_string()),
            recipient: PartyRef::External(recipient.clone()),
            message: None,
            communication_tool: CommunicationTool::Slack,
        })
        .await;

    match result {
        Ok(request) => format!(
            "Verification request sent to <@{recipient}>. You will be notified when it is done. ({})",
            request.id()
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Verify command failed");
            failure_text(&e)
        }
    }
}

fn failure_text(error: &VerificationError) -> String {
    match error {
        VerificationError::InvalidInput(reason) => format!("Cannot start verification: {reason}"),
        VerificationError::IdentityResolution(_) | VerificationError::UserNotFound => {
            "Could not find that user's profile. Make sure they have an e-mail address set."
                .to_string()
        }
        _ => "Something went wrong, please try again later.".to_string(),
    }
}
