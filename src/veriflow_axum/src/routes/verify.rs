use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use veriflow_application::{InitiateVerificationUseCase, NewVerification, PartyRef};
use veriflow_core::CommunicationTool;

use crate::{
    error::ApiError,
    extract::Actor,
    state::{AppState, Backend},
    views::RequestView,
};

#[derive(Debug, Deserialize)]
pub struct VerifyRequestBody {
    /// Recipient id as understood by the active profile directory: a chat
    /// user id, or an e-mail address when e-mail is the only channel.
    pub recipient: String,
    pub message: Option<String>,
}

/// Starts a verification from the signed-in user to `recipient`.
#[tracing::instrument(name = "Initiate verification", skip_all)]
pub async fn initiate_verification<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
    Json(body): Json<VerifyRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let recipient = body.recipient.trim();
    if recipient.is_empty() {
        return Err(ApiError::InvalidInput("recipient is required".to_string()));
    }

    let use_case = InitiateVerificationUseCase::new(
        state.transitions.clone(),
        state.directory.clone(),
        state.profiles.clone(),
        state.identity.clone(),
    );
    let request = use_case
        .execute(NewVerification {
            requestor: PartyRef::Known(actor.profile().clone()),
            recipient: PartyRef::External(recipient.to_string()),
            message: body.message.filter(|m| !m.trim().is_empty()),
            communication_tool: CommunicationTool::Api,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RequestView::new(&request, Utc::now()))))
}
