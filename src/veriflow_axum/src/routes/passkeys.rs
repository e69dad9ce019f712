use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use veriflow_application::PasskeyRegistrationUseCase;

use crate::{
    error::ApiError,
    extract::Actor,
    state::{AppState, Backend},
    views::CredentialView,
};

fn registration<B: Backend>(
    state: &AppState<B>,
) -> PasskeyRegistrationUseCase<B::Users, B::Challenges, B::Ceremony> {
    PasskeyRegistrationUseCase::new(
        state.directory.clone(),
        state.ceremony.clone(),
        state.challenges,
    )
}

#[tracing::instrument(name = "Begin passkey registration", skip_all)]
pub async fn begin_registration<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
) -> Result<impl IntoResponse, ApiError> {
    let options = registration(&state).begin(&actor).await?;

    Ok(Json(options))
}

#[tracing::instrument(name = "Finish passkey registration", skip_all)]
pub async fn finish_registration<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
    Json(response): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let credential = registration(&state).finish(&actor, &response).await?;

    Ok((StatusCode::CREATED, Json(CredentialView::from(&credential))))
}
