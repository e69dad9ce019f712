use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use veriflow_application::{EnrollAuthenticatorUseCase, ValidateAuthenticatorUseCase};

use crate::{
    error::ApiError,
    extract::Actor,
    state::{AppState, Backend},
    views::{AuthenticatorView, SettingsView},
};

#[derive(Debug, Deserialize)]
pub struct ValidateAuthenticatorRequest {
    pub code: String,
}

#[tracing::instrument(name = "Settings", skip_all)]
pub async fn settings(Actor(actor): Actor) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(SettingsView::from(&actor)))
}

#[tracing::instrument(name = "Enroll authenticator", skip_all)]
pub async fn enroll_authenticator<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
) -> Result<impl IntoResponse, ApiError> {
    let enrollment = EnrollAuthenticatorUseCase::new(state.directory.clone(), state.totp.clone())
        .execute(&actor)
        .await?;

    Ok(Json(AuthenticatorView::from(enrollment)))
}

#[tracing::instrument(name = "Validate authenticator", skip_all)]
pub async fn validate_authenticator<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
    Json(request): Json<ValidateAuthenticatorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let validated =
        ValidateAuthenticatorUseCase::new(state.directory.clone(), state.totp.clone())
            .execute(&actor, &request.code)
            .await?;

    if !validated {
        return Err(ApiError::SecondFactorFailed);
    }

    Ok(Json(json!({ "validated": true })))
}
