use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use veriflow_application::{
    ApproveUseCase, ListRequestsUseCase, PasskeyApprovalUseCase, PasskeyLoginUseCase,
    ReportUseCase, VerifyCodeUseCase, ViewRequestUseCase,
};
use veriflow_core::VerifyRequestId;

use crate::{
    error::ApiError,
    extract::Actor,
    state::{AppState, Backend},
    views::{OutcomeView, OverviewView, RequestView},
};

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}

#[tracing::instrument(name = "List requests", skip_all)]
pub async fn list_requests<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
) -> Result<impl IntoResponse, ApiError> {
    let overview = ListRequestsUseCase::new(state.requests())
        .execute(&actor)
        .await?;

    Ok(Json(OverviewView::new(&overview, Utc::now())))
}

#[tracing::instrument(name = "View request", skip_all)]
pub async fn view_request<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = VerifyRequestId::parse(&id)?;

    let request = ViewRequestUseCase::new(state.requests())
        .execute(&actor, &request_id)
        .await?;

    Ok(Json(RequestView::new(&request, Utc::now())))
}

#[tracing::instrument(name = "Approve", skip_all)]
pub async fn approve<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = VerifyRequestId::parse(&id)?;

    let outcome = ApproveUseCase::new(state.transitions.clone(), state.workflow)
        .execute(&actor, &request_id)
        .await?;

    Ok(Json(OutcomeView::new(&outcome, Utc::now())))
}

#[tracing::instrument(name = "Report", skip_all)]
pub async fn report<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = VerifyRequestId::parse(&id)?;

    let outcome = ReportUseCase::new(state.transitions.clone())
        .execute(&actor, &request_id)
        .await?;

    Ok(Json(OutcomeView::new(&outcome, Utc::now())))
}

#[tracing::instrument(name = "Verify code", skip_all)]
pub async fn verify_code<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = VerifyRequestId::parse(&id)?;

    let outcome = VerifyCodeUseCase::new(state.transitions.clone(), state.totp.clone())
        .execute(&actor, &request_id, &request.code)
        .await?;

    Ok(Json(OutcomeView::new(&outcome, Utc::now())))
}

fn passkey_approval<B: Backend>(
    state: &AppState<B>,
) -> PasskeyApprovalUseCase<B::Requests, B::Users, B::Challenges, B::Ceremony> {
    PasskeyApprovalUseCase::new(
        state.transitions.clone(),
        PasskeyLoginUseCase::new(
            state.directory.clone(),
            state.ceremony.clone(),
            state.challenges,
        ),
    )
}

#[tracing::instrument(name = "Begin passkey approval", skip_all)]
pub async fn begin_passkey_approval<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = VerifyRequestId::parse(&id)?;

    let options = passkey_approval(&state)
        .begin(&actor, &request_id)
        .await?;

    Ok(Json(options))
}

#[tracing::instrument(name = "Finish passkey approval", skip_all)]
pub async fn finish_passkey_approval<B: Backend>(
    State(state): State<AppState<B>>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    Json(response): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = VerifyRequestId::parse(&id)?;

    let outcome = passkey_approval(&state)
        .finish(&actor, &request_id, &response)
        .await?;

    Ok(Json(OutcomeView::new(&outcome, Utc::now())))
}
