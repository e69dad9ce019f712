use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Deserialize;
use veriflow_application::{AuthCallbackUseCase, CallbackDestination};
use veriflow_core::AccessToken;

use crate::{
    error::ApiError,
    state::{AppState, Backend},
};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[tracing::instrument(name = "Auth callback", skip_all)]
pub async fn auth_callback<B: Backend>(
    State(state): State<AppState<B>>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Identity provider returned an error");
        return Err(ApiError::Unauthorized(error));
    }
    let (Some(code), Some(link_state)) = (params.code, params.state) else {
        return Err(ApiError::InvalidInput(
            "code and state are required".to_string(),
        ));
    };

    let use_case = AuthCallbackUseCase::new(
        state.identity.clone(),
        state.transitions.clone(),
        state.directory.clone(),
        state.profiles.clone(),
    );
    let outcome = use_case.execute(&code, &link_state).await?;

    let cookie = auth_cookie(&state.cookie_name, &outcome.access_token);
    let location = destination_path(&outcome.destination);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Redirect::to(&location),
    ))
}

/// Session cookie that lives exactly as long as the provider token.
fn auth_cookie(name: &str, access_token: &AccessToken) -> String {
    let cookie = Cookie::build((name.to_owned(), access_token.token.expose_secret().clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build();

    format!(
        "{cookie}; Max-Age={}",
        access_token.seconds_until_expiry(Utc::now())
    )
}

fn destination_path(destination: &CallbackDestination) -> String {
    match destination {
        CallbackDestination::Home => "/requests".to_string(),
        CallbackDestination::Configure(_) => "/settings".to_string(),
        CallbackDestination::Request(id) => format!("/requests/{id}"),
    }
}
