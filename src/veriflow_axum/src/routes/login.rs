use axum::{extract::State, response::Redirect};
use veriflow_core::{ActionPurpose, IdentityProvider};

use crate::{
    error::ApiError,
    state::{AppState, Backend},
};

/// Sends the browser to the identity provider. The callback signs the user in.
#[tracing::instrument(name = "Login", skip_all)]
pub async fn login<B: Backend>(State(state): State<AppState<B>>) -> Result<Redirect, ApiError> {
    let link = state
        .identity
        .generate_auth_link(ActionPurpose::Login, ActionPurpose::Login.as_str())?;

    Ok(Redirect::to(&link))
}
