use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use secrecy::Secret;
use veriflow_application::ResolveActorUseCase;
use veriflow_core::User;

use crate::{
    error::ApiError,
    state::{AppState, Backend},
};

/// The user bound to the access token in the auth cookie.
///
/// Rejects with 401 when the cookie is missing, the provider no longer
/// accepts the token, or no user is registered for its e-mail.
#[derive(Debug, Clone)]
pub struct Actor(pub User);

impl<B: Backend> FromRequestParts<AppState<B>> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<B>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(&state.cookie_name)
            .map(|cookie| cookie.value().to_owned())
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::MissingToken)?;

        let user = ResolveActorUseCase::new(state.identity.clone(), state.users.clone())
            .execute(&Secret::new(token))
            .await?;

        Ok(Actor(user))
    }
}
