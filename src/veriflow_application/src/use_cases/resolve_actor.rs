use secrecy::Secret;
use veriflow_core::{IdentityProvider, User, UserStore};

use crate::error::VerificationError;

/// Resolve actor use case - binds a bearer access token to a known user
pub struct ResolveActorUseCase<I, U>
where
    I: IdentityProvider,
    U: UserStore,
{
    identity_provider: I,
    user_store: U,
}

impl<I, U> ResolveActorUseCase<I, U>
where
    I: IdentityProvider,
    U: UserStore,
{
    pub fn new(identity_provider: I, user_store: U) -> Self {
        Self {
            identity_provider,
            user_store,
        }
    }

    /// Any failure to bind the token is `Unauthorized`.
    #[tracing::instrument(name = "ResolveActorUseCase::execute", skip_all)]
    pub async fn execute(&self, access_token: &Secret<String>) -> Result<User, VerificationError> {
        let identity = self
            .identity_provider
            .introspect(access_token)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token introspection failed");
                VerificationError::Unauthorized("invalid access token".to_string())
            })?;

        self.user_store
            .get_user_by_email(&identity.email)
            .await
            .map_err(|e| {
                tracing::debug!(email = %identity.email, error = %e, "No user bound to identity");
                VerificationError::Unauthorized("unknown user".to_string())
            })
    }
}
