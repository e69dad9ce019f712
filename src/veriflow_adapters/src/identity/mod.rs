pub mod disabled_provider;
pub mod oidc_provider;
pub mod state_token;

pub use disabled_provider::DisabledIdentityProvider;
pub use oidc_provider::{OidcClientConfig, OidcProvider, ProviderMetadata};
pub use state_token::{StateTokenCodec, StateTokenError};

use secrecy::Secret;
use veriflow_core::{
    AccessToken, ActionPurpose, ActionState, Identity, IdentityProvider, IdentityProviderError,
};

/// The identity provider selected by `auth.provider`.
#[derive(Clone)]
pub enum ConfiguredIdentityProvider {
    Oidc(OidcProvider),
    Disabled(DisabledIdentityProvider),
}

#[async_trait::async_trait]
impl IdentityProvider for ConfiguredIdentityProvider {
    fn generate_auth_link(
        &self,
        purpose: ActionPurpose,
        subject: &str,
    ) -> Result<String, IdentityProviderError> {
        match self {
            Self::Oidc(p) => p.generate_auth_link(purpose, subject),
            Self::Disabled(p) => p.generate_auth_link(purpose, subject),
        }
    }

    fn decode_state(&self, state: &str) -> Result<ActionState, IdentityProviderError> {
        match self {
            Self::Oidc(p) => p.decode_state(state),
            Self::Disabled(p) => p.decode_state(state),
        }
    }

    async fn exchange_code(
        &self,
        code: &str,
    ) -> Result<(Identity, AccessToken), IdentityProviderError> {
        match self {
            Self::Oidc(p) => p.exchange_code(code).await,
            Self::Disabled(p) => p.exchange_code(code).await,
        }
    }

    async fn introspect(&self, token: &Secret<String>) -> Result<Identity, IdentityProviderError> {
        match self {
            Self::Oidc(p) => p.introspect(token).await,
            Self::Disabled(p) => p.introspect(token).await,
        }
    }
}
