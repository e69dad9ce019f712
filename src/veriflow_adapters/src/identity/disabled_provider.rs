use secrecy::Secret;
use veriflow_core::{
    AccessToken, ActionPurpose, ActionState, Identity, IdentityProvider, IdentityProviderError,
};

/// Identity provider used when `auth.provider` is `none`. Nothing can be
/// authenticated, so every call fails.
#[derive(Debug, Default, Clone)]
pub struct DisabledIdentityProvider;

#[async_trait::async_trait]
impl IdentityProvider for DisabledIdentityProvider {
    fn generate_auth_link(
        &self,
        _purpose: ActionPurpose,
        _subject: &str,
    ) -> Result<String, IdentityProviderError> {
        Err(IdentityProviderError::NotConfigured)
    }

    fn decode_state(&self, _state: &str) -> Result<ActionState, IdentityProviderError> {
        Err(IdentityProviderError::NotConfigured)
    }

    async fn exchange_code(
        &self,
        _code: &str,
    ) -> Result<(Identity, AccessToken), IdentityProviderError> {
        Err(IdentityProviderError::NotConfigured)
    }

    async fn introspect(&self, _token: &Secret<String>) -> Result<Identity, IdentityProviderError> {
        Err(IdentityProviderError::NotConfigured)
    }
}
