use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use veriflow_core::{
    AccessToken, ActionPurpose, ActionState, Email, Identity, IdentityProvider,
    IdentityProviderError,
};

use super::state_token::StateTokenCodec;

const DISCOVERY_PATH: &str = ".well-known/openid-configuration";
const SCOPES: &str = "openid email profile";
const DEFAULT_TOKEN_TTL_IN_SECONDS: i64 = 3600;

#[derive(Clone)]
pub struct OidcClientConfig {
    pub issuer: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// OpenID Connect authorization-code client. The provider endpoints come from
/// the issuer's discovery document, fetched once in [`OidcProvider::discover`].
#[derive(Clone)]
pub struct OidcProvider {
    http_client: Client,
    config: OidcClientConfig,
    metadata: ProviderMetadata,
    state_codec: StateTokenCodec,
}

impl OidcProvider {
    pub fn new(
        config: OidcClientConfig,
        metadata: ProviderMetadata,
        state_codec: StateTokenCodec,
        http_client: Client,
    ) -> Self {
        Self {
            http_client,
            config,
            metadata,
            state_codec,
        }
    }

    #[tracing::instrument(
        name = "Fetching OIDC discovery document",
        skip_all,
        fields(issuer = %config.issuer)
    )]
    pub async fn discover(
        config: OidcClientConfig,
        state_codec: StateTokenCodec,
        http_client: Client,
    ) -> Result<Self, IdentityProviderError> {
        let mut issuer = config.issuer.clone();
        if !issuer.ends_with('/') {
            issuer.push('/');
        }
        let url = Url::parse(&issuer)
            .and_then(|base| base.join(DISCOVERY_PATH))
            .map_err(|e| IdentityProviderError::UnexpectedError(e.to_string()))?;

        let metadata = http_client
            .get(url)
            .send()
            .await
            .map_err(unexpected)?
            .error_for_status()
            .map_err(unexpected)?
            .json::<ProviderMetadata>()
            .await
            .map_err(unexpected)?;

        Ok(Self::new(config, metadata, state_codec, http_client))
    }

    async fn fetch_user_info(
        &self,
        token: &Secret<String>,
    ) -> Result<Identity, IdentityProviderError> {
        let response = self
            .http_client
            .get(&self.metadata.userinfo_endpoint)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(unexpected)?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(IdentityProviderError::Unauthorized(
                "access token rejected by the identity provider".to_string(),
            ));
        }

        let claims = response
            .error_for_status()
            .map_err(unexpected)?
            .json::<serde_json::Value>()
            .await
            .map_err(unexpected)?;

        identity_from_claims(claims)
    }
}

fn unexpected(e: reqwest::Error) -> IdentityProviderError {
    IdentityProviderError::UnexpectedError(e.to_string())
}

/// A user-info document without a usable e-mail never binds an identity.
fn identity_from_claims(claims: serde_json::Value) -> Result<Identity, IdentityProviderError> {
    let email = claims
        .get("email")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            IdentityProviderError::Unauthorized("user info has no email claim".to_string())
        })
        .and_then(|raw| {
            Email::parse(raw).map_err(|e| IdentityProviderError::Unauthorized(e.to_string()))
        })?;

    let name = claims
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok(Identity {
        email,
        name,
        claims,
    })
}

#[async_trait::async_trait]
impl IdentityProvider for OidcProvider {
    fn generate_auth_link(
        &self,
        purpose: ActionPurpose,
        subject: &str,
    ) -> Result<String, IdentityProviderError> {
        let state = self
            .state_codec
            .encode(&ActionState::new(purpose, subject))
            .map_err(|e| IdentityProviderError::UnexpectedError(e.to_string()))?;

        let url = Url::parse_with_params(
            &self.metadata.authorization_endpoint,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", SCOPES),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| IdentityProviderError::UnexpectedError(e.to_string()))?;

        Ok(url.to_string())
    }

    fn decode_state(&self, state: &str) -> Result<ActionState, IdentityProviderError> {
        self.state_codec
            .decode(state)
            .map_err(|e| IdentityProviderError::InvalidState(e.to_string()))
    }

    #[tracing::instrument(name = "Exchanging authorization code", skip_all)]
    async fn exchange_code(
        &self,
        code: &str,
    ) -> Result<(Identity, AccessToken), IdentityProviderError> {
        let response = self
            .http_client
            .post(&self.metadata.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret().as_str()),
            ])
            .send()
            .await
            .map_err(unexpected)?;

        if !response.status().is_success() {
            return Err(IdentityProviderError::ExchangeFailed(format!(
                "token endpoint answered {}",
                response.status()
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| IdentityProviderError::ExchangeFailed(e.to_string()))?;

        let ttl = token.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_IN_SECONDS);
        let access_token = AccessToken::new(
            Secret::new(token.access_token),
            Utc::now() + Duration::seconds(ttl),
        );

        let identity = self.fetch_user_info(&access_token.token).await?;
        Ok((identity, access_token))
    }

    #[tracing::instrument(name = "Introspecting access token", skip_all)]
    async fn introspect(&self, token: &Secret<String>) -> Result<Identity, IdentityProviderError> {
        self.fetch_user_info(token).await
    }
}
