use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use veriflow_core::{ActionPurpose, ActionState};

#[derive(Debug, Error)]
pub enum StateTokenError {
    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),
    #[error("Unknown purpose in state: {0}")]
    UnknownPurpose(String),
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

/// Signs and verifies the `state` parameter of authorization links, so a
/// callback cannot be pointed at a different purpose or subject.
#[derive(Clone)]
pub struct StateTokenCodec {
    secret: Secret<String>,
    ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct StateClaims {
    purpose: String,
    sub: String,
    jti: Uuid,
    exp: i64,
}

impl StateTokenCodec {
    pub fn new(secret: &Secret<String>, ttl_in_seconds: i64) -> Self {
        Self {
            secret: secret.clone(),
            ttl: Duration::seconds(ttl_in_seconds),
        }
    }

    /// Codec with a random key. States do not survive a restart.
    pub fn ephemeral(ttl_in_seconds: i64) -> Self {
        let mut key = [0u8; 32];
        rand::rng().fill_bytes(&mut key);
        let key: String = key.iter().map(|b| format!("{b:02x}")).collect();
        Self {
            secret: Secret::new(key),
            ttl: Duration::seconds(ttl_in_seconds),
        }
    }

    pub fn encode(&self, state: &ActionState) -> Result<String, StateTokenError> {
        self.encode_at(state, Utc::now())
    }

    fn encode_at(
        &self,
        state: &ActionState,
        now: DateTime<Utc>,
    ) -> Result<String, StateTokenError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(StateTokenError::UnexpectedError(
                "Duration out of range".to_string(),
            ))?
            .timestamp();

        let claims = StateClaims {
            purpose: state.purpose.as_str().to_string(),
            sub: state.subject.clone(),
            jti: state.nonce,
            exp,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )?)
    }

    pub fn decode(&self, token: &str) -> Result<ActionState, StateTokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<StateClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )?
        .claims;

        let purpose = claims
            .purpose
            .parse::<ActionPurpose>()
            .map_err(|e| StateTokenError::UnknownPurpose(e.0))?;

        Ok(ActionState {
            purpose,
            subject: claims.sub,
            nonce: claims.jti,
        })
    }
}
