use std::sync::Arc;

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;
use veriflow_core::{
    CeremonyError, CeremonyStart, PublicKeyCeremony, StoredCredential, User,
};
use webauthn_rs::prelude::{
    CredentialID, Passkey, PasskeyAuthentication, PasskeyRegistration, PublicKeyCredential,
    RegisterPublicKeyCredential, Url, Webauthn, WebauthnBuilder, WebauthnError,
};

/// Passkey ceremonies backed by webauthn-rs. The relying-party id is the host
/// of the public base URL.
#[derive(Clone)]
pub struct WebauthnCeremony {
    webauthn: Arc<Webauthn>,
}

impl WebauthnCeremony {
    pub fn new(base_url: &str, rp_name: &str) -> Result<Self, CeremonyError> {
        let origin = Url::parse(base_url).map_err(unexpected)?;
        let rp_id = origin
            .host_str()
            .ok_or_else(|| CeremonyError::UnexpectedError(format!("{base_url} has no host")))?
            .to_string();

        let webauthn = WebauthnBuilder::new(&rp_id, &origin)
            .map_err(unexpected)?
            .rp_name(rp_name)
            .build()
            .map_err(unexpected)?;

        Ok(Self {
            webauthn: Arc::new(webauthn),
        })
    }

    /// Stable WebAuthn user handle for a user id.
    pub fn user_handle(user: &User) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, user.id().as_str().as_bytes())
    }

    fn passkeys(user: &User) -> Result<Vec<Passkey>, CeremonyError> {
        user.credentials()
            .iter()
            .map(|c| serde_json::from_value(c.data.clone()).map_err(invalid_state))
            .collect()
    }
}

fn unexpected(e: impl ToString) -> CeremonyError {
    CeremonyError::UnexpectedError(e.to_string())
}

fn invalid_state(e: impl ToString) -> CeremonyError {
    CeremonyError::InvalidState(e.to_string())
}

fn to_value<T: Serialize>(value: &T) -> Result<serde_json::Value, CeremonyError> {
    serde_json::to_value(value).map_err(unexpected)
}

fn parse_response<T: DeserializeOwned>(response: &serde_json::Value) -> Result<T, CeremonyError> {
    serde_json::from_value(response.clone())
        .map_err(|e| CeremonyError::InvalidResponse(e.to_string()))
}

fn credential_id(id: &CredentialID) -> Result<String, CeremonyError> {
    match to_value(id)? {
        serde_json::Value::String(id) => Ok(id),
        other => Ok(other.to_string()),
    }
}

fn stored_credential(passkey: &Passkey) -> Result<StoredCredential, CeremonyError> {
    Ok(StoredCredential {
        id: credential_id(passkey.cred_id())?,
        registered_at: Utc::now(),
        data: to_value(passkey)?,
    })
}

fn ceremony_failure(e: WebauthnError) -> CeremonyError {
    match e {
        WebauthnError::CredentialPossibleCompromise => CeremonyError::ReplayDetected,
        e => CeremonyError::InvalidResponse(e.to_string()),
    }
}

impl PublicKeyCeremony for WebauthnCeremony {
    #[tracing::instrument(
        name = "Starting passkey registration",
        skip_all,
        fields(user_id = %user.id())
    )]
    fn start_registration(&self, user: &User) -> Result<CeremonyStart, CeremonyError> {
        let exclude: Vec<CredentialID> = Self::passkeys(user)?
            .iter()
            .map(|p| p.cred_id().clone())
            .collect();
        let exclude = (!exclude.is_empty()).then_some(exclude);

        let (options, state) = self
            .webauthn
            .start_passkey_registration(
                Self::user_handle(user),
                user.email().as_str(),
                user.name(),
                exclude,
            )
            .map_err(unexpected)?;

        Ok(CeremonyStart {
            options: to_value(&options)?,
            state: to_value(&state)?,
        })
    }

    #[tracing::instrument(
        name = "Finishing passkey registration",
        skip_all,
        fields(user_id = %user.id())
    )]
    fn finish_registration(
        &self,
        user: &User,
        response: &serde_json::Value,
        state: &serde_json::Value,
    ) -> Result<StoredCredential, CeremonyError> {
        let state: PasskeyRegistration =
            serde_json::from_value(state.clone()).map_err(invalid_state)?;
        let response: RegisterPublicKeyCredential = parse_response(response)?;

        let passkey = self
            .webauthn
            .finish_passkey_registration(&response, &state)
            .map_err(ceremony_failure)?;

        stored_credential(&passkey)
    }

    #[tracing::instrument(name = "Starting passkey login", skip_all, fields(user_id = %user.id()))]
    fn start_login(&self, user: &User) -> Result<CeremonyStart, CeremonyError> {
        let passkeys = Self::passkeys(user)?;
        let (options, state) = self
            .webauthn
            .start_passkey_authentication(&passkeys)
            .map_err(unexpected)?;

        Ok(CeremonyStart {
            options: to_value(&options)?,
            state: to_value(&state)?,
        })
    }

    #[tracing::instrument(name = "Finishing passkey login", skip_all, fields(user_id = %user.id()))]
    fn finish_login(
        &self,
        user: &User,
        response: &serde_json::Value,
        state: &serde_json::Value,
    ) -> Result<Vec<StoredCredential>, CeremonyError> {
        let state: PasskeyAuthentication =
            serde_json::from_value(state.clone()).map_err(invalid_state)?;
        let response: PublicKeyCredential = parse_response(response)?;

        let result = self
            .webauthn
            .finish_passkey_authentication(&response, &state)
            .map_err(ceremony_failure)?;

        // Carry the new signature counter into the stored credentials.
        user.credentials()
            .iter()
            .map(|stored| {
                let mut passkey: Passkey =
                    serde_json::from_value(stored.data.clone()).map_err(invalid_state)?;
                passkey.update_credential(&result);
                Ok(StoredCredential {
                    id: stored.id.clone(),
                    registered_at: stored.registered_at,
                    data: to_value(&passkey)?,
                })
            })
            .collect()
    }
}
