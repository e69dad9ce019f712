use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize, Serializer};

use super::email::Email;

/// Stable user identifier: the originating channel's user id, or the e-mail
/// address for users first seen through the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity fields of a user as reported by the communication channel.
///
/// Verification requests keep a copy of this at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub image: Option<String>,
}

/// Time-based code secret and whether the user has proven possession of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondFactor {
    #[serde(serialize_with = "serialize_secret")]
    secret: Secret<String>,
    validated: bool,
}

impl SecondFactor {
    pub fn enrolled(secret: Secret<String>) -> Self {
        Self {
            secret,
            validated: false,
        }
    }

    pub fn secret(&self) -> &Secret<String> {
        &self.secret
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }
}

/// A registered public-key credential. `data` is the opaque credential
/// record owned by the ceremony implementation (public key, counter, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub id: String,
    pub registered_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    profile: UserProfile,
    second_factor: Option<SecondFactor>,
    credentials: Vec<StoredCredential>,
}

impl User {
    /// A user seen for the first time: no second factor, no credentials.
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            second_factor: None,
            credentials: Vec::new(),
        }
    }

    pub fn id(&self) -> &UserId {
        &self.profile.id
    }

    pub fn email(&self) -> &Email {
        &self.profile.email
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn second_factor(&self) -> Option<&SecondFactor> {
        self.second_factor.as_ref()
    }

    pub fn credentials(&self) -> &[StoredCredential] {
        &self.credentials
    }

    /// Replace the channel-provided identity fields. The id, second factor
    /// and credentials are kept.
    pub fn refresh_profile(&mut self, profile: UserProfile) {
        let id = self.profile.id.clone();
        self.profile = UserProfile { id, ..profile };
    }

    /// Store a freshly generated secret. A secret that already exists is
    /// never replaced.
    pub fn enroll_second_factor(&mut self, secret: Secret<String>) -> &SecondFactor {
        self.second_factor
            .get_or_insert_with(|| SecondFactor::enrolled(secret))
    }

    /// Returns true if this call flipped `validated` from false to true.
    pub fn mark_second_factor_validated(&mut self) -> bool {
        match self.second_factor.as_mut() {
            Some(factor) if !factor.validated => {
                factor.validated = true;
                true
            }
            _ => false,
        }
    }

    pub fn add_credential(&mut self, credential: StoredCredential) {
        self.credentials.retain(|existing| existing.id != credential.id);
        self.credentials.push(credential);
    }

    pub fn replace_credentials(&mut self, credentials: Vec<StoredCredential>) {
        self.credentials = credentials;
    }
}

fn serialize_secret<S>(secret: &Secret<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}
