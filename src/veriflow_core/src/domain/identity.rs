use chrono::{DateTime, Utc};
use secrecy::Secret;

use super::email::Email;

/// Verified identity returned by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub email: Email,
    pub name: Option<String>,
    /// Raw user-info claims, kept as audit evidence.
    pub claims: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: Secret<String>,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: Secret<String>, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}
