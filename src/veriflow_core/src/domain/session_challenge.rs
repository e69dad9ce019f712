use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CeremonyKind {
    Registration,
    Login,
}

/// Server side state of an in-flight public-key ceremony.
///
/// At most one exists per user. It is consumed by the finish step whatever
/// the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionChallenge {
    pub user_id: UserId,
    pub kind: CeremonyKind,
    pub state: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionChallenge {
    pub fn new(
        user_id: UserId,
        kind: CeremonyKind,
        state: serde_json::Value,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            user_id,
            kind,
            state,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
