use std::sync::Arc;

use chrono::Utc;
use redis::{Commands, Connection};
use tokio::sync::RwLock;
use veriflow_core::{SessionChallenge, SessionChallengeStore, SessionChallengeStoreError, UserId};

/// Challenge store shared between instances. Redis expires keys on its own;
/// `take` uses GETDEL so a challenge is handed out at most once.
#[derive(Clone)]
pub struct RedisSessionChallengeStore {
    conn: Arc<RwLock<Connection>>,
}

impl RedisSessionChallengeStore {
    pub fn new(conn: Arc<RwLock<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl SessionChallengeStore for RedisSessionChallengeStore {
    #[tracing::instrument(name = "Storing session challenge in Redis", skip_all)]
    async fn put_challenge(
        &self,
        challenge: SessionChallenge,
    ) -> Result<(), SessionChallengeStoreError> {
        let key = get_key(&challenge.user_id);
        let ttl = (challenge.expires_at - Utc::now()).num_seconds().max(1) as u64;
        let value = serde_json::to_string(&challenge)
            .map_err(|e| SessionChallengeStoreError::UnexpectedError(e.to_string()))?;

        let mut conn = self.conn.write().await;
        conn.set_ex(key, value, ttl)
            .map_err(|e| SessionChallengeStoreError::UnexpectedError(e.to_string()))
    }

    #[tracing::instrument(name = "Taking session challenge from Redis", skip_all)]
    async fn take_challenge(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SessionChallenge>, SessionChallengeStoreError> {
        let key = get_key(user_id);
        let value: Option<String> = {
            let mut conn = self.conn.write().await;
            conn.get_del(key)
                .map_err(|e| SessionChallengeStoreError::UnexpectedError(e.to_string()))?
        };

        value
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| SessionChallengeStoreError::UnexpectedError(e.to_string()))
    }

    async fn delete_challenge(&self, user_id: &UserId) -> Result<(), SessionChallengeStoreError> {
        let key = get_key(user_id);
        let mut conn = self.conn.write().await;
        conn.del(key)
            .map_err(|e| SessionChallengeStoreError::UnexpectedError(e.to_string()))
    }
}

const SESSION_CHALLENGE_KEY_PREFIX: &str = "session_challenge:";

fn get_key(user_id: &UserId) -> String {
    format!("{}{}", SESSION_CHALLENGE_KEY_PREFIX, user_id)
}
