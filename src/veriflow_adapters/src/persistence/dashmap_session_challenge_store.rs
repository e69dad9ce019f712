use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use veriflow_core::{SessionChallenge, SessionChallengeStore, SessionChallengeStoreError, UserId};

/// In-process challenge store. `take` is a single map removal, so two
/// concurrent finishes can never both get the challenge.
#[derive(Default, Clone)]
pub struct DashMapSessionChallengeStore {
    challenges: Arc<DashMap<UserId, SessionChallenge>>,
}

impl DashMapSessionChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired challenges. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut purged = 0;
        self.challenges.retain(|_, challenge| {
            let keep = !challenge.is_expired(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }
}

#[async_trait::async_trait]
impl SessionChallengeStore for DashMapSessionChallengeStore {
    async fn put_challenge(
        &self,
        challenge: SessionChallenge,
    ) -> Result<(), SessionChallengeStoreError> {
        self.challenges.insert(challenge.user_id.clone(), challenge);
        Ok(())
    }

    async fn take_challenge(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SessionChallenge>, SessionChallengeStoreError> {
        Ok(self.challenges.remove(user_id).map(|(_, challenge)| challenge))
    }

    async fn delete_challenge(&self, user_id: &UserId) -> Result<(), SessionChallengeStoreError> {
        self.challenges.remove(user_id);
        Ok(())
    }
}
