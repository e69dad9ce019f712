use veriflow_core::{
    Email, MessageRef, SessionChallenge, SessionChallengeStore, SessionChallengeStoreError,
    StatusUpdate, User, UserId, UserStore, UserStoreError, VerifyRequest, VerifyRequestId,
    VerifyRequestStore, VerifyRequestStoreError, VerifyStatus,
};

use super::{
    DashMapSessionChallengeStore, HashMapUserStore, HashMapVerifyRequestStore, PostgresUserStore,
    PostgresVerifyRequestStore, RedisSessionChallengeStore,
};

/// User store selected by `storage.backend`.
#[derive(Clone)]
pub enum ConfiguredUserStore {
    Memory(HashMapUserStore),
    Postgres(PostgresUserStore),
}

#[async_trait::async_trait]
impl UserStore for ConfiguredUserStore {
    async fn save_user(&self, user: User) -> Result<(), UserStoreError> {
        match self {
            Self::Memory(store) => store.save_user(user).await,
            Self::Postgres(store) => store.save_user(user).await,
        }
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserStoreError> {
        match self {
            Self::Memory(store) => store.get_user(id).await,
            Self::Postgres(store) => store.get_user(id).await,
        }
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        match self {
            Self::Memory(store) => store.get_user_by_email(email).await,
            Self::Postgres(store) => store.get_user_by_email(email).await,
        }
    }
}

/// Request store selected by `storage.backend`.
#[derive(Clone)]
pub enum ConfiguredVerifyRequestStore {
    Memory(HashMapVerifyRequestStore),
    Postgres(PostgresVerifyRequestStore),
}

#[async_trait::async_trait]
impl VerifyRequestStore for ConfiguredVerifyRequestStore {
    async fn insert_request(&self, request: VerifyRequest) -> Result<(), VerifyRequestStoreError> {
        match self {
            Self::Memory(store) => store.insert_request(request).await,
            Self::Postgres(store) => store.insert_request(request).await,
        }
    }

    async fn get_request(
        &self,
        id: &VerifyRequestId,
    ) -> Result<VerifyRequest, VerifyRequestStoreError> {
        match self {
            Self::Memory(store) => store.get_request(id).await,
            Self::Postgres(store) => store.get_request(id).await,
        }
    }

    async fn list_by_requestor(
        &self,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError> {
        match self {
            Self::Memory(store) => store.list_by_requestor(email).await,
            Self::Postgres(store) => store.list_by_requestor(email).await,
        }
    }

    async fn list_by_recipient(
        &self,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError> {
        match self {
            Self::Memory(store) => store.list_by_recipient(email).await,
            Self::Postgres(store) => store.list_by_recipient(email).await,
        }
    }

    async fn update_if_status(
        &self,
        expected: VerifyStatus,
        request: &VerifyRequest,
    ) -> Result<StatusUpdate, VerifyRequestStoreError> {
        match self {
            Self::Memory(store) => store.update_if_status(expected, request).await,
            Self::Postgres(store) => store.update_if_status(expected, request).await,
        }
    }

    async fn attach_artifacts(
        &self,
        id: &VerifyRequestId,
        artifacts: Vec<MessageRef>,
    ) -> Result<(), VerifyRequestStoreError> {
        match self {
            Self::Memory(store) => store.attach_artifacts(id, artifacts).await,
            Self::Postgres(store) => store.attach_artifacts(id, artifacts).await,
        }
    }

    async fn set_permalink(
        &self,
        id: &VerifyRequestId,
        permalink: String,
    ) -> Result<(), VerifyRequestStoreError> {
        match self {
            Self::Memory(store) => store.set_permalink(id, permalink).await,
            Self::Postgres(store) => store.set_permalink(id, permalink).await,
        }
    }
}

/// Challenge store: Redis when a host is configured, process memory otherwise.
#[derive(Clone)]
pub enum ConfiguredSessionChallengeStore {
    Memory(DashMapSessionChallengeStore),
    Redis(RedisSessionChallengeStore),
}

#[async_trait::async_trait]
impl SessionChallengeStore for ConfiguredSessionChallengeStore {
    async fn put_challenge(
        &self,
        challenge: SessionChallenge,
    ) -> Result<(), SessionChallengeStoreError> {
        match self {
            Self::Memory(store) => store.put_challenge(challenge).await,
            Self::Redis(store) => store.put_challenge(challenge).await,
        }
    }

    async fn take_challenge(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SessionChallenge>, SessionChallengeStoreError> {
        match self {
            Self::Memory(store) => store.take_challenge(user_id).await,
            Self::Redis(store) => store.take_challenge(user_id).await,
        }
    }

    async fn delete_challenge(&self, user_id: &UserId) -> Result<(), SessionChallengeStoreError> {
        match self {
            Self::Memory(store) => store.delete_challenge(user_id).await,
            Self::Redis(store) => store.delete_challenge(user_id).await,
        }
    }
}
