pub mod configured;
pub mod dashmap_session_challenge_store;
pub mod hashmap_user_store;
pub mod hashmap_verify_request_store;
pub mod postgres_user_store;
pub mod postgres_verify_request_store;
pub mod redis_session_challenge_store;

pub use configured::{
    ConfiguredSessionChallengeStore, ConfiguredUserStore, ConfiguredVerifyRequestStore,
};
pub use dashmap_session_challenge_store::DashMapSessionChallengeStore;
pub use hashmap_user_store::HashMapUserStore;
pub use hashmap_verify_request_store::HashMapVerifyRequestStore;
pub use postgres_user_store::PostgresUserStore;
pub use postgres_verify_request_store::PostgresVerifyRequestStore;
pub use redis_session_challenge_store::RedisSessionChallengeStore;
