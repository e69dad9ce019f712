use std::sync::Arc;

use chrono::{Duration, Utc};
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, redis::Redis};
use tokio::sync::RwLock;
use veriflow_adapters::{
    PostgresUserStore, PostgresVerifyRequestStore, RedisSessionChallengeStore,
    factory::{configure_postgresql, get_redis_client},
};
use veriflow_core::{
    ActionLinks, CeremonyKind, CommunicationTool, Email, MessageRef, SessionChallenge,
    SessionChallengeStore, StatusUpdate, User, UserId, UserProfile, UserStore, VerifyRequest,
    VerifyRequestStore, VerifyStatus,
};

fn profile(id: &str) -> UserProfile {
    UserProfile {
        id: UserId::new(id),
        email: Email::parse(format!("{}@x.com", id.to_lowercase())).unwrap(),
        name: id.to_string(),
        image: None,
    }
}

fn links() -> ActionLinks {
    ActionLinks {
        authenticate: "a".to_string(),
        report: "r".to_string(),
        status: "s".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_postgres_stores_round_trip_and_compare_and_swap() {
    let container = postgres::Postgres::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");
    let pool = configure_postgresql(&url).await.unwrap();

    let users = PostgresUserStore::new(pool.clone());
    let user = User::new(profile("BOB"));
    users.save_user(user.clone()).await.unwrap();
    users.save_user(user.clone()).await.unwrap();
    assert_eq!(
        users.get_user_by_email(user.email()).await.unwrap().id(),
        user.id()
    );

    let requests = PostgresVerifyRequestStore::new(pool);
    let mut request = VerifyRequest::new(
        profile("ALICE"),
        profile("BOB"),
        Some("hello".to_string()),
        CommunicationTool::Api,
        Utc::now(),
    );
    requests.insert_request(request.clone()).await.unwrap();
    request.mark_sent(links()).unwrap();
    assert_eq!(
        requests
            .update_if_status(VerifyStatus::Received, &request)
            .await
            .unwrap(),
        StatusUpdate::Applied
    );
    requests
        .attach_artifacts(request.id(), vec![MessageRef::new("C1", "1.0")])
        .await
        .unwrap();

    let mut completed = request.clone();
    completed.complete(Utc::now()).unwrap();
    assert_eq!(
        requests
            .update_if_status(VerifyStatus::Sent, &completed)
            .await
            .unwrap(),
        StatusUpdate::Applied
    );

    // A second writer still expecting SENT loses.
    let stale = requests
        .update_if_status(VerifyStatus::Sent, &completed)
        .await
        .unwrap();
    assert!(matches!(stale, StatusUpdate::Rejected(_)));

    let stored = requests.get_request(request.id()).await.unwrap();
    assert_eq!(stored.status(), VerifyStatus::Completed);
    assert_eq!(stored.artifacts(), &[MessageRef::new("C1", "1.0")]);

    let bob = Email::parse("bob@x.com").unwrap();
    assert_eq!(requests.list_by_recipient(&bob).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_redis_challenge_is_taken_once() {
    let container = Redis::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(6379).await.unwrap();
    let conn = get_redis_client(&format!("{host}:{port}"))
        .unwrap()
        .get_connection()
        .unwrap();
    let store = RedisSessionChallengeStore::new(Arc::new(RwLock::new(conn)));

    let challenge = SessionChallenge::new(
        UserId::new("BOB"),
        CeremonyKind::Login,
        serde_json::json!({ "challenge": "abc" }),
        Utc::now(),
        Duration::minutes(5),
    );
    store.put_challenge(challenge.clone()).await.unwrap();

    let taken = store.take_challenge(&UserId::new("BOB")).await.unwrap();
    assert_eq!(taken.map(|c| c.state), Some(challenge.state));
    assert!(
        store
            .take_challenge(&UserId::new("BOB"))
            .await
            .unwrap()
            .is_none()
    );
}
