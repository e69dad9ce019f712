use serde_json::{Value, json};

use crate::helpers::{ALICE, BOB, EVE, TestApp};

#[tokio::test]
async fn initiated_request_is_sent_to_the_recipient() {
    let app = TestApp::new().await;

    let request_id = app.alice_verifies_bob().await;

    assert_eq!(app.status_of(&request_id).await, "SENT");
    app.wait_for_event("sent", 1).await;

    let overview: Value = app.get("/requests", Some(BOB)).await.json().await.unwrap();
    assert_eq!(overview["received"][0]["id"], request_id.as_str());
    assert_eq!(overview["received"][0]["requestor"]["email"], ALICE);
    assert!(overview["sent"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn recipient_approval_completes_the_request() {
    let app = TestApp::new().await;
    let request_id = app.alice_verifies_bob().await;

    let response = app
        .post(&format!("/requests/{request_id}/approve"), BOB, &json!({}))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "transitioned");
    assert_eq!(body["request"]["status"], "COMPLETED");
    assert!(body["request"]["elapsed"].as_str().unwrap().ends_with('s'));
    assert_eq!(app.status_of(&request_id).await, "COMPLETED");
    app.wait_for_event("completed", 1).await;
}

#[tokio::test]
async fn stranger_approval_fails_the_request() {
    let app = TestApp::new().await;
    let request_id = app.alice_verifies_bob().await;
    app.sign_in(EVE).await;

    let response = app
        .post(&format!("/requests/{request_id}/approve"), EVE, &json!({}))
        .await;

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(app.status_of(&request_id).await, "FAILED");
    app.wait_for_event("failed", 1).await;

    let body: Value = app
        .get(&format!("/requests/{request_id}"), Some(ALICE))
        .await
        .json()
        .await
        .unwrap();
    assert!(body["error"].as_str().unwrap().contains(EVE));
}

#[tokio::test]
async fn stranger_cannot_view_a_request() {
    let app = TestApp::new().await;
    let request_id = app.alice_verifies_bob().await;
    app.sign_in(EVE).await;

    let response = app.get(&format!("/requests/{request_id}"), Some(EVE)).await;

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(app.status_of(&request_id).await, "SENT");
}

#[tokio::test]
async fn report_fails_the_request_and_later_approval_changes_nothing() {
    let app = TestApp::new().await;
    let request_id = app.alice_verifies_bob().await;

    let reported: Value = app
        .post(&format!("/requests/{request_id}/report"), BOB, &json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(reported["request"]["status"], "FAILED");

    let response = app
        .post(&format!("/requests/{request_id}/approve"), BOB, &json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let approved: Value = response.json().await.unwrap();
    assert_eq!(approved["outcome"], "unchanged");
    assert_eq!(approved["request"]["status"], "FAILED");
    assert_eq!(app.status_of(&request_id).await, "FAILED");
}

#[tokio::test]
async fn requestor_cannot_approve_their_own_request() {
    let app = TestApp::new().await;
    let request_id = app.alice_verifies_bob().await;

    let response = app
        .post(&format!("/requests/{request_id}/approve"), ALICE, &json!({}))
        .await;

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(app.status_of(&request_id).await, "FAILED");
}

#[tokio::test]
async fn self_verification_is_rejected() {
    let app = TestApp::new().await;
    app.sign_in(ALICE).await;

    let response = app
        .post("/api/verify", ALICE, &json!({ "recipient": ALICE }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let overview: Value = app.get("/requests", Some(ALICE)).await.json().await.unwrap();
    assert!(overview["sent"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_and_unknown_request_ids() {
    let app = TestApp::new().await;
    app.sign_in(ALICE).await;

    let malformed = app.get("/requests/not-a-uuid", Some(ALICE)).await;
    assert_eq!(malformed.status().as_u16(), 400);

    let unknown = app
        .get(
            "/requests/6f1c2a52-0d5e-4d5c-9a59-4a4f3b1f8e11",
            Some(ALICE),
        )
        .await;
    assert_eq!(unknown.status().as_u16(), 404);
}
