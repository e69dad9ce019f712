use serde_json::{Value, json};
use totp_rs::TOTP;

use crate::helpers::{BOB, TestApp};

async fn provisioning_uri(app: &TestApp) -> String {
    let response = app.post("/api/authenticator", BOB, &json!({})).await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["validated"], false);
    body["provisioning_uri"].as_str().unwrap().to_string()
}

async fn enroll(app: &TestApp) -> TOTP {
    TOTP::from_url(&provisioning_uri(app).await).unwrap()
}

#[tokio::test]
async fn enrollment_is_stable_until_validated() {
    let app = TestApp::new().await;
    app.alice_verifies_bob().await;

    let first = provisioning_uri(&app).await;
    let second = provisioning_uri(&app).await;

    assert!(first.starts_with("otpauth://totp/"));
    assert_eq!(first, second);
}

#[tokio::test]
async fn wrong_code_does_not_validate() {
    let app = TestApp::new().await;
    app.alice_verifies_bob().await;
    enroll(&app).await;

    let response = app
        .post("/api/authenticator/validate", BOB, &json!({ "code": "abc" }))
        .await;

    assert_eq!(response.status().as_u16(), 401);
    let settings: Value = app.get("/settings", Some(BOB)).await.json().await.unwrap();
    assert_eq!(settings["authenticator_validated"], false);
}

#[tokio::test]
async fn code_approval_requires_a_validated_authenticator() {
    let app = TestApp::new().await;
    let request_id = app.alice_verifies_bob().await;

    let response = app
        .post(
            &format!("/requests/{request_id}/verify-code"),
            BOB,
            &json!({ "code": "123456" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.status_of(&request_id).await, "SENT");
}

#[tokio::test]
async fn current_code_completes_the_request() {
    let app = TestApp::new().await;
    let request_id = app.alice_verifies_bob().await;
    let totp = enroll(&app).await;

    let validated = app
        .post(
            "/api/authenticator/validate",
            BOB,
            &json!({ "code": totp.generate_current().unwrap() }),
        )
        .await;
    assert_eq!(validated.status().as_u16(), 200);

    let response = app
        .post(
            &format!("/requests/{request_id}/verify-code"),
            BOB,
            &json!({ "code": totp.generate_current().unwrap() }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(app.status_of(&request_id).await, "COMPLETED");
}
