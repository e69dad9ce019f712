use serde_json::{Value, json};

use crate::helpers::{BOB, TestApp};

fn forged_credential() -> Value {
    json!({
        "id": "AAAA",
        "rawId": "AAAA",
        "type": "public-key",
        "response": {
            "clientDataJSON": "e30",
            "attestationObject": "oA"
        },
        "extensions": {}
    })
}

#[tokio::test]
async fn registration_options_name_the_relying_party() {
    let app = TestApp::new().await;
    app.alice_verifies_bob().await;

    let response = app
        .post("/api/passkeys/register/begin", BOB, &json!({}))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let options: Value = response.json().await.unwrap();
    assert_eq!(options["publicKey"]["rp"]["id"], "localhost");
}

#[tokio::test]
async fn forged_registration_consumes_the_challenge() {
    let app = TestApp::new().await;
    app.alice_verifies_bob().await;
    app.post("/api/passkeys/register/begin", BOB, &json!({}))
        .await;

    let forged = app
        .post("/api/passkeys/register/finish", BOB, &forged_credential())
        .await;
    assert_eq!(forged.status().as_u16(), 400);

    let retried = app
        .post("/api/passkeys/register/finish", BOB, &forged_credential())
        .await;
    assert_eq!(retried.status().as_u16(), 400);
    let body: Value = retried.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("No pending challenge"));
}

#[tokio::test]
async fn passkey_approval_without_credentials_is_rejected() {
    let app = TestApp::new().await;
    let request_id = app.alice_verifies_bob().await;

    let begin = app
        .post(&format!("/requests/{request_id}/passkey/begin"), BOB, &json!({}))
        .await;
    assert_eq!(begin.status().as_u16(), 400);

    let finish = app
        .post(
            &format!("/requests/{request_id}/passkey/finish"),
            BOB,
            &forged_credential(),
        )
        .await;
    assert_eq!(finish.status().as_u16(), 400);
    assert_eq!(app.status_of(&request_id).await, "SENT");
}
