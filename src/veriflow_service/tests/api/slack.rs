use crate::helpers::{ALICE, BOB, TestApp};

#[tokio::test]
async fn help_lists_the_commands() {
    let app = TestApp::new().await;

    let reply = app.post_slack_command(ALICE, "help").await;

    assert_eq!(reply["response_type"], "ephemeral");
    assert!(reply["text"].as_str().unwrap().contains("/veriflow verify"));
}

#[tokio::test]
async fn verify_without_mention_explains_usage() {
    let app = TestApp::new().await;

    let reply = app.post_slack_command(ALICE, "verify bob").await;

    assert!(reply["text"].as_str().unwrap().contains("mention"));
}

#[tokio::test]
async fn verify_command_sends_a_request() {
    let app = TestApp::new().await;

    let reply = app
        .post_slack_command(ALICE, &format!("verify <@{BOB}|bob>"))
        .await;

    assert!(reply["text"].as_str().unwrap().contains("Verification request sent"));
    app.wait_for_event("sent", 1).await;
    let events = app.notifier.events();
    let sent = events.iter().find(|e| e.event == "sent").unwrap();
    assert_eq!(app.status_of(&sent.request_id).await, "SENT");
}

#[tokio::test]
async fn configure_command_returns_a_sign_in_link() {
    let app = TestApp::new().await;

    let reply = app.post_slack_command(BOB, "configure").await;

    let text = reply["text"].as_str().unwrap();
    assert!(text.contains(&format!("{}/authorize", app.identity_provider.uri())));
}
