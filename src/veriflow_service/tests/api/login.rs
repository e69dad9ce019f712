use crate::helpers::{ALICE, TestApp, location, query_param};

#[tokio::test]
async fn health_returns_ok() {
    let app = TestApp::new().await;

    let response = app.get("/health", None).await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn login_redirects_to_the_identity_provider() {
    let app = TestApp::new().await;

    let response = app.get("/login", None).await;

    assert!(response.status().is_redirection());
    let location = location(&response);
    assert!(location.starts_with(&format!("{}/authorize", app.identity_provider.uri())));
    assert_eq!(query_param(&location, "client_id").as_deref(), Some("veriflow"));
    assert_eq!(
        query_param(&location, "redirect_uri").as_deref(),
        Some("http://localhost:3000/auth/callback")
    );
    assert!(query_param(&location, "state").is_some());
}

#[tokio::test]
async fn callback_sets_the_auth_cookie() {
    let app = TestApp::new().await;

    let response = app.sign_in(ALICE).await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/requests");
    let cookie = response
        .headers()
        .get("set-cookie")
        .expect("auth cookie is set")
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("auth_token=alice-token"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age="));
}

#[tokio::test]
async fn callback_with_forged_state_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .get("/auth/callback?code=alice-code&state=forged", None)
        .await;

    assert_eq!(response.status().as_u16(), 401);
    assert!(response.headers().get("set-cookie").is_none());
}

#[tokio::test]
async fn callback_without_code_is_bad_request() {
    let app = TestApp::new().await;

    let response = app.get("/auth/callback?state=whatever", None).await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn protected_routes_require_the_cookie() {
    let app = TestApp::new().await;

    let response = app.get("/requests", None).await;

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn unknown_users_are_unauthorized_until_they_sign_in() {
    let app = TestApp::new().await;

    assert_eq!(app.get("/requests", Some(ALICE)).await.status().as_u16(), 401);

    app.sign_in(ALICE).await;

    assert_eq!(app.get("/requests", Some(ALICE)).await.status().as_u16(), 200);
}
