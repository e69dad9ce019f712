use std::{collections::HashMap, time::Duration};

use reqwest::{Response, redirect::Policy};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use veriflow_adapters::{
    RecordingNotifier,
    config::{VeriflowSettings, constants::test},
};
use veriflow_service::{VeriflowService, build_state_with_notifier};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";
pub const EVE: &str = "eve@example.com";

pub struct TestApp {
    pub address: String,
    pub http_client: reqwest::Client,
    pub identity_provider: MockServer,
    pub notifier: RecordingNotifier,
}

impl TestApp {
    pub async fn new() -> Self {
        let identity_provider = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "authorization_endpoint": format!("{}/authorize", identity_provider.uri()),
                "token_endpoint": format!("{}/token", identity_provider.uri()),
                "userinfo_endpoint": format!("{}/userinfo", identity_provider.uri()),
            })))
            .mount(&identity_provider)
            .await;

        for email in [ALICE, BOB, EVE] {
            mount_identity(&identity_provider, email).await;
        }

        let settings = VeriflowSettings::from_json(
            &json!({
                "application": { "address": test::APP_ADDRESS, "base_url": "http://localhost:3000" },
                "auth": {
                    "provider": "oidc",
                    "issuer": identity_provider.uri(),
                    "client_id": "veriflow",
                    "client_secret": "client-secret",
                    "state_secret": "state-signing-key"
                },
                "communication": { "active_service": "none" },
                "storage": { "backend": "memory" }
            })
            .to_string(),
            HashMap::new(),
        )
        .expect("Failed to build test settings");

        let notifier = RecordingNotifier::new();
        let state = build_state_with_notifier(&settings, notifier.clone())
            .await
            .expect("Failed to build app state");

        let listener = TcpListener::bind(test::APP_ADDRESS)
            .await
            .expect("Failed to bind test listener");
        let address = format!("http://{}", listener.local_addr().unwrap());

        let service = VeriflowService::new(state, &settings.auth.callback_path);
        tokio::spawn(service.run_standalone(listener, None));

        let http_client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self {
            address,
            http_client,
            identity_provider,
            notifier,
        }
    }

    /// Full browser sign-in: `/login`, then the provider callback.
    pub async fn sign_in(&self, email: &str) -> Response {
        let response = self.get("/login", None).await;
        let location = location(&response);
        let state = query_param(&location, "state").expect("login link has a state");

        self.get(
            &format!("/auth/callback?code={}&state={state}", code_for(email)),
            None,
        )
        .await
    }

    pub async fn get(&self, route: &str, as_user: Option<&str>) -> Response {
        let mut request = self.http_client.get(format!("{}{route}", self.address));
        if let Some(email) = as_user {
            request = request.header("Cookie", format!("auth_token={}", token_for(email)));
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn post<B: serde::Serialize>(
        &self,
        route: &str,
        as_user: &str,
        body: &B,
    ) -> Response {
        self.http_client
            .post(format!("{}{route}", self.address))
            .header("Cookie", format!("auth_token={}", token_for(as_user)))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_slack_command(&self, user_id: &str, text: &str) -> Value {
        self.http_client
            .post(format!("{}/slack/veriflow", self.address))
            .form(&[("user_id", user_id), ("text", text)])
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .unwrap()
    }

    /// Alice signs in and asks Bob to verify. Returns the request id.
    pub async fn alice_verifies_bob(&self) -> String {
        assert!(self.sign_in(ALICE).await.status().is_redirection());

        let response = self
            .post("/api/verify", ALICE, &json!({ "recipient": BOB }))
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn status_of(&self, request_id: &str) -> String {
        let body: Value = self
            .get(&format!("/requests/{request_id}"), Some(ALICE))
            .await
            .json()
            .await
            .unwrap();
        body["status"].as_str().unwrap().to_string()
    }

    /// Notifications are delivered by a background worker.
    pub async fn wait_for_event(&self, event: &str, count: usize) {
        for _ in 0..50 {
            if self.notifier.count(event) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!(
            "expected {count} {event} notifications, got {:?}",
            self.notifier.events()
        );
    }
}

fn user_part(email: &str) -> &str {
    email.split('@').next().unwrap()
}

fn code_for(email: &str) -> String {
    format!("{}-code", user_part(email))
}

fn token_for(email: &str) -> String {
    format!("{}-token", user_part(email))
}

async fn mount_identity(server: &MockServer, email: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(format!("code={}", code_for(email))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token_for(email),
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("Authorization", format!("Bearer {}", token_for(email)).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": user_part(email),
            "email": email,
            "name": user_part(email)
        })))
        .mount(server)
        .await;
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get("location")
        .expect("redirect has a location")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
