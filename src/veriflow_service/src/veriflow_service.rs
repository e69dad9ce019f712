use axum::{
    Router,
    http::{HeaderValue, Method, request},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use veriflow_adapters::config::AllowedOrigins;
use veriflow_axum::{
    AppState, Backend,
    routes::{
        approve, auth_callback, begin_passkey_approval, begin_registration, enroll_authenticator,
        finish_passkey_approval, finish_registration, health, initiate_verification,
        list_requests, login, report, settings, slack_command, validate_authenticator,
        verify_code, view_request,
    },
};

use crate::tracing::{make_span_with_request_id, on_request, on_response};

/// The Veriflow HTTP service: browser callbacks, the JSON API and the chat
/// slash command.
pub struct VeriflowService {
    router: Router,
}

impl VeriflowService {
    /// Create the service from a fully wired state.
    ///
    /// `callback_path` is where the identity provider redirects back to and
    /// must match the redirect URI registered with it.
    pub fn new<B: Backend>(state: AppState<B>, callback_path: &str) -> Self {
        let router = Router::new()
            .route("/health", get(health))
            .route("/login", get(login::<B>))
            .route(callback_path, get(auth_callback::<B>))
            .route("/settings", get(settings))
            .route("/requests", get(list_requests::<B>))
            .route("/requests/{id}", get(view_request::<B>))
            .route("/requests/{id}/approve", post(approve::<B>))
            .route("/requests/{id}/report", post(report::<B>))
            .route("/requests/{id}/verify-code", post(verify_code::<B>))
            .route(
                "/requests/{id}/passkey/begin",
                post(begin_passkey_approval::<B>),
            )
            .route(
                "/requests/{id}/passkey/finish",
                post(finish_passkey_approval::<B>),
            )
            .route("/api/verify", post(initiate_verification::<B>))
            .route("/api/authenticator", post(enroll_authenticator::<B>))
            .route(
                "/api/authenticator/validate",
                post(validate_authenticator::<B>),
            )
            .route(
                "/api/passkeys/register/begin",
                post(begin_registration::<B>),
            )
            .route(
                "/api/passkeys/register/finish",
                post(finish_registration::<B>),
            )
            .route("/slack/veriflow", post(slack_command::<B>))
            .with_state(state);

        Self { router }
    }

    fn with_trace_layer(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span_with_request_id)
                .on_request(on_request)
                .on_response(on_response),
        );
        self
    }

    /// Convert the service into a router that can be mounted on another router
    pub fn as_nested_router(mut self, allowed_origins: Option<AllowedOrigins>) -> Router {
        if let Some(allowed_origins) = allowed_origins.filter(|origins| !origins.is_empty()) {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(
                    move |origin: &HeaderValue, _request_parts: &request::Parts| {
                        allowed_origins.contains(origin)
                    },
                ));

            self.router = self.router.layer(cors);
        }
        self.with_trace_layer().router
    }

    /// Run the service as a standalone server
    pub async fn run_standalone(
        self,
        listener: TcpListener,
        allowed_origins: Option<AllowedOrigins>,
    ) -> Result<(), std::io::Error> {
        let router = self.as_nested_router(allowed_origins);

        tracing::info!("Veriflow listening on {}", listener.local_addr()?);

        axum_server::Server::<std::net::SocketAddr>::from_listener(listener)
            .serve(router.into_make_service())
            .await
    }
}
