//! # Veriflow - identity verification between colleagues
//!
//! This is a facade crate that re-exports the public APIs of the Veriflow
//! components. A requestor asks a recipient to prove who they are; the
//! recipient signs in with the organisation's identity provider and may be
//! asked for a second factor (a TOTP code or a passkey) before the request
//! completes.
//!
//! ## Structure
//!
//! - **Core domain types**: `Email`, `User`, `VerifyRequest`, `SessionChallenge`, ...
//! - **Ports**: `UserStore`, `VerifyRequestStore`, `SessionChallengeStore`,
//!   `IdentityProvider`, `Notifier`, `ProfileDirectory`, `TotpVerifier`,
//!   `PublicKeyCeremony`
//! - **Use cases**: `InitiateVerificationUseCase`, `ApproveUseCase`, ...
//! - **Adapters**: in-memory, Postgres and Redis stores, the OIDC client,
//!   Slack and Postmark notifiers, totp-rs and webauthn-rs verifiers
//! - **Service**: `VeriflowService` - router, CORS and tracing layers

// ============================================================================
// Core Domain Types
// ============================================================================

/// Core domain types and value objects
pub mod core {
    pub use veriflow_core::*;
}

pub use veriflow_core::{
    AccessToken, ActionPurpose, ActionState, CommunicationTool, Email, Identity, MessageRef,
    SessionChallenge, User, UserId, UserProfile, VerifyRequest, VerifyRequestId, VerifyStatus,
};

// ============================================================================
// Ports
// ============================================================================

/// Repository trait definitions
pub mod repositories {
    pub use veriflow_core::{
        SessionChallengeStore, SessionChallengeStoreError, StatusUpdate, UserStore,
        UserStoreError, VerifyRequestStore, VerifyRequestStoreError,
    };
}

pub use veriflow_core::{
    IdentityProvider, Notifier, ProfileDirectory, PublicKeyCeremony, SessionChallengeStore,
    TotpVerifier, UserStore, VerifyRequestStore,
};

// ============================================================================
// Use Cases (Application Layer)
// ============================================================================

/// Application use cases, the transition engine and the notification queue
pub mod use_cases {
    pub use veriflow_application::*;
}

pub use veriflow_application::{
    ApproveUseCase, AuthCallbackUseCase, InitiateVerificationUseCase, ReportUseCase,
    VerificationError, VerifyCodeUseCase,
};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters
pub mod adapters {
    /// Persistence implementations
    pub mod persistence {
        pub use veriflow_adapters::persistence::*;
    }

    /// Identity provider client
    pub mod identity {
        pub use veriflow_adapters::identity::*;
    }

    /// Notification channels
    pub mod notification {
        pub use veriflow_adapters::notification::*;
    }

    /// Second factor verifiers
    pub mod second_factor {
        pub use veriflow_adapters::second_factor::*;
    }

    /// Configuration
    pub mod config {
        pub use veriflow_adapters::config::*;
    }

    /// Builders for the configured adapters
    pub mod factory {
        pub use veriflow_adapters::factory::*;
    }
}

pub use veriflow_adapters::{
    HashMapUserStore, HashMapVerifyRequestStore, OidcProvider, PostgresUserStore,
    PostgresVerifyRequestStore, PostmarkEmailNotifier, RedisSessionChallengeStore, SlackNotifier,
    TotpRsVerifier, WebauthnCeremony, config::VeriflowSettings,
};

// ============================================================================
// HTTP
// ============================================================================

/// Axum routes, extractors and error mapping
pub mod http {
    pub use veriflow_axum::*;
}

/// Main service
pub use veriflow_service::{ConfiguredBackend, VeriflowService, build_state};

// ============================================================================
// Re-export common external dependencies
// ============================================================================

/// Re-export async-trait for implementing the port traits
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};
