//! Builds the configured variants of every port from [`VeriflowSettings`].

use std::{sync::Arc, time::Duration};

use redis::{Client as RedisClient, RedisResult};
use reqwest::Client;
use secrecy::ExposeSecret;
use sqlx::{PgPool, postgres::PgPoolOptions};
use thiserror::Error;
use tokio::sync::RwLock;
use veriflow_core::{CeremonyError, Email, EmailError, IdentityProviderError};

use crate::{
    config::{ChannelKind, IdentityProviderKind, StorageBackend, VeriflowSettings},
    identity::{
        ConfiguredIdentityProvider, DisabledIdentityProvider, OidcClientConfig, OidcProvider,
        StateTokenCodec,
    },
    notification::{
        ConfiguredProfileDirectory, EmailProfileDirectory, NotificationDispatcher,
        PostmarkEmailNotifier, SlackNotifier,
    },
    persistence::{
        ConfiguredSessionChallengeStore, ConfiguredUserStore, ConfiguredVerifyRequestStore,
        DashMapSessionChallengeStore, HashMapUserStore, HashMapVerifyRequestStore,
        PostgresUserStore, PostgresVerifyRequestStore, RedisSessionChallengeStore,
    },
    second_factor::WebauthnCeremony,
};

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Missing setting: {0}")]
    MissingSetting(&'static str),
    #[error("Invalid e-mail setting: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("Identity provider error: {0}")]
    IdentityProvider(#[from] IdentityProviderError),
    #[error("WebAuthn setup error: {0}")]
    Ceremony(#[from] CeremonyError),
}

/// Stores chosen by `storage`.
#[derive(Clone)]
pub struct Stores {
    pub users: ConfiguredUserStore,
    pub requests: ConfiguredVerifyRequestStore,
    pub challenges: ConfiguredSessionChallengeStore,
}

pub async fn build_stores(settings: &VeriflowSettings) -> Result<Stores, FactoryError> {
    let (users, requests) = match settings.storage.backend {
        StorageBackend::Memory => (
            ConfiguredUserStore::Memory(HashMapUserStore::new()),
            ConfiguredVerifyRequestStore::Memory(HashMapVerifyRequestStore::new()),
        ),
        StorageBackend::Postgres => {
            let url = settings
                .storage
                .postgres_url
                .as_ref()
                .ok_or(FactoryError::MissingSetting("storage.postgres_url"))?;
            let pool = configure_postgresql(url.expose_secret()).await?;
            (
                ConfiguredUserStore::Postgres(PostgresUserStore::new(pool.clone())),
                ConfiguredVerifyRequestStore::Postgres(PostgresVerifyRequestStore::new(pool)),
            )
        }
    };

    let challenges = match &settings.storage.redis_host_name {
        Some(host) => {
            let conn = get_redis_client(host)?.get_connection()?;
            ConfiguredSessionChallengeStore::Redis(RedisSessionChallengeStore::new(Arc::new(
                RwLock::new(conn),
            )))
        }
        None => ConfiguredSessionChallengeStore::Memory(DashMapSessionChallengeStore::new()),
    };

    Ok(Stores {
        users,
        requests,
        challenges,
    })
}

/// Create a pool and run the embedded migrations.
#[tracing::instrument(name = "Configuring PostgreSQL", skip_all)]
pub async fn configure_postgresql(url: &str) -> Result<PgPool, FactoryError> {
    let pg_pool = get_postgres_pool(url).await?;
    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    Ok(pg_pool)
}

pub async fn get_postgres_pool(url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(5).connect(url).await
}

pub fn get_redis_client(redis_hostname: &str) -> RedisResult<RedisClient> {
    let redis_url = format!("redis://{}/", redis_hostname);
    redis::Client::open(redis_url)
}

pub async fn build_identity_provider(
    settings: &VeriflowSettings,
    http_client: Client,
) -> Result<ConfiguredIdentityProvider, FactoryError> {
    let auth = &settings.auth;
    match auth.provider {
        IdentityProviderKind::None => {
            tracing::warn!("No identity provider configured, every sign-in will be refused");
            Ok(ConfiguredIdentityProvider::Disabled(DisabledIdentityProvider))
        }
        IdentityProviderKind::Oidc => {
            let client_secret = auth
                .client_secret
                .clone()
                .ok_or(FactoryError::MissingSetting("auth.client_secret"))?;
            let state_codec = match &auth.state_secret {
                Some(secret) => StateTokenCodec::new(secret, auth.state_ttl_in_seconds),
                None => {
                    tracing::warn!("auth.state_secret is unset, using a random signing key");
                    StateTokenCodec::ephemeral(auth.state_ttl_in_seconds)
                }
            };
            let config = OidcClientConfig {
                issuer: auth.issuer.clone(),
                client_id: auth.client_id.clone(),
                client_secret,
                redirect_uri: settings.callback_url(),
            };
            let provider = OidcProvider::discover(config, state_codec, http_client).await?;
            Ok(ConfiguredIdentityProvider::Oidc(provider))
        }
    }
}

/// Notification channels: the active chat service plus e-mail when enabled.
pub fn build_notifier(
    settings: &VeriflowSettings,
    http_client: Client,
) -> Result<NotificationDispatcher, FactoryError> {
    let mut dispatcher = NotificationDispatcher::new();

    if settings.communication.active_service == ChannelKind::Slack {
        dispatcher =
            dispatcher.with_channel("slack", Arc::new(slack_notifier(settings, http_client)?));
    }

    let email = &settings.email;
    if email.enabled || settings.communication.active_service == ChannelKind::Email {
        let auth_token = email
            .auth_token
            .clone()
            .ok_or(FactoryError::MissingSetting("email.auth_token"))?;
        let email_client = Client::builder()
            .timeout(Duration::from_millis(email.timeout_in_millis))
            .build()?;
        dispatcher = dispatcher.with_channel(
            "email",
            Arc::new(PostmarkEmailNotifier::new(
                email.base_url.clone(),
                Email::parse(&email.sender)?,
                auth_token,
                settings.messages.clone(),
                email_client,
            )),
        );
    }

    tracing::info!(channels = ?dispatcher.channel_names(), "Notification channels configured");
    Ok(dispatcher)
}

pub fn build_profile_directory(
    settings: &VeriflowSettings,
    http_client: Client,
) -> Result<ConfiguredProfileDirectory, FactoryError> {
    match settings.communication.active_service {
        ChannelKind::Slack => Ok(ConfiguredProfileDirectory::Slack(slack_notifier(
            settings,
            http_client,
        )?)),
        ChannelKind::Email | ChannelKind::None => {
            Ok(ConfiguredProfileDirectory::Email(EmailProfileDirectory))
        }
    }
}

pub fn build_ceremony(settings: &VeriflowSettings) -> Result<WebauthnCeremony, FactoryError> {
    Ok(WebauthnCeremony::new(
        &settings.application.base_url,
        &settings.webauthn.rp_name,
    )?)
}

fn slack_notifier(
    settings: &VeriflowSettings,
    http_client: Client,
) -> Result<SlackNotifier, FactoryError> {
    let slack = &settings.communication.slack;
    let bot_token = slack
        .bot_token
        .clone()
        .ok_or(FactoryError::MissingSetting("communication.slack.bot_token"))?;
    Ok(SlackNotifier::new(
        slack.base_url.clone(),
        bot_token,
        settings.messages.clone(),
        http_client,
    ))
}
