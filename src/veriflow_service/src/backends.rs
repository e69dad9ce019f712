use std::time::Duration;

use reqwest::Client;
use veriflow_adapters::{
    ConfiguredIdentityProvider, ConfiguredProfileDirectory, ConfiguredSessionChallengeStore,
    ConfiguredUserStore, ConfiguredVerifyRequestStore, FactoryError, TotpRsVerifier,
    WebauthnCeremony,
    config::VeriflowSettings,
    factory::{
        build_ceremony, build_identity_provider, build_notifier, build_profile_directory,
        build_stores,
    },
};
use veriflow_application::{
    ChallengePolicy, RequestTransitions, UserDirectory, WorkflowPolicy, notification_queue,
};
use veriflow_axum::{AppState, Backend};
use veriflow_core::Notifier;

const CHALLENGE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// The adapters selected by [`VeriflowSettings`].
pub struct ConfiguredBackend;

impl Backend for ConfiguredBackend {
    type Requests = ConfiguredVerifyRequestStore;
    type Users = ConfiguredUserStore;
    type Challenges = ConfiguredSessionChallengeStore;
    type Identity = ConfiguredIdentityProvider;
    type Profiles = ConfiguredProfileDirectory;
    type Totp = TotpRsVerifier;
    type Ceremony = WebauthnCeremony;
}

/// Wire every adapter from the settings and start the notification worker.
pub async fn build_state(
    settings: &VeriflowSettings,
) -> Result<AppState<ConfiguredBackend>, FactoryError> {
    let notifier = build_notifier(settings, Client::new())?;
    build_state_with_notifier(settings, notifier).await
}

/// Same as [`build_state`] but delivering notifications through `notifier`.
///
/// Must be called inside a tokio runtime: the notification worker and the
/// challenge purge are spawned onto it.
pub async fn build_state_with_notifier<N>(
    settings: &VeriflowSettings,
    notifier: N,
) -> Result<AppState<ConfiguredBackend>, FactoryError>
where
    N: Notifier + 'static,
{
    let http_client = Client::new();
    let stores = build_stores(settings).await?;
    let identity = build_identity_provider(settings, http_client.clone()).await?;
    let profiles = build_profile_directory(settings, http_client)?;
    let ceremony = build_ceremony(settings)?;

    let (queue, worker) = notification_queue(notifier, stores.requests.clone());
    tokio::spawn(worker.run());

    if let ConfiguredSessionChallengeStore::Memory(challenges) = &stores.challenges {
        let challenges = challenges.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CHALLENGE_PURGE_INTERVAL);
            loop {
                interval.tick().await;
                let purged = challenges.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Purged expired session challenges");
                }
            }
        });
    }

    Ok(AppState {
        transitions: RequestTransitions::new(stores.requests, queue),
        directory: UserDirectory::new(stores.users.clone(), stores.challenges),
        users: stores.users,
        identity,
        profiles,
        totp: TotpRsVerifier::default(),
        ceremony,
        workflow: WorkflowPolicy {
            second_factor_required: settings.authenticator.enabled,
        },
        challenges: ChallengePolicy {
            ttl: chrono::Duration::seconds(settings.webauthn.challenge_ttl_in_seconds),
        },
        cookie_name: settings.auth.cookie_name.clone(),
    })
}
