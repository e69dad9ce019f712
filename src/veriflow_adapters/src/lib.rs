pub mod config;
pub mod factory;
pub mod identity;
pub mod notification;
pub mod persistence;
pub mod second_factor;
pub mod slack_command;

pub use factory::{FactoryError, Stores};
pub use identity::{
    ConfiguredIdentityProvider, DisabledIdentityProvider, OidcClientConfig, OidcProvider,
    StateTokenCodec,
};
pub use notification::{
    ConfiguredProfileDirectory, EmailProfileDirectory, MessageTemplates, NotificationDispatcher,
    PostmarkEmailNotifier, RecordingNotifier, SlackNotifier,
};
pub use persistence::{
    ConfiguredSessionChallengeStore, ConfiguredUserStore, ConfiguredVerifyRequestStore,
    DashMapSessionChallengeStore, HashMapUserStore, HashMapVerifyRequestStore, PostgresUserStore,
    PostgresVerifyRequestStore, RedisSessionChallengeStore,
};
pub use second_factor::{TotpRsVerifier, WebauthnCeremony};
pub use slack_command::SlackCommand;
