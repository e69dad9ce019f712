pub mod constants;
pub mod settings;

pub use constants::*;
pub use settings::{
    AllowedOrigins, ApplicationSettings, AuthSettings, AuthenticatorSettings, ChannelKind,
    CommunicationSettings, EmailSettings, IdentityProviderKind, SlackSettings, StorageBackend,
    StorageSettings, VeriflowSettings, WebauthnSettings,
};
