use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File, FileFormat};
use reqwest::header::HeaderValue;
use secrecy::Secret;
use serde::{Deserialize, Deserializer};

use super::constants::{self, env, prod};
use crate::notification::MessageTemplates;

#[derive(Debug, Clone, Deserialize)]
pub struct VeriflowSettings {
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub communication: CommunicationSettings,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub authenticator: AuthenticatorSettings,
    #[serde(default)]
    pub webauthn: WebauthnSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub messages: MessageTemplates,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub address: String,
    /// Public URL of this service, used for callback URLs and the WebAuthn
    /// relying party.
    pub base_url: String,
    pub allowed_origins: Option<AllowedOrigins>,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            address: prod::APP_ADDRESS.to_string(),
            base_url: prod::BASE_URL.to_string(),
            allowed_origins: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProviderKind {
    Oidc,
    #[default]
    None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub provider: IdentityProviderKind,
    pub issuer: String,
    pub client_id: String,
    pub client_secret: Option<Secret<String>>,
    pub callback_path: String,
    pub cookie_name: String,
    /// Key for signing authorization states. A random key is used when unset.
    pub state_secret: Option<Secret<String>>,
    pub state_ttl_in_seconds: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            provider: IdentityProviderKind::default(),
            issuer: String::new(),
            client_id: String::new(),
            client_secret: None,
            callback_path: constants::DEFAULT_CALLBACK_PATH.to_string(),
            cookie_name: constants::DEFAULT_COOKIE_NAME.to_string(),
            state_secret: None,
            state_ttl_in_seconds: constants::DEFAULT_STATE_TTL_IN_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Slack,
    Email,
    #[default]
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommunicationSettings {
    pub active_service: ChannelKind,
    pub slack: SlackSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlackSettings {
    pub base_url: String,
    pub bot_token: Option<Secret<String>>,
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            base_url: prod::slack::BASE_URL.to_string(),
            bot_token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub enabled: bool,
    pub base_url: String,
    pub sender: String,
    pub auth_token: Option<Secret<String>>,
    pub timeout_in_millis: u64,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: prod::email_client::BASE_URL.to_string(),
            sender: prod::email_client::SENDER.to_string(),
            auth_token: None,
            timeout_in_millis: prod::email_client::TIMEOUT_IN_MILLIS,
        }
    }
}

/// When enabled, an approval only completes after a second factor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthenticatorSettings {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebauthnSettings {
    pub rp_name: String,
    pub challenge_ttl_in_seconds: i64,
}

impl Default for WebauthnSettings {
    fn default() -> Self {
        Self {
            rp_name: "Veriflow".to_string(),
            challenge_ttl_in_seconds: constants::DEFAULT_CHALLENGE_TTL_IN_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub postgres_url: Option<Secret<String>>,
    /// Session challenges go to Redis when set, otherwise they stay in
    /// process memory.
    pub redis_host_name: Option<String>,
}

impl VeriflowSettings {
    /// Load `.env`, the JSON file named by `VERIFLOW_CONFIG` (default
    /// `veriflow.json`, optional) and `VERIFLOW__SECTION__KEY` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = std::env::var(env::CONFIG_PATH_ENV_VAR)
            .unwrap_or_else(|_| constants::DEFAULT_CONFIG_FILE.to_string());

        Self::build(
            File::with_name(&path).format(FileFormat::Json).required(false),
            None,
        )
    }

    /// Settings from a JSON document, layered under the given variables
    /// instead of the process environment.
    pub fn from_json(json: &str, vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::build(File::from_str(json, FileFormat::Json), Some(vars))
    }

    fn build<F>(file: F, vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let environment = Environment::with_prefix(env::ENV_PREFIX)
            .prefix_separator(env::ENV_SEPARATOR)
            .separator(env::ENV_SEPARATOR)
            .try_parsing(true)
            .source(vars);

        Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// Absolute URL the identity provider redirects back to.
    pub fn callback_url(&self) -> String {
        format!(
            "{}{}",
            self.application.base_url.trim_end_matches('/'),
            self.auth.callback_path
        )
    }
}

/// Origins allowed to make credentialed cross-origin calls. Configured as a
/// list or as one comma separated string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllowedOrigins(Vec<String>);

impl AllowedOrigins {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            origins
                .into_iter()
                .map(Into::into)
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, origin: &HeaderValue) -> bool {
        origin
            .to_str()
            .map(|origin| self.0.iter().any(|allowed| allowed == origin))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for AllowedOrigins {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<String>),
            Joined(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::List(list) => Self::new(list),
            Raw::Joined(joined) => Self::new(joined.split(',')),
        })
    }
}
