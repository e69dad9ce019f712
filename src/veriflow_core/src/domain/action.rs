use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// What the holder of an authorization link is trying to do once the
/// identity provider sends them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPurpose {
    Login,
    Configure,
    #[serde(rename = "auth")]
    Authenticate,
    Report,
    Status,
}

impl ActionPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Configure => "configure",
            Self::Authenticate => "auth",
            Self::Report => "report",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for ActionPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown action purpose: {0}")]
pub struct UnknownPurpose(pub String);

impl FromStr for ActionPurpose {
    type Err = UnknownPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "configure" => Ok(Self::Configure),
            "auth" => Ok(Self::Authenticate),
            "report" => Ok(Self::Report),
            "status" => Ok(Self::Status),
            other => Err(UnknownPurpose(other.to_string())),
        }
    }
}

/// Decoded authorization state: purpose, the subject it is bound to (a
/// request id or a user id, empty for plain login) and a per-link nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionState {
    pub purpose: ActionPurpose,
    pub subject: String,
    pub nonce: Uuid,
}

impl ActionState {
    pub fn new(purpose: ActionPurpose, subject: impl Into<String>) -> Self {
        Self {
            purpose,
            subject: subject.into(),
            nonce: Uuid::new_v4(),
        }
    }
}
