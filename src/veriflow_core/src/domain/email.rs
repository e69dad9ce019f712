use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email address: {0}")]
    Invalid(String),
}

/// Normalized (trimmed, lowercase) e-mail address.
///
/// E-mail is the anchor that binds an authenticated identity to a party of a
/// verification request, so comparisons must not depend on letter case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, EmailError> {
        let normalized = raw.as_ref().trim().to_lowercase();
        if EMAIL_REGEX.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(EmailError::Invalid(raw.as_ref().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
