use std::sync::LazyLock;

use regex::Regex;

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@([^>|]+)").expect("mention regex is valid"));

pub const USAGE: &str = "*Veriflow commands*\n\
    `/veriflow verify @user` asks a user to prove who they are\n\
    `/veriflow configure` sets up your authenticator app and passkeys\n\
    `/veriflow help` shows this message";

/// A parsed `/veriflow` slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlackCommand {
    Help,
    /// Verify the chat user with this id.
    Verify(String),
    Configure,
    /// `verify` without a user mention.
    MissingMention,
    Unknown(String),
}

impl SlackCommand {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (name, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));

        match name.to_lowercase().as_str() {
            "" | "help" => Self::Help,
            "configure" => Self::Configure,
            "verify" => match mentioned_user(rest) {
                Some(user) => Self::Verify(user),
                None => Self::MissingMention,
            },
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// First user id in a `<@ID>` or `<@ID|name>` mention.
pub fn mentioned_user(text: &str) -> Option<String> {
    MENTION
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
