use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{email::Email, message_ref::MessageRef, user::UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifyRequestId(Uuid);

impl VerifyRequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Result<Self, VerifyRequestError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| VerifyRequestError::InvalidId(raw.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VerifyRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VerifyRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifyStatus {
    Received,
    Sent,
    Completed,
    Failed,
}

impl VerifyStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Sent => "SENT",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerifyStatus {
    type Err = VerifyRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIVED" => Ok(Self::Received),
            "SENT" => Ok(Self::Sent),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(VerifyRequestError::InvalidStatus(other.to_string())),
        }
    }
}

/// Channel the request originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationTool {
    Slack,
    Api,
}

/// The three provider redirect links handed to the recipient. Each one
/// carries its own signed state bound to the request id and a purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLinks {
    pub authenticate: String,
    pub report: String,
    pub status: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyRequestError {
    #[error("Invalid verification request id: {0}")]
    InvalidId(String),
    #[error("Invalid verification status: {0}")]
    InvalidStatus(String),
    #[error("Cannot move verification request from {from} to {to}")]
    InvalidTransition { from: VerifyStatus, to: VerifyStatus },
    #[error("Verification request is {0}, expected SENT")]
    NotPending(VerifyStatus),
}

/// Why a request ended in FAILED. Rendered into the request's `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    ReportedByRecipient,
    IdentityMismatch {
        actor: Email,
        requestor: Email,
        recipient: Email,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReportedByRecipient => f.write_str(
                "Reported by recipient. Please refrain from the conversation, \
                 the incident has been reported to security",
            ),
            Self::IdentityMismatch {
                actor,
                requestor,
                recipient,
            } => write!(
                f,
                "Request failed! The authenticated user email [{actor}] does not match \
                 the recipient [{recipient}] of the request from [{requestor}]"
            ),
        }
    }
}

/// Which side of a request an identity is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Requestor,
    Recipient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyRequest {
    id: VerifyRequestId,
    requestor: UserProfile,
    recipient: UserProfile,
    status: VerifyStatus,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    message: Option<String>,
    communication_tool: CommunicationTool,
    action_links: Option<ActionLinks>,
    second_factor_proof: Option<serde_json::Value>,
    awaiting_second_factor: Option<DateTime<Utc>>,
    error: Option<String>,
    #[serde(default)]
    artifacts: Vec<MessageRef>,
    permalink: Option<String>,
}

impl VerifyRequest {
    pub fn new(
        requestor: UserProfile,
        recipient: UserProfile,
        message: Option<String>,
        communication_tool: CommunicationTool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: VerifyRequestId::new(),
            requestor,
            recipient,
            status: VerifyStatus::Received,
            start: now,
            end: None,
            message,
            communication_tool,
            action_links: None,
            second_factor_proof: None,
            awaiting_second_factor: None,
            error: None,
            artifacts: Vec::new(),
            permalink: None,
        }
    }

    pub fn id(&self) -> &VerifyRequestId {
        &self.id
    }

    pub fn requestor(&self) -> &UserProfile {
        &self.requestor
    }

    pub fn recipient(&self) -> &UserProfile {
        &self.recipient
    }

    pub fn status(&self) -> VerifyStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn communication_tool(&self) -> CommunicationTool {
        self.communication_tool
    }

    pub fn action_links(&self) -> Option<&ActionLinks> {
        self.action_links.as_ref()
    }

    pub fn second_factor_proof(&self) -> Option<&serde_json::Value> {
        self.second_factor_proof.as_ref()
    }

    pub fn awaiting_second_factor(&self) -> Option<DateTime<Utc>> {
        self.awaiting_second_factor
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn artifacts(&self) -> &[MessageRef] {
        &self.artifacts
    }

    pub fn permalink(&self) -> Option<&str> {
        self.permalink.as_deref()
    }

    pub fn party_of(&self, email: &Email) -> Option<Party> {
        if &self.recipient.email == email {
            Some(Party::Recipient)
        } else if &self.requestor.email == email {
            Some(Party::Requestor)
        } else {
            None
        }
    }

    pub fn is_recipient(&self, email: &Email) -> bool {
        &self.recipient.email == email
    }

    pub fn mismatch(&self, actor: &Email) -> FailureReason {
        FailureReason::IdentityMismatch {
            actor: actor.clone(),
            requestor: self.requestor.email.clone(),
            recipient: self.recipient.email.clone(),
        }
    }

    /// RECEIVED -> SENT once the action links exist.
    pub fn mark_sent(&mut self, links: ActionLinks) -> Result<(), VerifyRequestError> {
        self.guard(VerifyStatus::Received, VerifyStatus::Sent)?;
        self.action_links = Some(links);
        self.status = VerifyStatus::Sent;
        Ok(())
    }

    /// SENT -> COMPLETED.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), VerifyRequestError> {
        self.guard(VerifyStatus::Sent, VerifyStatus::Completed)?;
        self.status = VerifyStatus::Completed;
        self.end = Some(now.max(self.start));
        Ok(())
    }

    /// RECEIVED or SENT -> FAILED.
    pub fn fail(
        &mut self,
        reason: &FailureReason,
        now: DateTime<Utc>,
    ) -> Result<(), VerifyRequestError> {
        if self.status.is_terminal() {
            return Err(VerifyRequestError::InvalidTransition {
                from: self.status,
                to: VerifyStatus::Failed,
            });
        }
        self.status = VerifyStatus::Failed;
        self.error = Some(reason.to_string());
        self.end = Some(now.max(self.start));
        Ok(())
    }

    /// Approval was accepted but completion waits for a second factor.
    /// The first marker wins.
    pub fn await_second_factor(&mut self, now: DateTime<Utc>) -> Result<(), VerifyRequestError> {
        self.require_pending()?;
        self.awaiting_second_factor.get_or_insert(now);
        Ok(())
    }

    /// Keep the identity-provider claims of the recipient's authentication.
    pub fn record_identity_proof(
        &mut self,
        claims: serde_json::Value,
    ) -> Result<(), VerifyRequestError> {
        self.require_pending()?;
        self.second_factor_proof = Some(claims);
        Ok(())
    }

    pub fn attach_artifacts(&mut self, artifacts: impl IntoIterator<Item = MessageRef>) {
        self.artifacts.extend(artifacts);
    }

    pub fn set_permalink(&mut self, permalink: String) {
        self.permalink = Some(permalink);
    }

    /// Take over the notification records of a stored copy. Status writers
    /// never own artifacts or the permalink.
    pub fn keep_delivery_records(&mut self, stored: &VerifyRequest) {
        self.artifacts = stored.artifacts.clone();
        self.permalink = stored.permalink.clone();
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.end.unwrap_or(now) - self.start
    }

    fn guard(&self, from: VerifyStatus, to: VerifyStatus) -> Result<(), VerifyRequestError> {
        if self.status == from {
            Ok(())
        } else {
            Err(VerifyRequestError::InvalidTransition {
                from: self.status,
                to,
            })
        }
    }

    fn require_pending(&self) -> Result<(), VerifyRequestError> {
        if self.status == VerifyStatus::Sent {
            Ok(())
        } else {
            Err(VerifyRequestError::NotPending(self.status))
        }
    }
}

/// Human readable duration such as `1h 2m 3s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m {seconds}s"),
        _ => format!("{hours}h {minutes}m {seconds}s"),
    }
}
