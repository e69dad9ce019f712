use chrono::{DateTime, Utc};
use serde::Serialize;
use veriflow_application::{AuthenticatorEnrollment, RequestsOverview, TransitionOutcome};
use veriflow_core::{
    CommunicationTool, StoredCredential, User, UserProfile, VerifyRequest, VerifyRequestId,
    VerifyStatus, format_duration,
};

/// A verification request as shown to one of its parties.
///
/// Action links and second-factor evidence stay server side.
#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    pub id: VerifyRequestId,
    pub status: VerifyStatus,
    pub requestor: UserProfile,
    pub recipient: UserProfile,
    pub message: Option<String>,
    pub communication_tool: CommunicationTool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// `1h 2m 3s` style. Total time for terminal requests, time so far otherwise.
    pub elapsed: String,
    pub awaiting_second_factor: bool,
    pub error: Option<String>,
    pub permalink: Option<String>,
}

impl RequestView {
    pub fn new(request: &VerifyRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: *request.id(),
            status: request.status(),
            requestor: request.requestor().clone(),
            recipient: request.recipient().clone(),
            message: request.message().map(str::to_owned),
            communication_tool: request.communication_tool(),
            started_at: request.start(),
            ended_at: request.end(),
            elapsed: format_duration(request.elapsed(now)),
            awaiting_second_factor: request.awaiting_second_factor().is_some(),
            error: request.error().map(str::to_owned),
            permalink: request.permalink().map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewView {
    pub sent: Vec<RequestView>,
    pub received: Vec<RequestView>,
}

impl OverviewView {
    pub fn new(overview: &RequestsOverview, now: DateTime<Utc>) -> Self {
        Self {
            sent: overview.sent.iter().map(|r| RequestView::new(r, now)).collect(),
            received: overview
                .received
                .iter()
                .map(|r| RequestView::new(r, now))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Transitioned,
    Unchanged,
    AwaitingSecondFactor,
}

/// Result of an approve, report or second-factor call.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeView {
    pub outcome: Outcome,
    pub request: RequestView,
}

impl OutcomeView {
    pub fn new(outcome: &TransitionOutcome, now: DateTime<Utc>) -> Self {
        let kind = match outcome {
            TransitionOutcome::Transitioned(_) => Outcome::Transitioned,
            TransitionOutcome::Unchanged(_) => Outcome::Unchanged,
            TransitionOutcome::AwaitingSecondFactor(_) => Outcome::AwaitingSecondFactor,
        };
        Self {
            outcome: kind,
            request: RequestView::new(outcome.request(), now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatorView {
    pub provisioning_uri: String,
    pub validated: bool,
}

impl From<AuthenticatorEnrollment> for AuthenticatorView {
    fn from(enrollment: AuthenticatorEnrollment) -> Self {
        Self {
            provisioning_uri: enrollment.provisioning_uri,
            validated: enrollment.validated,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialView {
    pub id: String,
    pub registered_at: DateTime<Utc>,
}

impl From<&StoredCredential> for CredentialView {
    fn from(credential: &StoredCredential) -> Self {
        Self {
            id: credential.id.clone(),
            registered_at: credential.registered_at,
        }
    }
}

/// Second-factor settings of the signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    pub user: UserProfile,
    pub authenticator_enrolled: bool,
    pub authenticator_validated: bool,
    pub passkeys: Vec<CredentialView>,
}

impl From<&User> for SettingsView {
    fn from(user: &User) -> Self {
        Self {
            user: user.profile().clone(),
            authenticator_enrolled: user.second_factor().is_some(),
            authenticator_validated: user
                .second_factor()
                .is_some_and(|factor| factor.is_validated()),
            passkeys: user.credentials().iter().map(CredentialView::from).collect(),
        }
    }
}
