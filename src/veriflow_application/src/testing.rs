//! In-memory collaborators shared by the unit tests of this crate.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, Secret};
use tokio::sync::RwLock;
use veriflow_core::{
    AccessToken, ActionLinks, ActionPurpose, ActionState, CeremonyError, CeremonyStart,
    CommunicationTool, Email, Identity, IdentityProvider, IdentityProviderError, MessageRef,
    Notifier, NotifyError, ProfileDirectory, ProfileDirectoryError, PublicKeyCeremony,
    SessionChallenge, SessionChallengeStore, SessionChallengeStoreError, StatusUpdate,
    StoredCredential, TotpEnrollment, TotpError, TotpVerifier, User, UserId, UserProfile,
    UserStore, UserStoreError, VerifyRequest, VerifyRequestId, VerifyRequestStore,
    VerifyRequestStoreError, VerifyStatus,
};

use crate::{
    directory::UserDirectory,
    notifications::{NotificationEvent, NotificationWorker, notification_queue},
    transitions::RequestTransitions,
};

pub const VALID_CODE: &str = "123456";

pub fn profile(id: &str, email: &str) -> UserProfile {
    UserProfile {
        id: UserId::new(id),
        email: Email::parse(email).unwrap(),
        name: id.to_string(),
        image: None,
    }
}

pub fn sent_request() -> VerifyRequest {
    let mut request = VerifyRequest::new(
        profile("UALICE", "alice@x.com"),
        profile("UBOB", "bob@x.com"),
        None,
        CommunicationTool::Slack,
        Utc::now(),
    );
    request
        .mark_sent(ActionLinks {
            authenticate: "https://idp.test/auth".to_string(),
            report: "https://idp.test/report".to_string(),
            status: "https://idp.test/status".to_string(),
        })
        .unwrap();
    request
}

#[derive(Default, Clone)]
pub struct InMemoryUsers {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

#[async_trait::async_trait]
impl UserStore for InMemoryUsers {
    async fn save_user(&self, user: User) -> Result<(), UserStoreError> {
        self.users.write().await.insert(user.id().clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserStoreError> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|user| user.email() == email)
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryRequests {
    requests: Arc<RwLock<HashMap<VerifyRequestId, VerifyRequest>>>,
}

#[async_trait::async_trait]
impl VerifyRequestStore for InMemoryRequests {
    async fn insert_request(&self, request: VerifyRequest) -> Result<(), VerifyRequestStoreError> {
        self.requests.write().await.insert(*request.id(), request);
        Ok(())
    }

    async fn get_request(
        &self,
        id: &VerifyRequestId,
    ) -> Result<VerifyRequest, VerifyRequestStoreError> {
        self.requests
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(VerifyRequestStoreError::RequestNotFound)
    }

    async fn list_by_requestor(
        &self,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|r| &r.requestor().email == email)
            .cloned()
            .collect())
    }

    async fn list_by_recipient(
        &self,
        email: &Email,
    ) -> Result<Vec<VerifyRequest>, VerifyRequestStoreError> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|r| &r.recipient().email == email)
            .cloned()
            .collect())
    }

    async fn update_if_status(
        &self,
        expected: VerifyStatus,
        request: &VerifyRequest,
    ) -> Result<StatusUpdate, VerifyRequestStoreError> {
        let mut requests = self.requests.write().await;
        let stored = requests
            .get_mut(request.id())
            .ok_or(VerifyRequestStoreError::RequestNotFound)?;
        if stored.status() != expected {
            return Ok(StatusUpdate::Rejected(Box::new(stored.clone())));
        }
        let mut next = request.clone();
        next.keep_delivery_records(stored);
        *stored = next;
        Ok(StatusUpdate::Applied)
    }

    async fn attach_artifacts(
        &self,
        id: &VerifyRequestId,
        artifacts: Vec<MessageRef>,
    ) -> Result<(), VerifyRequestStoreError> {
        let mut requests = self.requests.write().await;
        let stored = requests
            .get_mut(id)
            .ok_or(VerifyRequestStoreError::RequestNotFound)?;
        stored.attach_artifacts(artifacts);
        Ok(())
    }

    async fn set_permalink(
        &self,
        id: &VerifyRequestId,
        permalink: String,
    ) -> Result<(), VerifyRequestStoreError> {
        let mut requests = self.requests.write().await;
        let stored = requests
            .get_mut(id)
            .ok_or(VerifyRequestStoreError::RequestNotFound)?;
        stored.set_permalink(permalink);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryChallenges {
    challenges: Arc<Mutex<HashMap<UserId, SessionChallenge>>>,
}

impl InMemoryChallenges {
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.challenges.lock().unwrap().contains_key(user_id)
    }
}

#[async_trait::async_trait]
impl SessionChallengeStore for InMemoryChallenges {
    async fn put_challenge(
        &self,
        challenge: SessionChallenge,
    ) -> Result<(), SessionChallengeStoreError> {
        self.challenges
            .lock()
            .unwrap()
            .insert(challenge.user_id.clone(), challenge);
        Ok(())
    }

    async fn take_challenge(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SessionChallenge>, SessionChallengeStoreError> {
        Ok(self.challenges.lock().unwrap().remove(user_id))
    }

    async fn delete_challenge(&self, user_id: &UserId) -> Result<(), SessionChallengeStoreError> {
        self.challenges.lock().unwrap().remove(user_id);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<(NotificationEvent, VerifyRequestId)>>>,
    deleted: Arc<Mutex<Vec<MessageRef>>>,
}

impl RecordingNotifier {
    pub fn count(&self, event: NotificationEvent) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == event)
            .count()
    }

    pub fn terminal_events(&self) -> usize {
        self.count(NotificationEvent::Completed) + self.count(NotificationEvent::Failed)
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deleted.lock().unwrap().clone()
    }

    fn record(&self, event: NotificationEvent, request: &VerifyRequest) -> Vec<MessageRef> {
        self.events.lock().unwrap().push((event, *request.id()));
        vec![MessageRef::new("C1", format!("{event:?}-{}", request.id()))]
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn on_initiated(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        Ok(self.record(NotificationEvent::Initiated, request))
    }

    async fn on_sent(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        Ok(self.record(NotificationEvent::Sent, request))
    }

    async fn on_completed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        Ok(self.record(NotificationEvent::Completed, request))
    }

    async fn on_failed(&self, request: &VerifyRequest) -> Result<Vec<MessageRef>, NotifyError> {
        Ok(self.record(NotificationEvent::Failed, request))
    }

    async fn delete_ephemeral_artifact(&self, artifact: &MessageRef) -> Result<(), NotifyError> {
        self.deleted.lock().unwrap().push(artifact.clone());
        Ok(())
    }

    async fn fetch_permanent_reference(
        &self,
        artifact: &MessageRef,
    ) -> Result<Option<String>, NotifyError> {
        Ok(Some(format!("https://chat.test/{}", artifact.message_id)))
    }
}

/// Links look like `https://idp.test/authorize?state=<purpose>:<subject>:<nonce>`,
/// codes are the e-mail of the user who logged in, tokens are `token:<email>`.
#[derive(Default, Clone)]
pub struct StubIdentityProvider;

pub fn state_of(link: &str) -> &str {
    link.split("state=").nth(1).unwrap()
}

fn identity_for(email: &str) -> Result<Identity, IdentityProviderError> {
    let email =
        Email::parse(email).map_err(|e| IdentityProviderError::Unauthorized(e.to_string()))?;
    Ok(Identity {
        claims: serde_json::json!({ "email": email.as_str() }),
        email,
        name: None,
    })
}

#[async_trait::async_trait]
impl IdentityProvider for StubIdentityProvider {
    fn generate_auth_link(
        &self,
        purpose: ActionPurpose,
        subject: &str,
    ) -> Result<String, IdentityProviderError> {
        let state = ActionState::new(purpose, subject);
        Ok(format!(
            "https://idp.test/authorize?state={}:{}:{}",
            state.purpose, state.subject, state.nonce
        ))
    }

    fn decode_state(&self, state: &str) -> Result<ActionState, IdentityProviderError> {
        let mut parts = state.splitn(3, ':');
        let purpose = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| IdentityProviderError::InvalidState(state.to_string()))?;
        let subject = parts.next().unwrap_or_default();
        Ok(ActionState::new(purpose, subject))
    }

    async fn exchange_code(
        &self,
        code: &str,
    ) -> Result<(Identity, AccessToken), IdentityProviderError> {
        let identity = identity_for(code)?;
        let token = AccessToken::new(
            Secret::new(format!("token:{code}")),
            Utc::now() + Duration::hours(1),
        );
        Ok((identity, token))
    }

    async fn introspect(&self, token: &Secret<String>) -> Result<Identity, IdentityProviderError> {
        let email = token
            .expose_secret()
            .strip_prefix("token:")
            .ok_or_else(|| IdentityProviderError::Unauthorized("unknown token".to_string()))?;
        identity_for(email)
    }
}

#[derive(Default, Clone)]
pub struct StubProfiles {
    profiles: HashMap<String, UserProfile>,
}

impl StubProfiles {
    pub fn with(mut self, profile: UserProfile) -> Self {
        self.profiles.insert(profile.id.to_string(), profile);
        self
    }
}

#[async_trait::async_trait]
impl ProfileDirectory for StubProfiles {
    async fn lookup(&self, external_id: &str) -> Result<UserProfile, ProfileDirectoryError> {
        self.profiles
            .get(external_id)
            .cloned()
            .ok_or_else(|| ProfileDirectoryError::UserNotFound(external_id.to_string()))
    }
}

/// Accepts [`VALID_CODE`] for any secret.
#[derive(Default, Clone)]
pub struct StubTotp;

impl TotpVerifier for StubTotp {
    fn enroll(&self, account: &str) -> Result<TotpEnrollment, TotpError> {
        let secret = Secret::new(format!("SECRET{}", account.len()));
        let provisioning_uri = self.provisioning_uri(&secret, account)?;
        Ok(TotpEnrollment {
            secret,
            provisioning_uri,
        })
    }

    fn provisioning_uri(
        &self,
        secret: &Secret<String>,
        account: &str,
    ) -> Result<String, TotpError> {
        Ok(format!(
            "otpauth://totp/Veriflow:{account}?secret={}",
            secret.expose_secret()
        ))
    }

    fn verify(
        &self,
        _secret: &Secret<String>,
        code: &str,
        _at: chrono::DateTime<Utc>,
    ) -> Result<bool, TotpError> {
        Ok(code == VALID_CODE)
    }
}

/// Responses `{"valid": true, "id": ..}` pass, `{"replay": true}` is a
/// counter regression, anything else is rejected.
#[derive(Default, Clone)]
pub struct StubCeremony;

fn check_response(response: &serde_json::Value) -> Result<(), CeremonyError> {
    if response["replay"] == serde_json::Value::Bool(true) {
        return Err(CeremonyError::ReplayDetected);
    }
    if response["valid"] != serde_json::Value::Bool(true) {
        return Err(CeremonyError::InvalidResponse("bad signature".to_string()));
    }
    Ok(())
}

impl PublicKeyCeremony for StubCeremony {
    fn start_registration(&self, user: &User) -> Result<CeremonyStart, CeremonyError> {
        Ok(CeremonyStart {
            options: serde_json::json!({
                "challenge": user.id().as_str(),
                "exclude": user.credentials().iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
            }),
            state: serde_json::json!({ "user": user.id().as_str() }),
        })
    }

    fn finish_registration(
        &self,
        _user: &User,
        response: &serde_json::Value,
        _state: &serde_json::Value,
    ) -> Result<StoredCredential, CeremonyError> {
        check_response(response)?;
        Ok(StoredCredential {
            id: response["id"].as_str().unwrap_or("cred").to_string(),
            registered_at: Utc::now(),
            data: serde_json::json!({ "counter": 0 }),
        })
    }

    fn start_login(&self, user: &User) -> Result<CeremonyStart, CeremonyError> {
        Ok(CeremonyStart {
            options: serde_json::json!({
                "allow": user.credentials().iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
            }),
            state: serde_json::json!({ "user": user.id().as_str() }),
        })
    }

    fn finish_login(
        &self,
        user: &User,
        response: &serde_json::Value,
        _state: &serde_json::Value,
    ) -> Result<Vec<StoredCredential>, CeremonyError> {
        check_response(response)?;
        Ok(user
            .credentials()
            .iter()
            .cloned()
            .map(|mut credential| {
                credential.data = serde_json::json!({ "counter": 1 });
                credential
            })
            .collect())
    }
}

/// Stores, queue and worker wired together for workflow tests.
pub struct Harness {
    pub users: InMemoryUsers,
    pub requests: InMemoryRequests,
    pub challenges: InMemoryChallenges,
    pub notifier: RecordingNotifier,
    pub transitions: RequestTransitions<InMemoryRequests>,
    pub worker: NotificationWorker<RecordingNotifier, InMemoryRequests>,
    pub profiles: StubProfiles,
}

impl Harness {
    pub fn new() -> Self {
        let users = InMemoryUsers::default();
        let requests = InMemoryRequests::default();
        let challenges = InMemoryChallenges::default();
        let notifier = RecordingNotifier::default();
        let (queue, worker) = notification_queue(notifier.clone(), requests.clone());
        let profiles = StubProfiles::default()
            .with(profile("UALICE", "alice@x.com"))
            .with(profile("UBOB", "bob@x.com"))
            .with(profile("UEVE", "eve@x.com"));

        Self {
            users,
            requests: requests.clone(),
            challenges,
            notifier,
            transitions: RequestTransitions::new(requests, queue),
            worker,
            profiles,
        }
    }

    pub fn directory(&self) -> UserDirectory<InMemoryUsers, InMemoryChallenges> {
        UserDirectory::new(self.users.clone(), self.challenges.clone())
    }

    /// Persist a SENT alice -> bob request and register all three users.
    pub async fn seed_sent_request(&self) -> VerifyRequest {
        for (id, email) in [
            ("UALICE", "alice@x.com"),
            ("UBOB", "bob@x.com"),
            ("UEVE", "eve@x.com"),
        ] {
            self.users
                .save_user(User::new(profile(id, email)))
                .await
                .unwrap();
        }
        let request = sent_request();
        self.requests.insert_request(request.clone()).await.unwrap();
        request
    }

    pub async fn user(&self, id: &str) -> User {
        self.users.get_user(&UserId::new(id)).await.unwrap()
    }

    pub async fn stored(&self, request: &VerifyRequest) -> VerifyRequest {
        self.requests.get_request(request.id()).await.unwrap()
    }
}
