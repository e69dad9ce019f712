use veriflow_application::{
    ChallengePolicy, RequestTransitions, UserDirectory, WorkflowPolicy,
};
use veriflow_core::{
    IdentityProvider, ProfileDirectory, PublicKeyCeremony, SessionChallengeStore, TotpVerifier,
    UserStore, VerifyRequestStore,
};

/// The set of adapters a running service is wired with.
///
/// Implemented by a marker type so handlers stay generic over storage and
/// external services without carrying seven type parameters each.
pub trait Backend: Send + Sync + 'static {
    type Requests: VerifyRequestStore + Clone + 'static;
    type Users: UserStore + Clone + 'static;
    type Challenges: SessionChallengeStore + Clone + 'static;
    type Identity: IdentityProvider + Clone + 'static;
    type Profiles: ProfileDirectory + Clone + 'static;
    type Totp: TotpVerifier + Clone + 'static;
    type Ceremony: PublicKeyCeremony + Clone + 'static;
}

/// Shared state of every route.
pub struct AppState<B: Backend> {
    pub transitions: RequestTransitions<B::Requests>,
    pub directory: UserDirectory<B::Users, B::Challenges>,
    pub users: B::Users,
    pub identity: B::Identity,
    pub profiles: B::Profiles,
    pub totp: B::Totp,
    pub ceremony: B::Ceremony,
    pub workflow: WorkflowPolicy,
    pub challenges: ChallengePolicy,
    /// Name of the cookie carrying the identity provider access token.
    pub cookie_name: String,
}

impl<B: Backend> AppState<B> {
    pub fn requests(&self) -> B::Requests {
        self.transitions.store().clone()
    }
}

impl<B: Backend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            transitions: self.transitions.clone(),
            directory: self.directory.clone(),
            users: self.users.clone(),
            identity: self.identity.clone(),
            profiles: self.profiles.clone(),
            totp: self.totp.clone(),
            ceremony: self.ceremony.clone(),
            workflow: self.workflow,
            challenges: self.challenges,
            cookie_name: self.cookie_name.clone(),
        }
    }
}
