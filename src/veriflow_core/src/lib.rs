pub mod domain;
pub mod ports;

pub use domain::{
    action::{ActionPurpose, ActionState, UnknownPurpose},
    email::{Email, EmailError},
    identity::{AccessToken, Identity},
    message_ref::MessageRef,
    session_challenge::{CeremonyKind, SessionChallenge},
    user::{SecondFactor, StoredCredential, User, UserId, UserProfile},
    verify_request::{
        ActionLinks, CommunicationTool, FailureReason, Party, VerifyRequest, VerifyRequestError,
        VerifyRequestId, VerifyStatus, format_duration,
    },
};
pub use ports::{
    repositories::{
        SessionChallengeStore, SessionChallengeStoreError, StatusUpdate, UserStore, UserStoreError,
        VerifyRequestStore, VerifyRequestStoreError,
    },
    services::{
        CeremonyError, CeremonyStart, IdentityProvider, IdentityProviderError, Notifier,
        NotifyError, ProfileDirectory, ProfileDirectoryError, PublicKeyCeremony, TotpEnrollment,
        TotpError, TotpVerifier,
    },
};
