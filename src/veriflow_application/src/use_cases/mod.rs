pub mod approve;
pub mod auth_callback;
pub mod configure_user;
pub mod enroll_authenticator;
pub mod initiate_verification;
pub mod list_requests;
pub mod passkey_approval;
pub mod passkey_login;
pub mod passkey_registration;
pub mod report;
pub mod resolve_actor;
pub mod validate_authenticator;
pub mod verify_code;
pub mod view_request;

pub use approve::ApproveUseCase;
pub use auth_callback::{AuthCallbackUseCase, CallbackDestination, CallbackOutcome};
pub use configure_user::{ConfigureLink, ConfigureUserUseCase};
pub use enroll_authenticator::{AuthenticatorEnrollment, EnrollAuthenticatorUseCase};
pub use initiate_verification::{InitiateVerificationUseCase, NewVerification, PartyRef};
pub use list_requests::{ListRequestsUseCase, RequestsOverview};
pub use passkey_approval::PasskeyApprovalUseCase;
pub use passkey_login::PasskeyLoginUseCase;
pub use passkey_registration::PasskeyRegistrationUseCase;
pub use report::ReportUseCase;
pub use resolve_actor::ResolveActorUseCase;
pub use validate_authenticator::ValidateAuthenticatorUseCase;
pub use verify_code::VerifyCodeUseCase;
pub use view_request::ViewRequestUseCase;
