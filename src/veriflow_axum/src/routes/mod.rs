pub mod authenticator;
pub mod callback;
pub mod health;
pub mod login;
pub mod passkeys;
pub mod requests;
pub mod slack;
pub mod verify;

pub use authenticator::{
    ValidateAuthenticatorRequest, enroll_authenticator, settings, validate_authenticator,
};
pub use callback::{CallbackParams, auth_callback};
pub use health::health;
pub use login::login;
pub use passkeys::{begin_registration, finish_registration};
pub use requests::{
    VerifyCodeRequest, approve, begin_passkey_approval, finish_passkey_approval, list_requests,
    report, verify_code, view_request,
};
pub use slack::{SlashCommandForm, SlashCommandReply, slack_command};
pub use verify::{VerifyRequestBody, initiate_verification};
