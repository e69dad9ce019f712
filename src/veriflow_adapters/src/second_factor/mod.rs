pub mod totp_rs_verifier;
pub mod webauthn_ceremony;

pub use totp_rs_verifier::TotpRsVerifier;
pub use webauthn_ceremony::WebauthnCeremony;
