mod authenticator;
mod helpers;
mod login;
mod passkeys;
mod requests;
mod slack;
