pub mod action;
pub mod email;
pub mod identity;
pub mod message_ref;
pub mod session_challenge;
pub mod user;
pub mod verify_request;
