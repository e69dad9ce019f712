//! Axum routes of the Veriflow service.
//!
//! Handlers are generic over a [`Backend`] so the same routes run against
//! the in-memory adapters in tests and the configured ones in production.
//! Every route that acts on behalf of a user takes an [`Actor`], which binds
//! the auth cookie to a registered user through the identity provider.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod views;

pub use error::{ApiError, ErrorResponse};
pub use extract::Actor;
pub use state::{AppState, Backend};
