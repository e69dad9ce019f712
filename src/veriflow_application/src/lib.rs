pub mod directory;
pub mod error;
pub mod notifications;
pub mod transitions;
pub mod use_cases;

#[cfg(test)]
mod testing;

pub use directory::{ChallengePolicy, UserDirectory};
pub use error::VerificationError;
pub use notifications::{
    NotificationEvent, NotificationJob, NotificationQueue, NotificationWorker, notification_queue,
};
pub use transitions::{RequestTransitions, TransitionOutcome, WorkflowPolicy};
pub use use_cases::*;
