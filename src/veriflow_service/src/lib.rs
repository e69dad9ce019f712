pub mod backends;
pub mod tracing;
mod veriflow_service;

pub use backends::{ConfiguredBackend, build_state, build_state_with_notifier};
pub use veriflow_service::VeriflowService;
