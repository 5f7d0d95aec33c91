//! Foundation value objects shared across the domain.
//!
//! These are the primitive building blocks: identifiers, build references,
//! timestamps, validation errors, and the state machine trait.

mod build;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use build::{BuildNumber, BuildRef, JobName};
pub use errors::ValidationError;
pub use ids::SessionId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
