//! Business logic services
//!
//! Services borrow a [`ServiceContext`] for the duration of a call and hold
//! no state of their own.

pub mod authorization;
pub mod capability;
pub mod context;
pub mod error;
pub mod participation;
mod retry;
pub mod ride;
pub mod waitlist;

pub use authorization::AuthorizationGate;
pub use capability::CapabilityResolver;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use participation::ParticipationService;
pub use ride::RideService;
pub use waitlist::WaitlistCoordinator;

#[cfg(test)]
pub(crate) mod test_support;
