//! # ride-service
//!
//! Application layer: authorization, waitlist coordination, and the ride and
//! participation use cases built on top of them.
//!
//! Every mutating use case runs the same way: the [`AuthorizationGate`]
//! checks the caller's capability, the aggregates in `ride-core` perform the
//! state transition, and the resulting record set is committed through one
//! `atomic_multi_write`, retried on optimistic-concurrency conflicts.

pub mod dto;
pub mod services;

pub use services::{
    AuthorizationGate, CapabilityResolver, ParticipationService, RideService, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, WaitlistCoordinator,
};
