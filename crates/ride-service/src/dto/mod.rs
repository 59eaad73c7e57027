//! Data transfer objects for ride operations
//!
//! This module provides:
//! - Request DTOs with validation for caller inputs
//! - Response DTOs for serializing results
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

// Re-export commonly used request types
pub use requests::{
    CancelRideRequest, CreateRideRequest, JoinRideRequest, LinkManualEvidenceRequest,
    LinkStravaEvidenceRequest, ListRidesQuery, PublishRideRequest, RecordAttendanceRequest,
    UpdateParticipantRoleRequest, UpdateRideRequest,
};

// Re-export commonly used response types
pub use responses::{ParticipationResponse, RidePageResponse, RideResponse};
