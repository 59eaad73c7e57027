//! Domain entities - core business objects

mod auth_context;
mod membership;
mod participation;
mod ride;

pub use auth_context::AuthContext;
pub use membership::{Membership, MembershipStatus};
pub use participation::{
    AttendanceStatus, Evidence, EvidenceMatchType, Participation, ParticipationRole,
    ParticipationStatus,
};
pub use ride::{NewRide, Ride, RideAudience, RideChanges, RideScope, RideStatus};
