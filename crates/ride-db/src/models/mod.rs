//! Database models - SQLx-compatible structs for PostgreSQL tables

mod membership;
mod participation;
mod ride;

pub use membership::ClubMembershipModel;
pub use participation::ParticipationModel;
pub use ride::RideModel;
