//! # ride-core
//!
//! Domain layer for club rides: the ride and participation state machines,
//! the static capability matrices, and the ports the application layer
//! needs from persistence and the membership subsystem.
//! This crate has no infrastructure dependencies.

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    AttendanceStatus, AuthContext, Evidence, EvidenceMatchType, Membership, MembershipStatus,
    NewRide, Participation, ParticipationRole, ParticipationStatus, Ride, RideAudience, RideChanges,
    RideScope, RideStatus,
};
pub use error::{DomainError, ErrorKind};
pub use traits::{
    Cursor, IndexQuery, MembershipProvider, Page, PersistenceGateway, Precondition, Record,
    RecordKey, RepoResult, WriteOp,
};
pub use value_objects::{
    ClubRole, RideCapabilities, Snowflake, SnowflakeGenerator, SnowflakeParseError,
    SystemCapabilities, SystemRole, MAX_WORKER_ID,
};
