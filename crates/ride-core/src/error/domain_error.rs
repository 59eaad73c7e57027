//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Error taxonomy shared by every ride operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    InvalidRoleTransition,
    CannotRemoveCaptain,
    InsufficientPrivileges,
    ValidationError,
    InternalError,
}

/// Domain layer errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Ride not found: {0}")]
    RideNotFound(Snowflake),

    #[error("Participation not found for user {user_id} on ride {ride_id}")]
    ParticipationNotFound { ride_id: Snowflake, user_id: Snowflake },

    #[error("Membership not found for user {user_id} in club {club_id}")]
    MembershipNotFound { club_id: Snowflake, user_id: Snowflake },

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("User {user_id} already participates in ride {ride_id}")]
    AlreadyParticipating { ride_id: Snowflake, user_id: Snowflake },

    #[error("Ride {0} is full and has no waitlist")]
    RideFull(Snowflake),

    /// A conditional write lost a race with a concurrent writer
    #[error("Precondition failed for {0}")]
    PreconditionFailed(String),

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid role transition from {from} to {to}")]
    InvalidRoleTransition { from: &'static str, to: &'static str },

    #[error("Cannot remove the ride captain")]
    CannotRemoveCaptain,

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Insufficient privileges: {0}")]
    InsufficientPrivileges(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Shorthand for [`DomainError::InvalidState`]
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Position in the error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RideNotFound(_)
            | Self::ParticipationNotFound { .. }
            | Self::MembershipNotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyParticipating { .. } | Self::RideFull(_) | Self::PreconditionFailed(_) => {
                ErrorKind::Conflict
            }
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::InvalidRoleTransition { .. } => ErrorKind::InvalidRoleTransition,
            Self::CannotRemoveCaptain => ErrorKind::CannotRemoveCaptain,
            Self::InsufficientPrivileges(_) => ErrorKind::InsufficientPrivileges,
            Self::ValidationError(_) => ErrorKind::ValidationError,
            Self::DatabaseError(_) | Self::CacheError(_) | Self::InternalError(_) => {
                ErrorKind::InternalError
            }
        }
    }

    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::RideNotFound(_) => "UNKNOWN_RIDE",
            Self::ParticipationNotFound { .. } => "UNKNOWN_PARTICIPATION",
            Self::MembershipNotFound { .. } => "UNKNOWN_MEMBERSHIP",
            Self::AlreadyParticipating { .. } => "ALREADY_PARTICIPATING",
            Self::RideFull(_) => "RIDE_FULL",
            Self::PreconditionFailed(_) => "CONCURRENT_MODIFICATION",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::InvalidRoleTransition { .. } => "INVALID_ROLE_TRANSITION",
            Self::CannotRemoveCaptain => "CANNOT_REMOVE_CAPTAIN",
            Self::InsufficientPrivileges(_) => "INSUFFICIENT_PRIVILEGES",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub fn is_authorization(&self) -> bool {
        self.kind() == ErrorKind::InsufficientPrivileges
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::ValidationError
    }

    /// Business rule violations that are neither missing resources nor conflicts
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidState | ErrorKind::InvalidRoleTransition | ErrorKind::CannotRemoveCaptain
        )
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::InternalError
    }
}
