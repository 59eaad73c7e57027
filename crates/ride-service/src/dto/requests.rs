//! Request DTOs for ride operations
//!
//! All request DTOs implement `Deserialize`; those carrying free-form input
//! also implement `Validate`.

use chrono::{DateTime, Utc};
use ride_core::{
    AttendanceStatus, EvidenceMatchType, ParticipationRole, RideAudience, RideChanges, RideStatus,
};
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Ride Requests
// ============================================================================

/// Create ride request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRideRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub start_date_time: DateTime<Utc>,

    #[validate(range(min = 1, max = 1440, message = "Duration must be 1-1440 minutes"))]
    pub estimated_duration_minutes: i32,

    /// Unset means unlimited
    #[validate(range(min = 1, message = "Max participants must be at least 1"))]
    pub max_participants: Option<i32>,

    #[serde(default)]
    pub allow_waitlist: bool,

    #[serde(default)]
    pub is_public: bool,

    pub audience: Option<RideAudience>,

    /// Skip the draft stage (requires publish_official_rides)
    #[serde(default)]
    pub publish_immediately: bool,
}

/// Publish ride request
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PublishRideRequest {
    /// Defaults to members only
    pub audience: Option<RideAudience>,
    pub is_public: Option<bool>,
}

/// Cancel ride request
#[derive(Debug, Clone, Deserialize, Validate, Default)]
pub struct CancelRideRequest {
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Update ride request
///
/// Absent fields are left untouched. `max_participants` and `description`
/// can be cleared with their `clear_*` flags.
#[derive(Debug, Clone, Deserialize, Validate, Default)]
pub struct UpdateRideRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub clear_description: bool,

    pub start_date_time: Option<DateTime<Utc>>,

    #[validate(range(min = 1, max = 1440, message = "Duration must be 1-1440 minutes"))]
    pub estimated_duration_minutes: Option<i32>,

    #[validate(range(min = 1, message = "Max participants must be at least 1"))]
    pub max_participants: Option<i32>,

    /// Remove the capacity limit
    #[serde(default)]
    pub clear_max_participants: bool,

    pub allow_waitlist: Option<bool>,

    pub is_public: Option<bool>,
}

impl UpdateRideRequest {
    /// Field changes for the ride aggregate. Clearing wins over setting.
    pub fn into_changes(self) -> RideChanges {
        let description = if self.clear_description {
            Some(None)
        } else {
            self.description.map(Some)
        };
        let max_participants = if self.clear_max_participants {
            Some(None)
        } else {
            self.max_participants.map(Some)
        };

        RideChanges {
            title: self.title,
            description,
            start_date_time: self.start_date_time,
            estimated_duration_minutes: self.estimated_duration_minutes,
            max_participants,
            allow_waitlist: self.allow_waitlist,
            is_public: self.is_public,
        }
    }
}

/// List club rides query
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListRidesQuery {
    pub status: Option<RideStatus>,
    /// Opaque cursor from a previous page
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

// ============================================================================
// Participation Requests
// ============================================================================

/// Join ride request
#[derive(Debug, Clone, Deserialize, Validate, Default)]
pub struct JoinRideRequest {
    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub message: Option<String>,
}

/// Change a participant's role on a ride
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateParticipantRoleRequest {
    pub role: ParticipationRole,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordAttendanceRequest {
    pub attendance: AttendanceStatus,
}

/// Attach a Strava activity as attendance evidence
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LinkStravaEvidenceRequest {
    #[validate(length(min = 1, max = 64, message = "Activity ID must be 1-64 characters"))]
    pub activity_id: String,

    /// Defaults to automatic
    pub match_type: Option<EvidenceMatchType>,
}

/// Record attendance evidence by hand
#[derive(Debug, Clone, Deserialize, Validate, Default)]
pub struct LinkManualEvidenceRequest {
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ride_validation() {
        let request: CreateRideRequest = serde_json::from_str(
            r#"{
                "title": "Gravel loop",
                "start_date_time": "2026-05-02T08:00:00Z",
                "estimated_duration_minutes": 180,
                "max_participants": 12
            }"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
        assert!(!request.allow_waitlist);
        assert!(!request.publish_immediately);

        let bad = CreateRideRequest {
            title: String::new(),
            estimated_duration_minutes: 0,
            max_participants: Some(0),
            ..request
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("estimated_duration_minutes"));
        assert!(fields.contains_key("max_participants"));
    }

    #[test]
    fn test_update_request_into_changes() {
        let changes = UpdateRideRequest {
            title: Some("Recovery spin".into()),
            max_participants: Some(8),
            clear_max_participants: true,
            ..UpdateRideRequest::default()
        }
        .into_changes();

        assert_eq!(changes.title.as_deref(), Some("Recovery spin"));
        assert_eq!(changes.max_participants, Some(None));
        assert!(changes.description.is_none());
    }

    #[test]
    fn test_role_request_parses_snake_case() {
        let request: UpdateParticipantRoleRequest =
            serde_json::from_str(r#"{"role": "leader"}"#).unwrap();
        assert_eq!(request.role, ParticipationRole::Leader);
    }
}
