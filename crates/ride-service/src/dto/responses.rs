//! Response DTOs for ride operations
//!
//! All response DTOs implement `Serialize` for JSON output.
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use ride_core::{
    AttendanceStatus, Evidence, ParticipationRole, ParticipationStatus, RideAudience, RideScope,
    RideStatus, Snowflake,
};
use serde::Serialize;

// ============================================================================
// Ride Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RideResponse {
    pub id: Snowflake,
    pub club_id: Snowflake,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: RideStatus,
    pub scope: RideScope,
    pub audience: RideAudience,
    pub start_date_time: DateTime<Utc>,
    pub estimated_duration_minutes: i32,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub waitlist_count: i32,
    /// Open confirmed slots, null when unlimited
    pub remaining_slots: Option<i32>,
    pub allow_waitlist: bool,
    pub is_public: bool,
    pub created_by: Snowflake,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_by: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of rides
#[derive(Debug, Clone, Serialize)]
pub struct RidePageResponse {
    pub rides: Vec<RideResponse>,
    /// Cursor for the next page, absent on the last one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

// ============================================================================
// Participation Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ParticipationResponse {
    pub id: Snowflake,
    pub ride_id: Snowflake,
    pub club_id: Snowflake,
    pub user_id: Snowflake,
    pub role: ParticipationRole,
    pub status: ParticipationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub joined_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_status: Option<AttendanceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    pub updated_at: DateTime<Utc>,
}
