//! Ride database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for rides table
#[derive(Debug, Clone, FromRow)]
pub struct RideModel {
    pub id: i64,
    pub club_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub scope: String,
    pub audience: String,
    pub start_date_time: DateTime<Utc>,
    pub estimated_duration_minutes: i32,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub waitlist_count: i32,
    pub allow_waitlist: bool,
    pub is_public: bool,
    pub created_by: i64,
    pub published_by: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}
