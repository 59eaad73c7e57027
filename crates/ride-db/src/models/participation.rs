//! Participation database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for ride_participations table
#[derive(Debug, Clone, FromRow)]
pub struct ParticipationModel {
    pub id: i64,
    pub ride_id: i64,
    pub club_id: i64,
    pub user_id: i64,
    pub role: String,
    pub status: String,
    pub waitlist_position: Option<i32>,
    pub message: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub attendance_status: Option<String>,
    /// Tagged JSON, see `ride_core::Evidence`
    pub evidence: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}
