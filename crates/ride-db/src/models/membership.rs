//! Club membership database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for club_memberships table
#[derive(Debug, Clone, FromRow)]
pub struct ClubMembershipModel {
    pub club_id: i64,
    pub user_id: i64,
    pub role: String,
    pub status: String,
    pub joined_at: DateTime<Utc>,
}
