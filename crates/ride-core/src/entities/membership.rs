//! Membership - a user's role and standing in a club, owned by the membership subsystem

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::{ClubRole, Snowflake};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Pending,
    Suspended,
    Removed,
}

impl MembershipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Suspended => "suspended",
            Self::Removed => "removed",
        }
    }
}

impl FromStr for MembershipStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "suspended" => Ok(Self::Suspended),
            "removed" => Ok(Self::Removed),
            other => Err(DomainError::ValidationError(format!("unknown membership status: {other}"))),
        }
    }
}

/// Club membership record (read-only for the ride domain)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub club_id: Snowflake,
    pub user_id: Snowflake,
    pub role: ClubRole,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(club_id: Snowflake, user_id: Snowflake, role: ClubRole) -> Self {
        Self {
            club_id,
            user_id,
            role,
            status: MembershipStatus::Active,
            joined_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}
