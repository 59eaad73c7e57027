//! Ride entity - one scheduled group ride hosted by a club

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Ride lifecycle: Draft -> Published -> Active -> Completed, with Cancelled
/// reachable from every non-terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Draft,
    Published,
    Active,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::ValidationError(format!("unknown ride status: {other}"))),
        }
    }
}

/// Who owns the ride. Only club rides exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RideScope {
    #[default]
    Club,
}

impl RideScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Club => "club",
        }
    }
}

impl FromStr for RideScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "club" => Ok(Self::Club),
            other => Err(DomainError::ValidationError(format!("unknown ride scope: {other}"))),
        }
    }
}

/// Who may see and join a published ride
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RideAudience {
    InviteOnly,
    #[default]
    MembersOnly,
    Public,
}

impl RideAudience {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InviteOnly => "invite_only",
            Self::MembersOnly => "members_only",
            Self::Public => "public",
        }
    }
}

impl FromStr for RideAudience {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invite_only" => Ok(Self::InviteOnly),
            "members_only" => Ok(Self::MembersOnly),
            "public" => Ok(Self::Public),
            other => Err(DomainError::ValidationError(format!("unknown ride audience: {other}"))),
        }
    }
}

/// Input for [`Ride::new`]
#[derive(Debug, Clone)]
pub struct NewRide {
    pub id: Snowflake,
    pub club_id: Snowflake,
    pub title: String,
    pub description: Option<String>,
    pub start_date_time: DateTime<Utc>,
    pub estimated_duration_minutes: i32,
    pub max_participants: Option<i32>,
    pub allow_waitlist: bool,
    pub is_public: bool,
    pub audience: Option<RideAudience>,
    pub created_by: Snowflake,
    pub publish_immediately: bool,
}

/// Editable ride fields; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct RideChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date_time: Option<DateTime<Utc>>,
    pub estimated_duration_minutes: Option<i32>,
    pub max_participants: Option<Option<i32>>,
    pub allow_waitlist: Option<bool>,
    pub is_public: Option<bool>,
}

/// Ride aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ride {
    pub id: Snowflake,
    pub club_id: Snowflake,
    pub title: String,
    pub description: Option<String>,
    pub status: RideStatus,
    pub scope: RideScope,
    pub audience: RideAudience,
    pub start_date_time: DateTime<Utc>,
    pub estimated_duration_minutes: i32,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub waitlist_count: i32,
    pub allow_waitlist: bool,
    pub is_public: bool,
    pub created_by: Snowflake,
    pub published_by: Option<Snowflake>,
    pub published_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the store on every conditional write
    pub version: i64,
}

impl Ride {
    /// Create a ride. The creator counts as the first confirmed participant.
    pub fn new(input: NewRide) -> Self {
        let now = Utc::now();
        let (status, published_by, published_at) = if input.publish_immediately {
            (RideStatus::Published, Some(input.created_by), Some(now))
        } else {
            (RideStatus::Draft, None, None)
        };

        Self {
            id: input.id,
            club_id: input.club_id,
            title: input.title,
            description: input.description,
            status,
            scope: RideScope::Club,
            audience: input.audience.unwrap_or_default(),
            start_date_time: input.start_date_time,
            estimated_duration_minutes: input.estimated_duration_minutes,
            max_participants: input.max_participants,
            current_participants: 1,
            waitlist_count: 0,
            allow_waitlist: input.allow_waitlist,
            is_public: input.is_public,
            created_by: input.created_by,
            published_by,
            published_at,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    #[inline]
    pub fn can_be_published(&self) -> bool {
        self.status == RideStatus::Draft
    }

    #[inline]
    pub fn can_be_updated(&self) -> bool {
        matches!(self.status, RideStatus::Draft | RideStatus::Published)
    }

    #[inline]
    pub fn can_be_cancelled(&self) -> bool {
        matches!(
            self.status,
            RideStatus::Draft | RideStatus::Published | RideStatus::Active
        )
    }

    /// Published and below capacity (an unset capacity never fills)
    pub fn can_accept_participants(&self) -> bool {
        self.status == RideStatus::Published && !self.is_full()
    }

    pub fn is_waitlist_available(&self) -> bool {
        self.allow_waitlist && self.max_participants.is_some() && self.is_full()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.max_participants
            .is_some_and(|max| self.current_participants >= max)
    }

    /// Open confirmed slots, `None` when capacity is unlimited
    pub fn remaining_slots(&self) -> Option<i32> {
        self.max_participants
            .map(|max| (max - self.current_participants).max(0))
    }

    #[inline]
    pub fn is_creator(&self, user_id: Snowflake) -> bool {
        self.created_by == user_id
    }

    pub fn publish(
        &mut self,
        by: Snowflake,
        audience: Option<RideAudience>,
        is_public: Option<bool>,
    ) -> Result<(), DomainError> {
        if !self.can_be_published() {
            return Err(DomainError::invalid_state(format!(
                "ride {} cannot be published from {}",
                self.id, self.status
            )));
        }
        let now = Utc::now();
        self.status = RideStatus::Published;
        self.audience = audience.unwrap_or(RideAudience::MembersOnly);
        if let Some(is_public) = is_public {
            self.is_public = is_public;
        }
        self.published_by = Some(by);
        self.published_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), DomainError> {
        self.transition(RideStatus::Published, RideStatus::Active)
    }

    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.transition(RideStatus::Active, RideStatus::Completed)
    }

    /// Cancel the ride. Terminal; the reason is recorded as given.
    pub fn cancel(&mut self, reason: Option<String>) -> Result<(), DomainError> {
        if !self.can_be_cancelled() {
            return Err(DomainError::invalid_state(format!(
                "ride {} cannot be cancelled from {}",
                self.id, self.status
            )));
        }
        self.status = RideStatus::Cancelled;
        self.cancellation_reason = reason;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply editable field changes while the ride is still Draft or Published
    pub fn update(&mut self, changes: RideChanges) -> Result<(), DomainError> {
        if !self.can_be_updated() {
            return Err(DomainError::invalid_state(format!(
                "ride {} cannot be updated from {}",
                self.id, self.status
            )));
        }
        if let Some(Some(max)) = changes.max_participants {
            if max < self.current_participants {
                return Err(DomainError::ValidationError(format!(
                    "max_participants {max} is below the {} confirmed participants",
                    self.current_participants
                )));
            }
        }

        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(start) = changes.start_date_time {
            self.start_date_time = start;
        }
        if let Some(duration) = changes.estimated_duration_minutes {
            self.estimated_duration_minutes = duration;
        }
        if let Some(max) = changes.max_participants {
            self.max_participants = max;
        }
        if let Some(allow_waitlist) = changes.allow_waitlist {
            self.allow_waitlist = allow_waitlist;
        }
        if let Some(is_public) = changes.is_public {
            self.is_public = is_public;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn increment_participants(&mut self) {
        self.current_participants += 1;
        self.updated_at = Utc::now();
    }

    pub fn decrement_participants(&mut self) {
        self.current_participants = (self.current_participants - 1).max(0);
        self.updated_at = Utc::now();
    }

    pub fn increment_waitlist(&mut self) {
        self.waitlist_count += 1;
        self.updated_at = Utc::now();
    }

    pub fn decrement_waitlist(&mut self) {
        self.waitlist_count = (self.waitlist_count - 1).max(0);
        self.updated_at = Utc::now();
    }

    fn transition(&mut self, from: RideStatus, to: RideStatus) -> Result<(), DomainError> {
        if self.status != from {
            return Err(DomainError::invalid_state(format!(
                "ride {} must be {from} to become {to}, but is {}",
                self.id, self.status
            )));
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}
