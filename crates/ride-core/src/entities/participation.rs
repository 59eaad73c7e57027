//! Participation entity - one user's relationship to one ride

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Role a participant holds on the ride
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationRole {
    Captain,
    Leader,
    Participant,
}

impl ParticipationRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Captain => "captain",
            Self::Leader => "leader",
            Self::Participant => "participant",
        }
    }

    /// Participant <-> Leader and Leader <-> Captain. A captain can only step
    /// down to leader, never straight to participant.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Participant, Self::Leader)
                | (Self::Leader, Self::Participant)
                | (Self::Leader, Self::Captain)
                | (Self::Captain, Self::Leader)
        )
    }
}

impl fmt::Display for ParticipationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipationRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "captain" => Ok(Self::Captain),
            "leader" => Ok(Self::Leader),
            "participant" => Ok(Self::Participant),
            other => Err(DomainError::ValidationError(format!("unknown participation role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    Confirmed,
    Waitlisted,
    Withdrawn,
    Removed,
}

impl ParticipationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Waitlisted => "waitlisted",
            Self::Withdrawn => "withdrawn",
            Self::Removed => "removed",
        }
    }

    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Confirmed | Self::Waitlisted)
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "waitlisted" => Ok(Self::Waitlisted),
            "withdrawn" => Ok(Self::Withdrawn),
            "removed" => Ok(Self::Removed),
            other => Err(DomainError::ValidationError(format!(
                "unknown participation status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Unknown,
    Attended,
    NoShow,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Attended => "attended",
            Self::NoShow => "no_show",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Self::Unknown),
            "attended" => Ok(Self::Attended),
            "no_show" => Ok(Self::NoShow),
            other => Err(DomainError::ValidationError(format!("unknown attendance status: {other}"))),
        }
    }
}

/// How a piece of evidence was matched to the ride
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceMatchType {
    Automatic,
    Manual,
}

/// Proof of attendance attached to a confirmed participation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Evidence {
    Strava {
        activity_id: String,
        match_type: EvidenceMatchType,
        linked_at: DateTime<Utc>,
    },
    Manual {
        note: Option<String>,
        recorded_by: Snowflake,
        match_type: EvidenceMatchType,
        linked_at: DateTime<Utc>,
    },
}

impl Evidence {
    pub fn linked_at(&self) -> DateTime<Utc> {
        match self {
            Self::Strava { linked_at, .. } | Self::Manual { linked_at, .. } => *linked_at,
        }
    }
}

/// Participation aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub id: Snowflake,
    pub ride_id: Snowflake,
    pub club_id: Snowflake,
    pub user_id: Snowflake,
    pub role: ParticipationRole,
    pub status: ParticipationStatus,
    /// Set if and only if `status` is Waitlisted
    pub waitlist_position: Option<i32>,
    pub message: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub attendance_status: Option<AttendanceStatus>,
    pub evidence: Option<Evidence>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl Participation {
    fn base(
        id: Snowflake,
        ride_id: Snowflake,
        club_id: Snowflake,
        user_id: Snowflake,
        role: ParticipationRole,
        status: ParticipationStatus,
        waitlist_position: Option<i32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            ride_id,
            club_id,
            user_id,
            role,
            status,
            waitlist_position,
            message: None,
            joined_at: now,
            attendance_status: None,
            evidence: None,
            updated_at: now,
            version: 0,
        }
    }

    /// A confirmed participant
    pub fn confirmed(
        id: Snowflake,
        ride_id: Snowflake,
        club_id: Snowflake,
        user_id: Snowflake,
        role: ParticipationRole,
    ) -> Self {
        Self::base(id, ride_id, club_id, user_id, role, ParticipationStatus::Confirmed, None)
    }

    /// A waitlisted participant at the given 1-based position
    pub fn waitlisted(
        id: Snowflake,
        ride_id: Snowflake,
        club_id: Snowflake,
        user_id: Snowflake,
        position: i32,
    ) -> Self {
        Self::base(
            id,
            ride_id,
            club_id,
            user_id,
            ParticipationRole::Participant,
            ParticipationStatus::Waitlisted,
            Some(position),
        )
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    #[inline]
    pub fn can_leave(&self) -> bool {
        self.status.is_active()
    }

    #[inline]
    pub fn is_captain(&self) -> bool {
        self.role == ParticipationRole::Captain
    }

    #[inline]
    pub fn is_waitlisted(&self) -> bool {
        self.status == ParticipationStatus::Waitlisted
    }

    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.status == ParticipationStatus::Confirmed
    }

    /// Self-initiated exit
    pub fn withdraw(&mut self) -> Result<(), DomainError> {
        if !self.can_leave() {
            return Err(DomainError::invalid_state(format!(
                "cannot withdraw a {} participation",
                self.status
            )));
        }
        self.set_status(ParticipationStatus::Withdrawn, None);
        Ok(())
    }

    /// Admin-initiated exit
    pub fn remove(&mut self) {
        self.set_status(ParticipationStatus::Removed, None);
    }

    pub fn promote_from_waitlist(&mut self) -> Result<(), DomainError> {
        self.require_waitlisted("promote")?;
        self.set_status(ParticipationStatus::Confirmed, None);
        Ok(())
    }

    pub fn update_waitlist_position(&mut self, position: i32) -> Result<(), DomainError> {
        self.require_waitlisted("reposition")?;
        if position < 1 {
            return Err(DomainError::ValidationError(format!(
                "waitlist position must be positive, got {position}"
            )));
        }
        self.waitlist_position = Some(position);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn update_role(&mut self, new_role: ParticipationRole) -> Result<(), DomainError> {
        if !self.role.can_transition_to(new_role) {
            return Err(DomainError::InvalidRoleTransition {
                from: self.role.as_str(),
                to: new_role.as_str(),
            });
        }
        self.role = new_role;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn update_attendance(&mut self, attendance: AttendanceStatus) -> Result<(), DomainError> {
        self.require_confirmed("record attendance")?;
        self.attendance_status = Some(attendance);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn link_strava_evidence(
        &mut self,
        activity_id: String,
        match_type: EvidenceMatchType,
    ) -> Result<(), DomainError> {
        self.require_confirmed("link evidence")?;
        let now = Utc::now();
        self.evidence = Some(Evidence::Strava {
            activity_id,
            match_type,
            linked_at: now,
        });
        self.attendance_status = Some(AttendanceStatus::Attended);
        self.updated_at = now;
        Ok(())
    }

    pub fn link_manual_evidence(
        &mut self,
        recorded_by: Snowflake,
        note: Option<String>,
    ) -> Result<(), DomainError> {
        self.require_confirmed("link evidence")?;
        let now = Utc::now();
        self.evidence = Some(Evidence::Manual {
            note,
            recorded_by,
            match_type: EvidenceMatchType::Manual,
            linked_at: now,
        });
        self.attendance_status = Some(AttendanceStatus::Attended);
        self.updated_at = now;
        Ok(())
    }

    fn set_status(&mut self, status: ParticipationStatus, position: Option<i32>) {
        self.status = status;
        self.waitlist_position = position;
        self.updated_at = Utc::now();
    }

    fn require_waitlisted(&self, action: &str) -> Result<(), DomainError> {
        if self.is_waitlisted() {
            Ok(())
        } else {
            Err(DomainError::invalid_state(format!(
                "cannot {action} a {} participation",
                self.status
            )))
        }
    }

    fn require_confirmed(&self, action: &str) -> Result<(), DomainError> {
        if self.is_confirmed() {
            Ok(())
        } else {
            Err(DomainError::invalid_state(format!(
                "cannot {action} for a {} participation",
                self.status
            )))
        }
    }
}
