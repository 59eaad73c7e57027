//! Ride entity <-> model mapper

use ride_core::{DomainError, Ride, Snowflake};

use super::parse_column;
use crate::models::RideModel;

impl TryFrom<RideModel> for Ride {
    type Error = DomainError;

    fn try_from(model: RideModel) -> Result<Self, Self::Error> {
        Ok(Ride {
            id: Snowflake::new(model.id),
            club_id: Snowflake::new(model.club_id),
            title: model.title,
            description: model.description,
            status: parse_column("rides.status", &model.status)?,
            scope: parse_column("rides.scope", &model.scope)?,
            audience: parse_column("rides.audience", &model.audience)?,
            start_date_time: model.start_date_time,
            estimated_duration_minutes: model.estimated_duration_minutes,
            max_participants: model.max_participants,
            current_participants: model.current_participants,
            waitlist_count: model.waitlist_count,
            allow_waitlist: model.allow_waitlist,
            is_public: model.is_public,
            created_by: Snowflake::new(model.created_by),
            published_by: model.published_by.map(Snowflake::new),
            published_at: model.published_at,
            cancellation_reason: model.cancellation_reason,
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
        })
    }
}

impl From<&Ride> for RideModel {
    fn from(ride: &Ride) -> Self {
        Self {
            id: ride.id.into_inner(),
            club_id: ride.club_id.into_inner(),
            title: ride.title.clone(),
            description: ride.description.clone(),
            status: ride.status.as_str().to_string(),
            scope: ride.scope.as_str().to_string(),
            audience: ride.audience.as_str().to_string(),
            start_date_time: ride.start_date_time,
            estimated_duration_minutes: ride.estimated_duration_minutes,
            max_participants: ride.max_participants,
            current_participants: ride.current_participants,
            waitlist_count: ride.waitlist_count,
            allow_waitlist: ride.allow_waitlist,
            is_public: ride.is_public,
            created_by: ride.created_by.into_inner(),
            published_by: ride.published_by.map(Snowflake::into_inner),
            published_at: ride.published_at,
            cancellation_reason: ride.cancellation_reason.clone(),
            created_at: ride.created_at,
            updated_at: ride.updated_at,
            version: ride.version,
        }
    }
}
