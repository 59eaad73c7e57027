//! Participation entity <-> model mapper

use ride_core::{DomainError, Evidence, Participation, Snowflake};

use super::parse_column;
use crate::models::ParticipationModel;

impl TryFrom<ParticipationModel> for Participation {
    type Error = DomainError;

    fn try_from(model: ParticipationModel) -> Result<Self, Self::Error> {
        let attendance_status = model
            .attendance_status
            .as_deref()
            .map(|value| parse_column("ride_participations.attendance_status", value))
            .transpose()?;

        let evidence = model
            .evidence
            .map(serde_json::from_value::<Evidence>)
            .transpose()
            .map_err(|e| DomainError::DatabaseError(format!("invalid evidence in row: {e}")))?;

        Ok(Participation {
            id: Snowflake::new(model.id),
            ride_id: Snowflake::new(model.ride_id),
            club_id: Snowflake::new(model.club_id),
            user_id: Snowflake::new(model.user_id),
            role: parse_column("ride_participations.role", &model.role)?,
            status: parse_column("ride_participations.status", &model.status)?,
            waitlist_position: model.waitlist_position,
            message: model.message,
            joined_at: model.joined_at,
            attendance_status,
            evidence,
            updated_at: model.updated_at,
            version: model.version,
        })
    }
}

impl TryFrom<&Participation> for ParticipationModel {
    type Error = DomainError;

    fn try_from(p: &Participation) -> Result<Self, Self::Error> {
        let evidence = p
            .evidence
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| DomainError::InternalError(format!("failed to encode evidence: {e}")))?;

        Ok(Self {
            id: p.id.into_inner(),
            ride_id: p.ride_id.into_inner(),
            club_id: p.club_id.into_inner(),
            user_id: p.user_id.into_inner(),
            role: p.role.as_str().to_string(),
            status: p.status.as_str().to_string(),
            waitlist_position: p.waitlist_position,
            message: p.message.clone(),
            joined_at: p.joined_at,
            attendance_status: p.attendance_status.map(|a| a.as_str().to_string()),
            evidence,
            updated_at: p.updated_at,
            version: p.version,
        })
    }
}
