//! Membership entity <-> model mapper

use ride_core::{DomainError, Membership, Snowflake};

use super::parse_column;
use crate::models::ClubMembershipModel;

impl TryFrom<ClubMembershipModel> for Membership {
    type Error = DomainError;

    fn try_from(model: ClubMembershipModel) -> Result<Self, Self::Error> {
        Ok(Membership {
            club_id: Snowflake::new(model.club_id),
            user_id: Snowflake::new(model.user_id),
            role: parse_column("club_memberships.role", &model.role)?,
            status: parse_column("club_memberships.status", &model.status)?,
            joined_at: model.joined_at,
        })
    }
}
