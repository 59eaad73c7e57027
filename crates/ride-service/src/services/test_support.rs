//! Shared fixtures for service tests

use std::sync::Arc;

use chrono::{Duration, Utc};
use ride_core::{
    AuthContext, ClubRole, NewRide, Participation, ParticipationRole, PersistenceGateway, Record,
    Ride, Snowflake, WriteOp,
};
use ride_db::{MemoryGateway, MemoryMembershipProvider};

use super::{ServiceContext, ServiceContextBuilder};

pub(crate) struct Fixture {
    pub ctx: ServiceContext,
    pub gateway: Arc<MemoryGateway>,
    pub members: Arc<MemoryMembershipProvider>,
    pub club_id: Snowflake,
}

impl Fixture {
    pub fn new() -> Self {
        let gateway = MemoryGateway::new_shared();
        let members = MemoryMembershipProvider::new_shared();
        let ctx = ServiceContextBuilder::new()
            .gateway(gateway.clone())
            .membership_provider(members.clone())
            .build()
            .unwrap();
        let club_id = ctx.generate_id();
        Self {
            ctx,
            gateway,
            members,
            club_id,
        }
    }

    /// A fresh user holding an active membership with `role`
    pub fn member(&self, role: ClubRole) -> AuthContext {
        let user_id = self.ctx.generate_id();
        self.members.add_member(self.club_id, user_id, role);
        AuthContext::user(user_id, format!("{user_id}@example.com"))
    }

    /// Store a ride created by `creator` together with their captain participation
    pub async fn ride(
        &self,
        creator: &AuthContext,
        max_participants: Option<i32>,
        allow_waitlist: bool,
        publish: bool,
    ) -> Ride {
        let ride = Ride::new(NewRide {
            id: self.ctx.generate_id(),
            club_id: self.club_id,
            title: "Tuesday tempo".to_string(),
            description: None,
            start_date_time: Utc::now() + Duration::days(2),
            estimated_duration_minutes: 90,
            max_participants,
            allow_waitlist,
            is_public: false,
            audience: None,
            created_by: creator.user_id,
            publish_immediately: publish,
        });
        let captain = Participation::confirmed(
            self.ctx.generate_id(),
            ride.id,
            ride.club_id,
            creator.user_id,
            ParticipationRole::Captain,
        );
        self.gateway
            .atomic_multi_write(vec![
                WriteOp::create(Record::Ride(ride.clone())),
                WriteOp::create(Record::Participation(captain)),
            ])
            .await
            .unwrap();
        ride
    }

    pub async fn stored_ride(&self, ride_id: Snowflake) -> Ride {
        self.gateway.find_ride(ride_id).await.unwrap().unwrap()
    }

    pub async fn stored_participation(&self, ride_id: Snowflake, user_id: Snowflake) -> Participation {
        self.gateway
            .find_participation(ride_id, user_id)
            .await
            .unwrap()
            .unwrap()
    }

    /// Waitlist positions in queue order
    pub async fn waitlist(&self, ride_id: Snowflake) -> Vec<(Snowflake, i32)> {
        let mut entries: Vec<(Snowflake, i32)> = self
            .gateway
            .participations_for_ride(ride_id, Some(ride_core::ParticipationStatus::Waitlisted))
            .await
            .unwrap()
            .into_iter()
            .filter_map(|p| p.waitlist_position.map(|pos| (p.user_id, pos)))
            .collect();
        entries.sort_by_key(|(_, pos)| *pos);
        entries
    }
}
