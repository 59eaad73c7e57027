//! Ride service
//!
//! Handles ride creation, the lifecycle transitions, edits, and ride queries.

use ride_core::{
    AuthContext, Cursor, DomainError, IndexQuery, NewRide, Page, Participation, ParticipationRole,
    ParticipationStatus, Precondition, Record, Ride, RideCapabilities, RideChanges, Snowflake,
    WriteOp,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{
    CancelRideRequest, CreateRideRequest, ListRidesQuery, PublishRideRequest, RidePageResponse,
    RideResponse, UpdateRideRequest,
};

use super::authorization::AuthorizationGate;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::retry::retry_on_conflict;
use super::waitlist::{commit, promote_waitlisted};

/// Ride service
pub struct RideService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RideService<'a> {
    /// Create a new RideService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a ride in a club. The creator becomes its confirmed captain.
    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn create_ride(
        &self,
        auth: &AuthContext,
        club_id: Snowflake,
        request: CreateRideRequest,
    ) -> ServiceResult<RideResponse> {
        request.validate()?;

        let gate = AuthorizationGate::new(self.ctx);
        gate.require_ride_capability(
            RideCapabilities::CREATE_RIDE_PROPOSALS,
            auth,
            club_id,
            None,
            None,
        )
        .await?;
        if request.publish_immediately {
            gate.require_ride_capability(
                RideCapabilities::PUBLISH_OFFICIAL_RIDES,
                auth,
                club_id,
                None,
                None,
            )
            .await?;
        }

        let ride = Ride::new(NewRide {
            id: self.ctx.generate_id(),
            club_id,
            title: request.title,
            description: request.description,
            start_date_time: request.start_date_time,
            estimated_duration_minutes: request.estimated_duration_minutes,
            max_participants: request.max_participants,
            allow_waitlist: request.allow_waitlist,
            is_public: request.is_public,
            audience: request.audience,
            created_by: auth.user_id,
            publish_immediately: request.publish_immediately,
        });
        let captain = Participation::confirmed(
            self.ctx.generate_id(),
            ride.id,
            club_id,
            auth.user_id,
            ParticipationRole::Captain,
        );

        self.ctx
            .gateway()
            .atomic_multi_write(vec![
                WriteOp::create(Record::Ride(ride.clone())),
                WriteOp::create(Record::Participation(captain)),
            ])
            .await?;

        info!(ride_id = %ride.id, club_id = %club_id, status = %ride.status, "Ride created");

        Ok(RideResponse::from(&ride))
    }

    /// Publish a draft
    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn publish_ride(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        request: PublishRideRequest,
    ) -> ServiceResult<RideResponse> {
        let publisher = auth.user_id;
        let ride = self
            .transition(
                auth,
                ride_id,
                RideCapabilities::PUBLISH_OFFICIAL_RIDES,
                "publish_ride",
                move |ride| ride.publish(publisher, request.audience, request.is_public),
            )
            .await?;
        Ok(RideResponse::from(&ride))
    }

    /// Published -> Active
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn start_ride(&self, auth: &AuthContext, ride_id: Snowflake) -> ServiceResult<RideResponse> {
        let ride = self
            .transition(auth, ride_id, RideCapabilities::MANAGE_RIDES, "start_ride", Ride::start)
            .await?;
        Ok(RideResponse::from(&ride))
    }

    /// Active -> Completed
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn complete_ride(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
    ) -> ServiceResult<RideResponse> {
        let ride = self
            .transition(
                auth,
                ride_id,
                RideCapabilities::MANAGE_RIDES,
                "complete_ride",
                Ride::complete,
            )
            .await?;
        Ok(RideResponse::from(&ride))
    }

    /// Cancel a ride that has not finished yet
    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn cancel_ride(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        request: CancelRideRequest,
    ) -> ServiceResult<RideResponse> {
        request.validate()?;
        let reason = request.reason;
        let ride = self
            .transition(
                auth,
                ride_id,
                RideCapabilities::CANCEL_RIDES,
                "cancel_ride",
                move |ride| ride.cancel(reason.clone()),
            )
            .await?;
        Ok(RideResponse::from(&ride))
    }

    /// Edit a draft or published ride. Growing or removing the capacity
    /// promotes waitlisted participants in the same write.
    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn update_ride(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        request: UpdateRideRequest,
    ) -> ServiceResult<RideResponse> {
        request.validate()?;
        let changes = request.into_changes();

        let ride = retry_on_conflict(self.ctx.settings().max_write_attempts, "update_ride", move || {
            self.try_update(auth, ride_id, changes.clone())
        })
        .await?;

        Ok(RideResponse::from(&ride))
    }

    /// Get a ride the caller can see. Hidden rides are reported as not found.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn get_ride(&self, auth: &AuthContext, ride_id: Snowflake) -> ServiceResult<RideResponse> {
        let ride = self.ctx.require_ride(ride_id).await?;
        AuthorizationGate::new(self.ctx)
            .ensure_visible(auth, &ride)
            .await?;
        Ok(RideResponse::from(&ride))
    }

    /// One page of a club's rides, keeping only those the caller can see
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn list_club_rides(
        &self,
        auth: &AuthContext,
        club_id: Snowflake,
        query: ListRidesQuery,
    ) -> ServiceResult<RidePageResponse> {
        let limit = self.ctx.settings().page_size(query.limit);
        let cursor = query.cursor.map(Cursor::from);
        let index = IndexQuery::RidesByClub {
            club_id,
            status: query.status,
        };

        let page = self
            .ctx
            .gateway()
            .query_by_index(&index, cursor.as_ref(), limit)
            .await?;

        let gate = AuthorizationGate::new(self.ctx);
        let mut visible = Vec::with_capacity(page.items.len());
        for ride in page.items.into_iter().filter_map(Record::into_ride) {
            if gate.can_view(auth, &ride).await {
                visible.push(ride);
            }
        }

        Ok(RidePageResponse::from(Page {
            items: visible,
            next_cursor: page.next_cursor,
        }))
    }

    async fn try_update(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        changes: RideChanges,
    ) -> ServiceResult<Ride> {
        let mut ride = self.ctx.require_ride(ride_id).await?;
        AuthorizationGate::new(self.ctx)
            .require_for_ride(RideCapabilities::MANAGE_RIDES, auth, &ride)
            .await?;

        ride.update(changes)?;

        let waiting = if ride.can_accept_participants() && ride.waitlist_count > 0 {
            self.ctx
                .gateway()
                .participations_for_ride(ride_id, Some(ParticipationStatus::Waitlisted))
                .await?
        } else {
            Vec::new()
        };
        let promoted = promote_waitlisted(&mut ride, waiting)?;
        let promoted_count = promoted.len();

        commit(self.ctx, ride.clone(), promoted).await?;

        info!(ride_id = %ride_id, promoted = promoted_count, "Ride updated");
        Ok(ride)
    }

    /// Load, authorize, apply a status transition, and write the ride back
    /// guarded by the version it was read at
    async fn transition<F>(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        capability: RideCapabilities,
        operation: &'static str,
        apply: F,
    ) -> ServiceResult<Ride>
    where
        F: Fn(&mut Ride) -> Result<(), DomainError>,
    {
        let apply = &apply;
        retry_on_conflict(self.ctx.settings().max_write_attempts, operation, move || {
            self.try_transition(auth, ride_id, capability, apply)
        })
        .await
    }

    async fn try_transition<F>(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        capability: RideCapabilities,
        apply: &F,
    ) -> ServiceResult<Ride>
    where
        F: Fn(&mut Ride) -> Result<(), DomainError>,
    {
        let mut ride = self.ctx.require_ride(ride_id).await?;
        AuthorizationGate::new(self.ctx)
            .require_for_ride(capability, auth, &ride)
            .await?;

        let previous = ride.status;
        apply(&mut ride)?;

        let version = ride.version;
        self.ctx
            .gateway()
            .put(Record::Ride(ride.clone()), Some(Precondition::Version(version)))
            .await?;

        info!(ride_id = %ride_id, from = %previous, to = %ride.status, "Ride status changed");
        Ok(ride)
    }
}
