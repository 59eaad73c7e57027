//! Participation service
//!
//! Handles joining and leaving rides, organiser actions on participants,
//! attendance, and evidence.

use ride_core::{
    AuthContext, DomainError, EvidenceMatchType, Participation, Precondition, Record,
    RideCapabilities, Snowflake,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{
    JoinRideRequest, LinkManualEvidenceRequest, LinkStravaEvidenceRequest, ParticipationResponse,
    RecordAttendanceRequest, UpdateParticipantRoleRequest,
};

use super::authorization::AuthorizationGate;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::retry::retry_on_conflict;
use super::waitlist::WaitlistCoordinator;

/// Participation service
pub struct ParticipationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ParticipationService<'a> {
    /// Create a new ParticipationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Join a ride as the caller
    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn join_ride(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        request: JoinRideRequest,
    ) -> ServiceResult<ParticipationResponse> {
        request.validate()?;

        let ride = self.ctx.require_ride(ride_id).await?;
        AuthorizationGate::new(self.ctx)
            .require_for_ride(RideCapabilities::JOIN_RIDES, auth, &ride)
            .await?;

        let participation = WaitlistCoordinator::new(self.ctx)
            .join(ride_id, auth.user_id, request.message)
            .await?;
        Ok(ParticipationResponse::from(&participation))
    }

    /// Leave a ride as the caller. Needs no capability: anyone may withdraw themselves.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn leave_ride(&self, auth: &AuthContext, ride_id: Snowflake) -> ServiceResult<()> {
        WaitlistCoordinator::new(self.ctx)
            .leave(ride_id, auth.user_id)
            .await
    }

    /// Remove another participant
    #[instrument(skip(self, auth), fields(actor_id = %auth.user_id))]
    pub async fn remove_participant(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<()> {
        let ride = self.ctx.require_ride(ride_id).await?;
        AuthorizationGate::new(self.ctx)
            .require_for_ride(RideCapabilities::MANAGE_PARTICIPANTS, auth, &ride)
            .await?;

        WaitlistCoordinator::new(self.ctx)
            .remove(ride_id, user_id)
            .await
    }

    /// Change a participant's ride role
    #[instrument(skip(self, auth), fields(actor_id = %auth.user_id))]
    pub async fn update_participant_role(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        user_id: Snowflake,
        request: UpdateParticipantRoleRequest,
    ) -> ServiceResult<ParticipationResponse> {
        let role = request.role;
        let participation = self
            .mutate(
                auth,
                ride_id,
                user_id,
                RideCapabilities::ASSIGN_LEADERSHIP,
                "update_participant_role",
                move |p| p.update_role(role),
            )
            .await?;

        info!(ride_id = %ride_id, user_id = %user_id, role = %participation.role, "Participant role changed");
        Ok(ParticipationResponse::from(&participation))
    }

    /// Mark whether a confirmed participant turned up
    #[instrument(skip(self, auth), fields(actor_id = %auth.user_id))]
    pub async fn record_attendance(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        user_id: Snowflake,
        request: RecordAttendanceRequest,
    ) -> ServiceResult<ParticipationResponse> {
        let attendance = request.attendance;
        let participation = self
            .mutate(
                auth,
                ride_id,
                user_id,
                RideCapabilities::MANAGE_PARTICIPANTS,
                "record_attendance",
                move |p| p.update_attendance(attendance),
            )
            .await?;
        Ok(ParticipationResponse::from(&participation))
    }

    /// Attach one of the caller's own Strava activities to their participation
    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn link_strava_evidence(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        request: LinkStravaEvidenceRequest,
    ) -> ServiceResult<ParticipationResponse> {
        request.validate()?;
        let match_type = request.match_type.unwrap_or(EvidenceMatchType::Automatic);
        let activity_id = request.activity_id;
        let user_id = auth.user_id;

        let apply = move |p: &mut Participation| p.link_strava_evidence(activity_id.clone(), match_type);
        let apply = &apply;
        let participation = retry_on_conflict(
            self.ctx.settings().max_write_attempts,
            "link_strava_evidence",
            move || self.try_mutate(ride_id, user_id, apply),
        )
        .await?;

        info!(ride_id = %ride_id, "Strava evidence linked");
        Ok(ParticipationResponse::from(&participation))
    }

    /// Record attendance evidence for a participant by hand
    #[instrument(skip(self, auth, request), fields(actor_id = %auth.user_id))]
    pub async fn link_manual_evidence(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        user_id: Snowflake,
        request: LinkManualEvidenceRequest,
    ) -> ServiceResult<ParticipationResponse> {
        request.validate()?;
        let recorded_by = auth.user_id;
        let note = request.note;
        let participation = self
            .mutate(
                auth,
                ride_id,
                user_id,
                RideCapabilities::MANAGE_PARTICIPANTS,
                "link_manual_evidence",
                move |p| p.link_manual_evidence(recorded_by, note.clone()),
            )
            .await?;
        Ok(ParticipationResponse::from(&participation))
    }

    /// Every participation of a visible ride, ordered by status, role, then queue position
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn list_ride_participants(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
    ) -> ServiceResult<Vec<ParticipationResponse>> {
        let ride = self.ctx.require_ride(ride_id).await?;
        AuthorizationGate::new(self.ctx)
            .ensure_visible(auth, &ride)
            .await?;

        let mut participations = self
            .ctx
            .gateway()
            .participations_for_ride(ride_id, None)
            .await?;
        participations.sort_by_key(|p| {
            (
                p.status,
                p.role,
                p.waitlist_position.unwrap_or(0),
                p.joined_at,
                p.user_id,
            )
        });

        Ok(participations.iter().map(ParticipationResponse::from).collect())
    }

    /// Authorize against the ride, then apply a single-participation change
    async fn mutate<F>(
        &self,
        auth: &AuthContext,
        ride_id: Snowflake,
        user_id: Snowflake,
        capability: RideCapabilities,
        operation: &'static str,
        apply: F,
    ) -> ServiceResult<Participation>
    where
        F: Fn(&mut Participation) -> Result<(), DomainError>,
    {
        let ride = self.ctx.require_ride(ride_id).await?;
        AuthorizationGate::new(self.ctx)
            .require_for_ride(capability, auth, &ride)
            .await?;

        let apply = &apply;
        retry_on_conflict(self.ctx.settings().max_write_attempts, operation, move || {
            self.try_mutate(ride_id, user_id, apply)
        })
        .await
    }

    async fn try_mutate<F>(
        &self,
        ride_id: Snowflake,
        user_id: Snowflake,
        apply: &F,
    ) -> ServiceResult<Participation>
    where
        F: Fn(&mut Participation) -> Result<(), DomainError>,
    {
        let mut participation = self.ctx.require_participation(ride_id, user_id).await?;
        apply(&mut participation)?;
        self.save(participation).await
    }

    /// Write a participation back guarded by the version it was read at
    async fn save(&self, mut participation: Participation) -> ServiceResult<Participation> {
        let version = participation.version;
        self.ctx
            .gateway()
            .put(
                Record::Participation(participation.clone()),
                Some(Precondition::Version(version)),
            )
            .await?;
        participation.version = version + 1;
        Ok(participation)
    }
}
