//! Waitlist coordinator
//!
//! Owns every change to a ride's confirmed/waitlisted population: joining,
//! leaving, admin removal, promotion off the waitlist, and reordering the
//! remaining queue to dense positions `1..=N`.
//!
//! A ride's counters and its participations change together. Each operation
//! reads the ride and the participations it decides on, then commits the
//! ride plus every touched participation in one `atomic_multi_write` guarded
//! by the versions it read. Losing that race re-runs the whole decision.

use ride_core::{
    DomainError, Participation, ParticipationRole, ParticipationStatus, Record, Ride, RideStatus,
    Snowflake, WriteOp,
};
use tracing::{debug, info, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::retry::retry_on_conflict;

/// How a participant leaves a ride
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Self-initiated
    Withdraw,
    /// Admin-initiated
    Remove,
}

/// Waitlist coordinator
pub struct WaitlistCoordinator<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> WaitlistCoordinator<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Join a ride, confirmed if a slot is open, otherwise at the back of the waitlist
    ///
    /// # Errors
    /// `RideNotFound`, `AlreadyParticipating` (whatever the existing status),
    /// `InvalidState` unless the ride is published, `RideFull`
    #[instrument(skip(self, message))]
    pub async fn join(
        &self,
        ride_id: Snowflake,
        user_id: Snowflake,
        message: Option<String>,
    ) -> ServiceResult<Participation> {
        retry_on_conflict(self.ctx.settings().max_write_attempts, "join", move || {
            self.try_join(ride_id, user_id, message.clone())
        })
        .await
    }

    /// Withdraw the caller's own participation
    ///
    /// # Errors
    /// `ParticipationNotFound`, `CannotRemoveCaptain`, `RideNotFound`,
    /// `InvalidState` if the participation is no longer active
    #[instrument(skip(self))]
    pub async fn leave(&self, ride_id: Snowflake, user_id: Snowflake) -> ServiceResult<()> {
        self.release(ride_id, user_id, Exit::Withdraw).await
    }

    /// Remove a participant on behalf of an organiser
    ///
    /// # Errors
    /// `ParticipationNotFound`, `CannotRemoveCaptain`, `RideNotFound`
    #[instrument(skip(self))]
    pub async fn remove(&self, ride_id: Snowflake, user_id: Snowflake) -> ServiceResult<()> {
        self.release(ride_id, user_id, Exit::Remove).await
    }

    async fn try_join(
        &self,
        ride_id: Snowflake,
        user_id: Snowflake,
        message: Option<String>,
    ) -> ServiceResult<Participation> {
        let mut ride = self.ctx.require_ride(ride_id).await?;

        if self
            .ctx
            .gateway()
            .find_participation(ride_id, user_id)
            .await?
            .is_some()
        {
            return Err(DomainError::AlreadyParticipating { ride_id, user_id }.into());
        }

        if ride.status != RideStatus::Published {
            return Err(DomainError::invalid_state(format!(
                "ride {ride_id} is {} and not open for joining",
                ride.status
            ))
            .into());
        }

        let id = self.ctx.generate_id();
        let participation = if ride.can_accept_participants() {
            ride.increment_participants();
            Participation::confirmed(id, ride_id, ride.club_id, user_id, ParticipationRole::Participant)
        } else if ride.is_waitlist_available() {
            let waiting = self
                .ctx
                .gateway()
                .participations_for_ride(ride_id, Some(ParticipationStatus::Waitlisted))
                .await?
                .len();
            let position = i32::try_from(waiting)
                .map_err(|_| DomainError::InternalError(format!("waitlist of ride {ride_id} overflowed")))?
                + 1;
            ride.increment_waitlist();
            Participation::waitlisted(id, ride_id, ride.club_id, user_id, position)
        } else {
            return Err(DomainError::RideFull(ride_id).into());
        };
        let participation = participation.with_message(message);

        self.ctx
            .gateway()
            .atomic_multi_write(vec![
                WriteOp::update(Record::Ride(ride.clone())),
                WriteOp::create(Record::Participation(participation.clone())),
            ])
            .await?;

        info!(
            ride_id = %ride_id,
            user_id = %user_id,
            status = %participation.status,
            waitlist_position = ?participation.waitlist_position,
            current_participants = ride.current_participants,
            "User joined ride"
        );

        Ok(participation)
    }

    async fn release(&self, ride_id: Snowflake, user_id: Snowflake, exit: Exit) -> ServiceResult<()> {
        let operation = match exit {
            Exit::Withdraw => "leave",
            Exit::Remove => "remove",
        };
        retry_on_conflict(self.ctx.settings().max_write_attempts, operation, move || {
            self.try_release(ride_id, user_id, exit)
        })
        .await
    }

    async fn try_release(&self, ride_id: Snowflake, user_id: Snowflake, exit: Exit) -> ServiceResult<()> {
        let mut participation = self.ctx.require_participation(ride_id, user_id).await?;
        if participation.is_captain() {
            return Err(DomainError::CannotRemoveCaptain.into());
        }
        let mut ride = self.ctx.require_ride(ride_id).await?;

        let prior = participation.status;
        match exit {
            Exit::Withdraw => participation.withdraw()?,
            Exit::Remove => participation.remove(),
        }

        let mut touched = vec![participation];
        match prior {
            ParticipationStatus::Confirmed => {
                ride.decrement_participants();
                let waiting = self.waitlisted_except(ride_id, user_id).await?;
                touched.extend(promote_waitlisted(&mut ride, waiting)?);
            }
            ParticipationStatus::Waitlisted => {
                ride.decrement_waitlist();
                let waiting = self.waitlisted_except(ride_id, user_id).await?;
                touched.extend(reorder_waitlist(waiting)?);
            }
            // Already inactive: only the status changes
            ParticipationStatus::Withdrawn | ParticipationStatus::Removed => {}
        }

        let touched_count = touched.len();
        commit(self.ctx, ride, touched).await?;

        info!(
            ride_id = %ride_id,
            user_id = %user_id,
            ?exit,
            prior = %prior,
            touched = touched_count,
            "Participant left ride"
        );
        Ok(())
    }

    async fn waitlisted_except(
        &self,
        ride_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<Participation>> {
        Ok(self
            .ctx
            .gateway()
            .participations_for_ride(ride_id, Some(ParticipationStatus::Waitlisted))
            .await?
            .into_iter()
            .filter(|p| p.user_id != user_id)
            .collect())
    }
}

/// Commit a ride and the participations changed alongside it
pub(crate) async fn commit(
    ctx: &ServiceContext,
    ride: Ride,
    participations: Vec<Participation>,
) -> ServiceResult<()> {
    let mut ops = Vec::with_capacity(participations.len() + 1);
    ops.push(WriteOp::update(Record::Ride(ride)));
    ops.extend(
        participations
            .into_iter()
            .map(|p| WriteOp::update(Record::Participation(p))),
    );
    ctx.gateway().atomic_multi_write(ops).await?;
    Ok(())
}

fn queue_order(p: &Participation) -> (i32, chrono::DateTime<chrono::Utc>, Snowflake) {
    (p.waitlist_position.unwrap_or(i32::MAX), p.joined_at, p.user_id)
}

/// Promote waitlisted participants, lowest position first, while the ride
/// accepts participants, then reorder whoever is left. Returns every
/// participation that changed.
pub(crate) fn promote_waitlisted(
    ride: &mut Ride,
    mut waitlisted: Vec<Participation>,
) -> Result<Vec<Participation>, DomainError> {
    waitlisted.sort_by_key(queue_order);

    let mut queue = waitlisted.into_iter();
    let mut changed = Vec::new();
    while ride.can_accept_participants() {
        let Some(mut next) = queue.next() else {
            break;
        };
        next.promote_from_waitlist()?;
        ride.increment_participants();
        ride.decrement_waitlist();
        debug!(ride_id = %ride.id, user_id = %next.user_id, "Promoted from waitlist");
        changed.push(next);
    }

    changed.extend(reorder_waitlist(queue.collect())?);
    Ok(changed)
}

/// Rewrite positions to `1..=N` in queue order, returning only the entries
/// whose position actually moved
pub(crate) fn reorder_waitlist(
    mut waitlisted: Vec<Participation>,
) -> Result<Vec<Participation>, DomainError> {
    waitlisted.sort_by_key(queue_order);

    let mut moved = Vec::new();
    for (position, mut participation) in (1_i32..).zip(waitlisted) {
        if participation.waitlist_position != Some(position) {
            participation.update_waitlist_position(position)?;
            moved.push(participation);
        }
    }
    Ok(moved)
}
