//! Ride participation scenarios
//!
//! Walks a ride through the join, waitlist, promotion and override flows
//! over the in-memory gateway.
//!
//! Run with: cargo test -p ride-integration-tests --test scenarios

use ride_core::{ClubRole, ParticipationRole, ParticipationStatus, RideStatus};
use ride_integration_tests::{fixtures::*, TestEngine};
use ride_service::dto::{CancelRideRequest, UpdateParticipantRoleRequest};

// ============================================================================
// Join / Waitlist / Promotion
// ============================================================================

#[tokio::test]
async fn test_second_joiner_fills_ride_and_third_is_waitlisted() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let b = engine.member(ClubRole::Member);
    let c = engine.member(ClubRole::Member);

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(2), true))
        .await
        .unwrap();
    assert_eq!(ride.current_participants, 1);

    let joined = engine
        .participations()
        .join_ride(&b, ride.id, join_request())
        .await
        .unwrap();
    assert_eq!(joined.status, ParticipationStatus::Confirmed);
    assert_eq!(engine.ride(ride.id).await.unwrap().current_participants, 2);

    let queued = engine
        .participations()
        .join_ride(&c, ride.id, join_request())
        .await
        .unwrap();
    assert_eq!(queued.status, ParticipationStatus::Waitlisted);
    assert_eq!(queued.waitlist_position, Some(1));

    let stored = engine.check_invariants(ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 2);
    assert_eq!(stored.waitlist_count, 1);
}

#[tokio::test]
async fn test_leaving_promotes_head_of_waitlist() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let b = engine.member(ClubRole::Member);
    let c = engine.member(ClubRole::Member);
    let participations = engine.participations();

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(2), true))
        .await
        .unwrap();
    participations.join_ride(&b, ride.id, join_request()).await.unwrap();
    participations.join_ride(&c, ride.id, join_request()).await.unwrap();

    participations.leave_ride(&b, ride.id).await.unwrap();

    let stored = engine.check_invariants(ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 2);
    assert_eq!(stored.waitlist_count, 0);

    let promoted = engine.participation(ride.id, c.user_id).await.unwrap();
    assert_eq!(promoted.status, ParticipationStatus::Confirmed);
    assert_eq!(promoted.waitlist_position, None);

    let left = engine.participation(ride.id, b.user_id).await.unwrap();
    assert_eq!(left.status, ParticipationStatus::Withdrawn);
    assert!(engine.waitlist(ride.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_waitlist_closes_gap_when_head_leaves() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let b = engine.member(ClubRole::Member);
    let d = engine.member(ClubRole::Member);
    let e = engine.member(ClubRole::Member);
    let participations = engine.participations();

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(2), true))
        .await
        .unwrap();
    participations.join_ride(&b, ride.id, join_request()).await.unwrap();

    let first = participations.join_ride(&d, ride.id, join_request()).await.unwrap();
    let second = participations.join_ride(&e, ride.id, join_request()).await.unwrap();
    assert_eq!(first.waitlist_position, Some(1));
    assert_eq!(second.waitlist_position, Some(2));

    participations.leave_ride(&d, ride.id).await.unwrap();

    assert_eq!(engine.waitlist(ride.id).await.unwrap(), vec![(e.user_id, 1)]);
    let stored = engine.check_invariants(ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 2);
    assert_eq!(stored.waitlist_count, 1);
}

// ============================================================================
// Roles / Overrides
// ============================================================================

#[tokio::test]
async fn test_captain_cannot_be_demoted_to_participant() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let admin = engine.member(ClubRole::Admin);

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(4), false))
        .await
        .unwrap();

    let err = engine
        .participations()
        .update_participant_role(
            &admin,
            ride.id,
            creator.user_id,
            UpdateParticipantRoleRequest {
                role: ParticipationRole::Participant,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_ROLE_TRANSITION");

    let captain = engine.participation(ride.id, creator.user_id).await.unwrap();
    assert_eq!(captain.role, ParticipationRole::Captain);
}

#[tokio::test]
async fn test_member_cancels_only_their_own_ride() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let captain = engine.member(ClubRole::Captain);
    let member = engine.member(ClubRole::Member);
    let rides = engine.rides();

    let official = rides
        .create_ride(&captain, engine.club_id, ride_request(Some(6), true))
        .await
        .unwrap();
    let err = rides
        .cancel_ride(&member, official.id, CancelRideRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_PRIVILEGES");
    assert_eq!(engine.ride(official.id).await.unwrap().status, RideStatus::Published);

    let proposal = rides
        .create_ride(&member, engine.club_id, draft_request(Some(6), false))
        .await
        .unwrap();
    let cancelled = rides
        .cancel_ride(
            &member,
            proposal.id,
            CancelRideRequest {
                reason: Some("Storm warning".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, RideStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Storm warning"));
}
