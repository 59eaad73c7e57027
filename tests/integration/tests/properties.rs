//! Invariant checks across operation sequences
//!
//! Run with: cargo test -p ride-integration-tests --test properties

use std::time::Duration;

use ride_cache::CapabilityCache;
use ride_core::{
    AuthContext, ClubRole, MembershipStatus, ParticipationRole, ParticipationStatus,
    RideCapabilities, SystemRole,
};
use ride_integration_tests::{fixtures::*, TestEngine};
use ride_service::dto::{CancelRideRequest, UpdateParticipantRoleRequest, UpdateRideRequest};
use ride_service::{AuthorizationGate, CapabilityResolver};

// ============================================================================
// Capacity / Waitlist Density
// ============================================================================

enum Step {
    Leave(usize),
    Remove(usize),
}

#[tokio::test]
async fn test_counters_and_positions_hold_through_churn() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let riders: Vec<AuthContext> = (0..8).map(|_| engine.member(ClubRole::Member)).collect();
    let participations = engine.participations();

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(3), true))
        .await
        .unwrap();

    for rider in &riders {
        participations.join_ride(rider, ride.id, join_request()).await.unwrap();
        engine.check_invariants(ride.id).await.unwrap();
    }
    let stored = engine.ride(ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 3);
    assert_eq!(stored.waitlist_count, 6);

    let steps = [
        Step::Leave(0),
        Step::Remove(4),
        Step::Leave(6),
        Step::Remove(1),
        Step::Leave(2),
    ];
    for step in steps {
        match step {
            Step::Leave(i) => participations.leave_ride(&riders[i], ride.id).await.unwrap(),
            Step::Remove(i) => participations
                .remove_participant(&creator, ride.id, riders[i].user_id)
                .await
                .unwrap(),
        }
        engine.check_invariants(ride.id).await.unwrap();
    }

    let stored = engine.ride(ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 3);
    assert_eq!(engine.waitlist(ride.id).await.unwrap(), vec![(riders[7].user_id, 1)]);
    for promoted in [3, 5] {
        let p = engine.participation(ride.id, riders[promoted].user_id).await.unwrap();
        assert_eq!(p.status, ParticipationStatus::Confirmed);
    }
    let removed = engine.participation(ride.id, riders[4].user_id).await.unwrap();
    assert_eq!(removed.status, ParticipationStatus::Removed);
}

#[tokio::test]
async fn test_ride_without_waitlist_stays_at_capacity() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let participations = engine.participations();

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(2), false))
        .await
        .unwrap();

    let first = engine.member(ClubRole::Member);
    participations.join_ride(&first, ride.id, join_request()).await.unwrap();
    for _ in 0..3 {
        let late = engine.member(ClubRole::Member);
        let err = participations
            .join_ride(&late, ride.id, join_request())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "RIDE_FULL");
    }

    let stored = engine.check_invariants(ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 2);
    assert_eq!(stored.waitlist_count, 0);
}

// ============================================================================
// Duplicate Participation / Captain Protection
// ============================================================================

#[tokio::test]
async fn test_rejoining_fails_whatever_the_status() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let confirmed = engine.member(ClubRole::Member);
    let waitlisted = engine.member(ClubRole::Member);
    let withdrawn = engine.member(ClubRole::Member);
    let removed = engine.member(ClubRole::Member);
    let participations = engine.participations();

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(2), true))
        .await
        .unwrap();
    for rider in [&confirmed, &waitlisted, &withdrawn, &removed] {
        participations.join_ride(rider, ride.id, join_request()).await.unwrap();
    }
    participations.leave_ride(&withdrawn, ride.id).await.unwrap();
    participations
        .remove_participant(&creator, ride.id, removed.user_id)
        .await
        .unwrap();

    for rider in [&creator, &confirmed, &waitlisted, &withdrawn, &removed] {
        let err = participations
            .join_ride(rider, ride.id, join_request())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_PARTICIPATING");
    }
    engine.check_invariants(ride.id).await.unwrap();
}

#[tokio::test]
async fn test_captain_can_neither_leave_nor_be_removed() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let owner = engine.member(ClubRole::Owner);
    let participations = engine.participations();

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(None, false))
        .await
        .unwrap();

    let err = participations.leave_ride(&creator, ride.id).await.unwrap_err();
    assert_eq!(err.error_code(), "CANNOT_REMOVE_CAPTAIN");

    let err = participations
        .remove_participant(&owner, ride.id, creator.user_id)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CANNOT_REMOVE_CAPTAIN");

    let captain = engine.participation(ride.id, creator.user_id).await.unwrap();
    assert_eq!(captain.status, ParticipationStatus::Confirmed);
    assert_eq!(engine.ride(ride.id).await.unwrap().current_participants, 1);
}

#[tokio::test]
async fn test_captain_can_hand_over_to_leader() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let admin = engine.member(ClubRole::Admin);

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(5), false))
        .await
        .unwrap();

    let updated = engine
        .participations()
        .update_participant_role(
            &admin,
            ride.id,
            creator.user_id,
            UpdateParticipantRoleRequest {
                role: ParticipationRole::Leader,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.role, ParticipationRole::Leader);

    // No longer protected once demoted
    engine
        .participations()
        .leave_ride(&creator, ride.id)
        .await
        .unwrap();
    assert_eq!(engine.check_invariants(ride.id).await.unwrap().current_participants, 0);
}

// ============================================================================
// Capability Overrides
// ============================================================================

#[tokio::test]
async fn test_site_admin_passes_every_capability_without_membership() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let admin = engine.site_admin();
    let gate = AuthorizationGate::new(&engine.ctx);
    let other_club = engine.ctx.generate_id();

    for capability in RideCapabilities::all().iter() {
        for club_id in [engine.club_id, other_club] {
            gate.require_ride_capability(capability, &admin, club_id, None, None)
                .await
                .unwrap();
        }
    }

    let ride = engine
        .rides()
        .create_ride(&admin, other_club, ride_request(Some(3), true))
        .await
        .unwrap();
    let cancelled = engine
        .rides()
        .cancel_ride(&admin, ride.id, CancelRideRequest::default())
        .await
        .unwrap();
    assert_eq!(cancelled.club_id, other_club);
}

#[tokio::test]
async fn test_creator_manages_own_proposal_without_manage_rides() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Member);
    let bystander = engine.member(ClubRole::Member);
    let rides = engine.rides();

    let ride = rides
        .create_ride(&creator, engine.club_id, draft_request(Some(4), false))
        .await
        .unwrap();

    let retitled = rides
        .update_ride(
            &creator,
            ride.id,
            UpdateRideRequest {
                title: Some("Hill repeats".to_string()),
                ..UpdateRideRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(retitled.title, "Hill repeats");

    let err = rides
        .update_ride(
            &bystander,
            ride.id,
            UpdateRideRequest {
                title: Some("Hijacked".to_string()),
                ..UpdateRideRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_PRIVILEGES");

    // Publishing is not part of the creator override
    let err = rides
        .publish_ride(&creator, ride.id, Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_PRIVILEGES");
}

#[tokio::test]
async fn test_suspension_revokes_creator_override_immediately() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Member);

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, draft_request(None, false))
        .await
        .unwrap();

    assert!(engine
        .members
        .set_status(engine.club_id, creator.user_id, MembershipStatus::Suspended));
    let err = engine
        .rides()
        .cancel_ride(&creator, ride.id, CancelRideRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_PRIVILEGES");
}

#[tokio::test]
async fn test_membership_outage_denies_joins() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let rider = engine.member(ClubRole::Member);

    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(4), false))
        .await
        .unwrap();

    engine.members.set_unavailable(true);
    let err = engine
        .participations()
        .join_ride(&rider, ride.id, join_request())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_PRIVILEGES");

    engine.members.set_unavailable(false);
    engine
        .participations()
        .join_ride(&rider, ride.id, join_request())
        .await
        .unwrap();
    assert_eq!(engine.check_invariants(ride.id).await.unwrap().current_participants, 2);
}

#[tokio::test]
async fn test_cached_platform_override_ends_with_role_change() {
    let cache = CapabilityCache::new_shared(Duration::from_secs(300));
    let engine = TestEngine::start_with_cache(cache.clone()).expect("Failed to start engine");
    let gate = AuthorizationGate::new(&engine.ctx);
    let admin = engine.site_admin();

    gate.require_ride_capability(RideCapabilities::MANAGE_RIDES, &admin, engine.club_id, None, None)
        .await
        .unwrap();
    assert!(cache.get(admin.user_id, SystemRole::SiteAdmin).is_some());

    let demoted = AuthContext::user(admin.user_id, admin.email.clone());
    let err = gate
        .require_ride_capability(RideCapabilities::MANAGE_RIDES, &demoted, engine.club_id, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_PRIVILEGES");

    CapabilityResolver::new(&engine.ctx).invalidate_user(admin.user_id);
    assert!(cache.get(admin.user_id, SystemRole::SiteAdmin).is_none());
}
