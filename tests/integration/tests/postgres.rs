//! End-to-end flow against PostgreSQL
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Environment variables: DATABASE_URL
//!
//! Run with: cargo test -p ride-integration-tests --test postgres

use ride_core::ParticipationStatus;
use ride_integration_tests::{
    check_invariants, check_test_env, fixtures::*, site_admin, stored_participation, test_config,
};
use ride_service::{ParticipationService, RideService, ServiceContext};

#[tokio::test]
async fn test_waitlist_promotion_round_trip() {
    if !check_test_env().await {
        return;
    }

    let config = test_config().expect("Failed to load config");
    let ctx = ServiceContext::connect(&config)
        .await
        .expect("Failed to connect");
    let club_id = ctx.generate_id();
    let organiser = site_admin(&ctx);
    let riders: Vec<_> = (0..3).map(|_| site_admin(&ctx)).collect();

    let ride = RideService::new(&ctx)
        .create_ride(&organiser, club_id, ride_request(Some(2), true))
        .await
        .unwrap();

    let participations = ParticipationService::new(&ctx);
    for rider in &riders {
        participations.join_ride(rider, ride.id, join_request()).await.unwrap();
    }
    let stored = check_invariants(&ctx, ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 2);
    assert_eq!(stored.waitlist_count, 2);

    participations.leave_ride(&riders[0], ride.id).await.unwrap();

    let stored = check_invariants(&ctx, ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 2);
    assert_eq!(stored.waitlist_count, 1);
    let promoted = stored_participation(&ctx, ride.id, riders[1].user_id).await.unwrap();
    assert_eq!(promoted.status, ParticipationStatus::Confirmed);
    let waiting = stored_participation(&ctx, ride.id, riders[2].user_id).await.unwrap();
    assert_eq!(waiting.waitlist_position, Some(1));
}
