//! Concurrent joins and leaves against a single ride
//!
//! Every task owns a clone of the service context; the only coordination
//! between them is the gateway's conditional writes.
//!
//! Run with: cargo test -p ride-integration-tests --test concurrency

use futures::future::join_all;
use ride_core::{AuthContext, ClubRole, Snowflake};
use ride_integration_tests::{fixtures::*, TestEngine};
use ride_service::{ParticipationService, ServiceContext, ServiceResult};

/// Join every rider at once and collect each outcome
async fn join_concurrently(
    ctx: &ServiceContext,
    ride_id: Snowflake,
    riders: Vec<AuthContext>,
) -> Vec<ServiceResult<()>> {
    let handles = riders.into_iter().map(|rider| {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            ParticipationService::new(&ctx)
                .join_ride(&rider, ride_id, join_request())
                .await
                .map(|_| ())
        })
    });

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("join task panicked"))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_slot_goes_to_exactly_one_joiner() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(2), false))
        .await
        .unwrap();

    let riders = (0..8).map(|_| engine.member(ClubRole::Member)).collect();
    let results = join_concurrently(&engine.ctx, ride.id, riders).await;

    let joined = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(joined, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.error_code(), "RIDE_FULL");
    }

    let stored = engine.check_invariants(ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_waitlisting_keeps_positions_dense() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(2), true))
        .await
        .unwrap();

    let riders = (0..6).map(|_| engine.member(ClubRole::Member)).collect();
    let results = join_concurrently(&engine.ctx, ride.id, riders).await;
    assert!(results.iter().all(Result::is_ok));

    let stored = engine.check_invariants(ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 2);
    assert_eq!(stored.waitlist_count, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_contended_join_lands_with_default_settings() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);

    for _ in 0..20 {
        let ride = engine
            .rides()
            .create_ride(&creator, engine.club_id, ride_request(Some(2), true))
            .await
            .unwrap();

        let riders = (0..8).map(|_| engine.member(ClubRole::Member)).collect();
        let results = join_concurrently(&engine.ctx, ride.id, riders).await;
        for result in &results {
            if let Err(err) = result {
                panic!("join rejected: {}", err.error_code());
            }
        }

        let stored = engine.check_invariants(ride.id).await.unwrap();
        assert_eq!(stored.current_participants, 2);
        assert_eq!(stored.waitlist_count, 7);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_double_submit_creates_one_participation() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(None, false))
        .await
        .unwrap();

    let rider = engine.member(ClubRole::Member);
    let results = join_concurrently(&engine.ctx, ride.id, vec![rider.clone(), rider]).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let err = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("second submit should fail");
    assert_eq!(err.error_code(), "ALREADY_PARTICIPATING");

    let stored = engine.check_invariants(ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_leaves_racing_joins_keep_bookkeeping_consistent() {
    let engine = TestEngine::start().expect("Failed to start engine");
    let creator = engine.member(ClubRole::Captain);
    let ride = engine
        .rides()
        .create_ride(&creator, engine.club_id, ride_request(Some(3), true))
        .await
        .unwrap();

    let early: Vec<AuthContext> = (0..4).map(|_| engine.member(ClubRole::Member)).collect();
    for rider in &early {
        engine
            .participations()
            .join_ride(rider, ride.id, join_request())
            .await
            .unwrap();
    }

    let ride_id = ride.id;
    let leavers = early[..2].iter().cloned().map(|rider| {
        let ctx = engine.ctx.clone();
        tokio::spawn(async move { ParticipationService::new(&ctx).leave_ride(&rider, ride_id).await })
    });
    let late = (0..3).map(|_| engine.member(ClubRole::Member)).collect();

    let (left, joined) = tokio::join!(join_all(leavers), join_concurrently(&engine.ctx, ride_id, late));
    for result in left {
        result.expect("leave task panicked").unwrap();
    }
    assert!(joined.iter().all(Result::is_ok));

    // 1 captain + 4 early + 3 late - 2 leavers
    let stored = engine.check_invariants(ride.id).await.unwrap();
    assert_eq!(stored.current_participants, 3);
    assert_eq!(stored.waitlist_count, 3);
}
