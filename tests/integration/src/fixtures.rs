//! Test fixtures and data generators
//!
//! Provides reusable request payloads for integration tests.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Utc};
use ride_service::dto::{CreateRideRequest, JoinRideRequest};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A published ride starting in three days
pub fn ride_request(max_participants: Option<i32>, allow_waitlist: bool) -> CreateRideRequest {
    CreateRideRequest {
        publish_immediately: true,
        ..draft_request(max_participants, allow_waitlist)
    }
}

/// A draft ride starting in three days
pub fn draft_request(max_participants: Option<i32>, allow_waitlist: bool) -> CreateRideRequest {
    let suffix = unique_suffix();
    CreateRideRequest {
        title: format!("Saturday club run #{suffix}"),
        description: Some("Coffee stop at the halfway village".to_string()),
        start_date_time: Utc::now() + Duration::days(3),
        estimated_duration_minutes: 180,
        max_participants,
        allow_waitlist,
        is_public: false,
        audience: None,
        publish_immediately: false,
    }
}

/// Join without a note to the organisers
pub fn join_request() -> JoinRideRequest {
    JoinRideRequest { message: None }
}
