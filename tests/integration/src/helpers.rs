//! Test helpers for integration tests
//!
//! Provides a wired service context per test, member provisioning, and
//! readers that check the ride bookkeeping against the stored records.

use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use ride_cache::SharedCapabilityCache;
use ride_common::{AppConfig, RideSettings};
use ride_core::{AuthContext, ClubRole, Participation, ParticipationStatus, Ride, Snowflake};
use ride_db::{MemoryGateway, MemoryMembershipProvider};
use ride_service::{ServiceContext, ServiceContextBuilder};

/// One club on a fresh in-memory engine
pub struct TestEngine {
    pub ctx: ServiceContext,
    pub gateway: Arc<MemoryGateway>,
    pub members: Arc<MemoryMembershipProvider>,
    pub club_id: Snowflake,
}

impl TestEngine {
    /// Start an engine with default settings
    pub fn start() -> Result<Self> {
        Self::start_with_settings(RideSettings::default())
    }

    /// Start an engine with custom ride settings
    pub fn start_with_settings(settings: RideSettings) -> Result<Self> {
        Self::build(ServiceContextBuilder::new().settings(settings))
    }

    /// Start an engine sharing an externally owned capability cache
    pub fn start_with_cache(cache: SharedCapabilityCache) -> Result<Self> {
        Self::build(ServiceContextBuilder::new().capability_cache(cache))
    }

    fn build(builder: ServiceContextBuilder) -> Result<Self> {
        let gateway = MemoryGateway::new_shared();
        let members = MemoryMembershipProvider::new_shared();
        let ctx = builder
            .gateway(gateway.clone())
            .membership_provider(members.clone())
            .build()?;
        let club_id = ctx.generate_id();

        Ok(Self {
            ctx,
            gateway,
            members,
            club_id,
        })
    }

    /// A fresh user holding an active membership with `role`
    pub fn member(&self, role: ClubRole) -> AuthContext {
        let user_id = self.ctx.generate_id();
        self.members.add_member(self.club_id, user_id, role);
        AuthContext::user(user_id, format!("rider{user_id}@example.com"))
    }

    /// A fresh site administrator with no club membership
    pub fn site_admin(&self) -> AuthContext {
        site_admin(&self.ctx)
    }

    /// A fresh authenticated user with no club membership
    pub fn outsider(&self) -> AuthContext {
        let user_id = self.ctx.generate_id();
        AuthContext::user(user_id, format!("guest{user_id}@example.com"))
    }

    pub fn rides(&self) -> ride_service::RideService<'_> {
        ride_service::RideService::new(&self.ctx)
    }

    pub fn participations(&self) -> ride_service::ParticipationService<'_> {
        ride_service::ParticipationService::new(&self.ctx)
    }

    pub async fn ride(&self, ride_id: Snowflake) -> Result<Ride> {
        stored_ride(&self.ctx, ride_id).await
    }

    pub async fn participation(&self, ride_id: Snowflake, user_id: Snowflake) -> Result<Participation> {
        stored_participation(&self.ctx, ride_id, user_id).await
    }

    pub async fn waitlist(&self, ride_id: Snowflake) -> Result<Vec<(Snowflake, i32)>> {
        waitlist(&self.ctx, ride_id).await
    }

    pub async fn check_invariants(&self, ride_id: Snowflake) -> Result<Ride> {
        check_invariants(&self.ctx, ride_id).await
    }
}

/// A fresh site administrator identity
pub fn site_admin(ctx: &ServiceContext) -> AuthContext {
    let user_id = ctx.generate_id();
    AuthContext::site_admin(user_id, format!("admin{user_id}@example.com"))
}

/// Load a ride straight from the gateway
pub async fn stored_ride(ctx: &ServiceContext, ride_id: Snowflake) -> Result<Ride> {
    ctx.gateway()
        .find_ride(ride_id)
        .await?
        .with_context(|| format!("ride {ride_id} not stored"))
}

/// Load a participation straight from the gateway
pub async fn stored_participation(
    ctx: &ServiceContext,
    ride_id: Snowflake,
    user_id: Snowflake,
) -> Result<Participation> {
    ctx.gateway()
        .find_participation(ride_id, user_id)
        .await?
        .with_context(|| format!("participation {ride_id}/{user_id} not stored"))
}

/// Waitlisted users in queue order with their positions
pub async fn waitlist(ctx: &ServiceContext, ride_id: Snowflake) -> Result<Vec<(Snowflake, i32)>> {
    let waitlisted = ctx
        .gateway()
        .participations_for_ride(ride_id, Some(ParticipationStatus::Waitlisted))
        .await?;

    let mut entries = Vec::with_capacity(waitlisted.len());
    for participation in waitlisted {
        let position = participation
            .waitlist_position
            .with_context(|| format!("waitlisted user {} has no position", participation.user_id))?;
        entries.push((participation.user_id, position));
    }
    entries.sort_by_key(|(_, position)| *position);
    Ok(entries)
}

/// Verify the ride counters against its stored participations
///
/// Checks that `current_participants` equals the confirmed count, that it
/// never exceeds capacity, and that waitlist positions are exactly
/// `1..=waitlist_count`.
pub async fn check_invariants(ctx: &ServiceContext, ride_id: Snowflake) -> Result<Ride> {
    let ride = stored_ride(ctx, ride_id).await?;
    let confirmed = ctx
        .gateway()
        .participations_for_ride(ride_id, Some(ParticipationStatus::Confirmed))
        .await?;

    ensure!(
        usize::try_from(ride.current_participants)? == confirmed.len(),
        "ride {ride_id} counts {} participants but {} are confirmed",
        ride.current_participants,
        confirmed.len()
    );
    if let Some(max) = ride.max_participants {
        ensure!(
            ride.current_participants <= max,
            "ride {ride_id} holds {} participants over a capacity of {max}",
            ride.current_participants
        );
    }

    let positions: Vec<i32> = waitlist(ctx, ride_id)
        .await?
        .into_iter()
        .map(|(_, position)| position)
        .collect();
    let expected: Vec<i32> = (1..=ride.waitlist_count).collect();
    ensure!(
        positions == expected,
        "ride {ride_id} waitlist positions {positions:?}, expected {expected:?}"
    );

    Ok(ride)
}

/// Check if the PostgreSQL test environment is available
pub async fn check_test_env() -> bool {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }

    true
}

/// Create test configuration from the environment
pub fn test_config() -> Result<AppConfig> {
    Ok(AppConfig::from_env()?)
}
