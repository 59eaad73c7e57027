//! Service context - dependency container for services
//!
//! Holds the persistence gateway, the membership provider, the capability
//! cache, the ID generator, and the ride tunables.

use std::sync::Arc;

use ride_cache::{CapabilityCache, SharedCapabilityCache};
use ride_common::{AppConfig, AppError, RideSettings};
use ride_core::{
    DomainError, MembershipProvider, Participation, PersistenceGateway, Ride, Snowflake,
    SnowflakeGenerator, MAX_WORKER_ID,
};
use ride_db::{
    create_pool, run_migrations, PgMembershipProvider, PgPersistenceGateway, PoolConfig,
};
use tracing::info;

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    gateway: Arc<dyn PersistenceGateway>,
    memberships: Arc<dyn MembershipProvider>,
    capability_cache: SharedCapabilityCache,
    snowflake_generator: Arc<SnowflakeGenerator>,
    settings: RideSettings,
}

impl ServiceContext {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        memberships: Arc<dyn MembershipProvider>,
        capability_cache: SharedCapabilityCache,
        snowflake_generator: Arc<SnowflakeGenerator>,
        settings: RideSettings,
    ) -> Self {
        Self {
            gateway,
            memberships,
            capability_cache,
            snowflake_generator,
            settings,
        }
    }

    /// Connect to PostgreSQL, apply migrations, and wire the Pg implementations
    pub async fn connect(config: &AppConfig) -> ServiceResult<Self> {
        if config.snowflake.worker_id > MAX_WORKER_ID {
            return Err(AppError::Config(format!(
                "WORKER_ID must be at most {MAX_WORKER_ID}, got {}",
                config.snowflake.worker_id
            ))
            .into());
        }

        let pool = create_pool(&PoolConfig::from(&config.database))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        run_migrations(&pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            app = %config.app.name,
            worker_id = config.snowflake.worker_id,
            "Ride engine connected to database"
        );

        ServiceContextBuilder::new()
            .gateway(Arc::new(PgPersistenceGateway::new(pool.clone())))
            .membership_provider(Arc::new(PgMembershipProvider::new(pool)))
            .snowflake_generator(Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id)))
            .settings(config.rides.clone())
            .build()
    }

    pub fn gateway(&self) -> &dyn PersistenceGateway {
        self.gateway.as_ref()
    }

    pub fn memberships(&self) -> &dyn MembershipProvider {
        self.memberships.as_ref()
    }

    pub fn capability_cache(&self) -> &CapabilityCache {
        self.capability_cache.as_ref()
    }

    pub fn settings(&self) -> &RideSettings {
        &self.settings
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }

    /// Load a ride or fail with `RideNotFound`
    pub async fn require_ride(&self, ride_id: Snowflake) -> ServiceResult<Ride> {
        self.gateway
            .find_ride(ride_id)
            .await?
            .ok_or_else(|| DomainError::RideNotFound(ride_id).into())
    }

    /// Load a participation or fail with `ParticipationNotFound`
    pub async fn require_participation(
        &self,
        ride_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Participation> {
        self.gateway
            .find_participation(ride_id, user_id)
            .await?
            .ok_or_else(|| DomainError::ParticipationNotFound { ride_id, user_id }.into())
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("gateway", &"dyn PersistenceGateway")
            .field("memberships", &"dyn MembershipProvider")
            .field("cached_capabilities", &self.capability_cache.len())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
///
/// The gateway and membership provider are required; the rest default from
/// [`RideSettings`].
#[derive(Default)]
pub struct ServiceContextBuilder {
    gateway: Option<Arc<dyn PersistenceGateway>>,
    memberships: Option<Arc<dyn MembershipProvider>>,
    capability_cache: Option<SharedCapabilityCache>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    settings: Option<RideSettings>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gateway(mut self, gateway: Arc<dyn PersistenceGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn membership_provider(mut self, provider: Arc<dyn MembershipProvider>) -> Self {
        self.memberships = Some(provider);
        self
    }

    pub fn capability_cache(mut self, cache: SharedCapabilityCache) -> Self {
        self.capability_cache = Some(cache);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn settings(mut self, settings: RideSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let settings = self.settings.unwrap_or_default();
        if settings.max_write_attempts == 0 {
            return Err(ServiceError::validation("max_write_attempts must be at least 1"));
        }

        let capability_cache = self
            .capability_cache
            .unwrap_or_else(|| CapabilityCache::new_shared(settings.capability_cache_ttl()));
        let snowflake_generator = self
            .snowflake_generator
            .unwrap_or_else(|| Arc::new(SnowflakeGenerator::new(0)));

        Ok(ServiceContext::new(
            self.gateway
                .ok_or_else(|| ServiceError::validation("gateway is required"))?,
            self.memberships
                .ok_or_else(|| ServiceError::validation("membership_provider is required"))?,
            capability_cache,
            snowflake_generator,
            settings,
        ))
    }
}
