//! TTL cache of resolved system capabilities
//!
//! Entries are keyed by `(user_id, system_role)`, so a role change produces a
//! new key and never serves a stale set for the new role.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use ride_core::{Snowflake, SystemCapabilities, SystemRole};

type CacheKey = (Snowflake, SystemRole);

#[derive(Debug, Clone, Copy)]
struct CachedCapabilities {
    capabilities: SystemCapabilities,
    expires_at: Instant,
}

impl CachedCapabilities {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Concurrent TTL cache for system capability sets
#[derive(Debug)]
pub struct CapabilityCache {
    entries: DashMap<CacheKey, CachedCapabilities>,
    ttl: Duration,
}

pub type SharedCapabilityCache = Arc<CapabilityCache>;

impl CapabilityCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    #[must_use]
    pub fn new_shared(ttl: Duration) -> SharedCapabilityCache {
        Arc::new(Self::new(ttl))
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live entry for the key, if any. Expired entries are evicted on read.
    pub fn get(&self, user_id: Snowflake, role: SystemRole) -> Option<SystemCapabilities> {
        let key = (user_id, role);
        let now = Instant::now();

        if let Some(entry) = self.entries.get(&key) {
            if entry.is_live(now) {
                return Some(entry.capabilities);
            }
        }

        // The read guard is released before removing
        if self
            .entries
            .remove_if(&key, |_, entry| !entry.is_live(now))
            .is_some()
        {
            tracing::trace!(user_id = %user_id, role = %role, "Evicted expired capability entry");
        }
        None
    }

    pub fn insert(&self, user_id: Snowflake, role: SystemRole, capabilities: SystemCapabilities) {
        self.entries.insert(
            (user_id, role),
            CachedCapabilities {
                capabilities,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Cached set, or compute, store and return it
    pub fn get_or_insert_with<F>(&self, user_id: Snowflake, role: SystemRole, resolve: F) -> SystemCapabilities
    where
        F: FnOnce() -> SystemCapabilities,
    {
        if let Some(capabilities) = self.get(user_id, role) {
            return capabilities;
        }

        let capabilities = resolve();
        self.insert(user_id, role, capabilities);
        tracing::trace!(user_id = %user_id, role = %role, "Cached capability set");
        capabilities
    }

    /// Drop every entry of a user, whatever the role
    pub fn invalidate_user(&self, user_id: Snowflake) {
        self.entries.retain(|(cached_user, _), _| *cached_user != user_id);
    }

    /// Remove expired entries, returning how many were dropped
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            tracing::debug!(removed, "Swept expired capability entries");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
